//! Reconciliation of stated totals against line items.

use std::fmt;

use rust_decimal::Decimal;
use tracing::warn;

use crate::error::ExtractionError;
use crate::models::invoice::InvoiceData;

/// Default tolerance for total comparisons (0.01 currency units).
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Mismatch between the stated total and line items plus tax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    /// Sum of line item amounts plus tax.
    pub computed: Decimal,
    /// Total printed on the invoice.
    pub stated: Decimal,
    /// `stated - computed`.
    pub difference: Decimal,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total mismatch: line items plus tax come to {:.2}, but the invoice states {:.2} (difference {:.2}).",
            self.computed.round_dp(2),
            self.stated.round_dp(2),
            self.difference.abs().round_dp(2)
        )
    }
}

/// Compare the stated total with the sum of line amounts plus tax.
///
/// Returns a discrepancy only when the absolute difference exceeds `tolerance`.
/// Amounts whose sum or difference cannot be represented are a shape error.
pub fn check_totals(
    invoice: &InvoiceData,
    tolerance: Decimal,
) -> Result<Option<Discrepancy>, ExtractionError> {
    let computed = invoice
        .line_items_total()
        .and_then(|total| total.checked_add(invoice.tax_amount));
    let difference = computed.and_then(|computed| invoice.total_amount.checked_sub(computed));
    let (Some(computed), Some(difference)) = (computed, difference) else {
        return Err(ExtractionError::Shape {
            reason: "amounts are too large to reconcile".to_string(),
            raw: serde_json::to_string(invoice).unwrap_or_default(),
        });
    };

    if difference.abs() > tolerance {
        warn!(
            "Invoice {} total {} differs from computed {}",
            invoice.invoice_number, invoice.total_amount, computed
        );
        Ok(Some(Discrepancy {
            computed,
            stated: invoice.total_amount,
            difference,
        }))
    } else {
        Ok(None)
    }
}

/// A line item whose quantity × unit price disagrees with its amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    /// Position in the line item list (1-based).
    pub line: usize,
    /// Line description.
    pub description: String,
    /// Quantity times unit price, `None` when out of range.
    pub expected: Option<Decimal>,
    /// Printed amount.
    pub amount: Decimal,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected {
            Some(expected) => write!(
                f,
                "Line {} ({}): quantity x unit price is {:.2}, amount is {:.2}",
                self.line,
                self.description,
                expected.round_dp(2),
                self.amount.round_dp(2)
            ),
            None => write!(
                f,
                "Line {} ({}): quantity x unit price is out of range, amount is {:.2}",
                self.line,
                self.description,
                self.amount.round_dp(2)
            ),
        }
    }
}

/// List line items whose arithmetic does not hold within `tolerance`.
pub fn line_item_issues(invoice: &InvoiceData, tolerance: Decimal) -> Vec<LineIssue> {
    invoice
        .line_items
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.arithmetic_matches(tolerance))
        .map(|(i, item)| LineIssue {
            line: i + 1,
            description: item.description.clone(),
            expected: item.computed_amount(),
            amount: item.amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn invoice(items: Vec<LineItem>, tax: &str, total: &str) -> InvoiceData {
        InvoiceData {
            vendor_name: "Acme".to_string(),
            invoice_number: "INV-1".to_string(),
            invoice_date: "2024-01-01".to_string(),
            due_date: None,
            total_amount: dec(total),
            tax_amount: dec(tax),
            currency: "USD".to_string(),
            line_items: items,
            notes: None,
        }
    }

    fn widget() -> LineItem {
        LineItem::new("Widget", dec("2"), dec("10"), dec("20"))
    }

    #[test]
    fn test_default_tolerance() {
        assert_eq!(DEFAULT_TOLERANCE, dec("0.01"));
    }

    #[test]
    fn test_matching_totals_produce_no_warning() {
        let inv = invoice(vec![widget()], "1.5", "21.5");
        assert_eq!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap(), None);
    }

    #[test]
    fn test_mismatch_produces_warning() {
        let inv = invoice(vec![widget()], "1.5", "25");
        let discrepancy = check_totals(&inv, DEFAULT_TOLERANCE).unwrap().unwrap();

        assert_eq!(discrepancy.computed, dec("21.5"));
        assert_eq!(discrepancy.stated, dec("25"));
        assert_eq!(discrepancy.difference, dec("3.5"));

        let message = discrepancy.to_string();
        assert!(message.contains("21.50"), "{message}");
        assert!(message.contains("25.00"), "{message}");
    }

    #[test]
    fn test_tolerance_boundary() {
        // Exactly at the tolerance is accepted.
        let inv = invoice(vec![widget()], "1.5", "21.51");
        assert_eq!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap(), None);

        let inv = invoice(vec![widget()], "1.5", "21.49");
        assert_eq!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap(), None);

        let inv = invoice(vec![widget()], "1.5", "21.511");
        assert!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap().is_some());
    }

    #[test]
    fn test_no_line_items_compares_tax_only() {
        let inv = invoice(Vec::new(), "0", "0");
        assert_eq!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap(), None);

        let inv = invoice(Vec::new(), "2", "10");
        assert!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap().is_some());
    }

    #[test]
    fn test_many_lines_sum() {
        let items = vec![
            LineItem::new("A", dec("1"), dec("0.10"), dec("0.10")),
            LineItem::new("B", dec("1"), dec("0.20"), dec("0.20")),
            LineItem::new("C", dec("3"), dec("33.33"), dec("99.99")),
        ];
        let inv = invoice(items, "0", "100.29");
        assert_eq!(check_totals(&inv, DEFAULT_TOLERANCE).unwrap(), None);
    }

    #[test]
    fn test_line_item_issues() {
        let items = vec![
            widget(),
            LineItem::new("Gadget", dec("3"), dec("5"), dec("16")),
        ];
        let inv = invoice(items, "0", "36");

        let issues = line_item_issues(&inv, DEFAULT_TOLERANCE);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].expected, Some(dec("15")));
        assert!(issues[0].to_string().contains("Gadget"));
    }

    #[test]
    fn test_overflowing_sum_is_shape_error() {
        let big = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        let items = vec![
            LineItem::new("A", Decimal::ONE, big, big),
            LineItem::new("B", Decimal::ONE, big, big),
        ];
        let inv = invoice(items, "0", "1");

        let err = check_totals(&inv, DEFAULT_TOLERANCE).unwrap_err();
        assert!(matches!(err, ExtractionError::Shape { .. }));
    }

    #[test]
    fn test_overflowing_difference_is_shape_error() {
        let big = Decimal::from_i128_with_scale(7 * 10_i128.pow(28), 0);
        let items = vec![LineItem::new("Refund", Decimal::ONE, -big, -big)];
        let mut inv = invoice(items, "0", "0");
        inv.total_amount = big;

        assert!(check_totals(&inv, DEFAULT_TOLERANCE).is_err());
    }

    #[test]
    fn test_overflowing_line_product_is_reported() {
        let quadrillion = Decimal::new(1_000_000_000_000_000, 0);
        let items = vec![LineItem::new("Bulk", quadrillion, quadrillion, dec("1"))];
        let inv = invoice(items, "0", "1");

        let issues = line_item_issues(&inv, DEFAULT_TOLERANCE);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].expected, None);
        assert!(issues[0].to_string().contains("out of range"));
    }
}
