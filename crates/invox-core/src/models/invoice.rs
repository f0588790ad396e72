//! Invoice data as returned by the extraction model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::currency::normalize_currency;

/// Vendor name the model uses to flag an image that is not an invoice.
pub const INVALID_DOCUMENT_VENDOR: &str = "Invalid Document";

/// A complete extracted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    /// Name of the issuing vendor.
    pub vendor_name: String,

    /// Invoice number/identifier.
    pub invoice_number: String,

    /// Issue date, expected as YYYY-MM-DD.
    pub invoice_date: String,

    /// Payment due date, omitted when the invoice shows none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    /// Grand total as printed on the invoice.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,

    /// Total tax; zero when the response leaves it out.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Billed entries, in invoice order.
    pub line_items: Vec<LineItem>,

    /// Anomalies reported by the model, or the reason a document was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single billed entry on the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity.
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,

    /// Price per unit.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,

    /// Line total as printed.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// What a well-formed response actually means.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// A regular invoice record.
    Invoice(InvoiceData),
    /// The model recognized the image as something other than an invoice.
    NotAnInvoice { reason: Option<String> },
}

impl LineItem {
    /// Create a new line item.
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            amount,
        }
    }

    /// Quantity times unit price, or `None` if the product is out of range.
    pub fn computed_amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    /// Check the advisory quantity × unit price ≈ amount relation.
    ///
    /// A product that cannot be represented never matches.
    pub fn arithmetic_matches(&self, tolerance: Decimal) -> bool {
        self.computed_amount()
            .and_then(|computed| computed.checked_sub(self.amount))
            .is_some_and(|difference| difference.abs() <= tolerance)
    }
}

impl InvoiceData {
    /// Sum of all line item amounts, or `None` if the sum is out of range.
    pub fn line_items_total(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.amount))
    }

    /// Check whether this is the "not an invoice" sentinel.
    pub fn is_invalid_document(&self) -> bool {
        self.vendor_name.trim() == INVALID_DOCUMENT_VENDOR
    }

    /// Split the sentinel response off from regular invoice data.
    pub fn into_outcome(self) -> ExtractionOutcome {
        if self.is_invalid_document() {
            let reason = self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            ExtractionOutcome::NotAnInvoice { reason }
        } else {
            ExtractionOutcome::Invoice(self)
        }
    }

    /// Issue date, if it is a valid ISO date.
    pub fn parsed_invoice_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.invoice_date)
    }

    /// Due date, if present and a valid ISO date.
    pub fn parsed_due_date(&self) -> Option<NaiveDate> {
        self.due_date.as_deref().and_then(parse_iso_date)
    }

    /// Currency code suitable for display, never failing.
    pub fn display_currency(&self, default: &str) -> String {
        normalize_currency(Some(&self.currency), default)
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
