//! Rendering of extracted invoices and failures.

use console::style;

use invox_core::invoice::{format_amount, format_money};
use invox_core::models::invoice::InvoiceData;
use invox_core::session::{Failure, FailureKind};

const MAX_DESCRIPTION_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Line-item table with totals
    Table,
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension used when writing to a directory.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Table | OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

pub fn format_invoice(
    invoice: &InvoiceData,
    format: OutputFormat,
    default_currency: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(format_table(invoice, default_currency)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(invoice)?),
        OutputFormat::Csv => format_csv(invoice, default_currency),
        OutputFormat::Text => Ok(format_text(invoice, default_currency)),
    }
}

/// Render an invoice for writing to a file, without terminal styling.
pub fn format_invoice_plain(
    invoice: &InvoiceData,
    format: OutputFormat,
    default_currency: &str,
) -> anyhow::Result<String> {
    let content = format_invoice(invoice, format, default_currency)?;
    Ok(console::strip_ansi_codes(&content).into_owned())
}

/// One-line description of a failed attempt for the error slot.
pub fn describe_failure(failure: &Failure) -> String {
    match failure.kind {
        FailureKind::NotAnInvoice => format!("Not an invoice: {}", failure.message),
        FailureKind::Shape => format!("Could not read the model's answer: {}", failure.message),
        FailureKind::Transport => format!("Extraction failed: {}", failure.message),
        FailureKind::Configuration | FailureKind::Request => failure.message.clone(),
    }
}

fn format_csv(invoice: &InvoiceData, default_currency: &str) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "vendor_name",
        "invoice_number",
        "invoice_date",
        "due_date",
        "currency",
        "line",
        "description",
        "quantity",
        "unit_price",
        "amount",
        "tax_amount",
        "total_amount",
    ])?;

    let header = [
        invoice.vendor_name.clone(),
        invoice.invoice_number.clone(),
        invoice.invoice_date.clone(),
        invoice.due_date.clone().unwrap_or_default(),
        invoice.display_currency(default_currency),
    ];
    let totals = [
        invoice.tax_amount.normalize().to_string(),
        invoice.total_amount.normalize().to_string(),
    ];

    // An invoice without line items still gets one row for its totals.
    if invoice.line_items.is_empty() {
        let empty_line: [String; 5] = Default::default();
        wtr.write_record(header.iter().chain(&empty_line).chain(&totals))?;
    }

    for (i, item) in invoice.line_items.iter().enumerate() {
        let line = [
            (i + 1).to_string(),
            item.description.clone(),
            item.quantity.normalize().to_string(),
            item.unit_price.normalize().to_string(),
            item.amount.normalize().to_string(),
        ];
        wtr.write_record(header.iter().chain(&line).chain(&totals))?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(invoice: &InvoiceData, default_currency: &str) -> String {
    let currency = invoice.display_currency(default_currency);
    let mut output = String::new();

    output.push_str(&format!("Vendor: {}\n", invoice.vendor_name));
    output.push_str(&format!("Invoice: {}\n", invoice.invoice_number));
    output.push_str(&format!("Date: {}\n", invoice.invoice_date));
    if let Some(due_date) = &invoice.due_date {
        output.push_str(&format!("Due: {}\n", due_date));
    }
    output.push_str(&format!("Line items: {}\n", invoice.line_items.len()));
    output.push('\n');

    output.push_str(&format!("  Tax:   {}\n", format_money(invoice.tax_amount, &currency)));
    output.push_str(&format!("  Total: {}\n", format_money(invoice.total_amount, &currency)));

    if let Some(notes) = &invoice.notes {
        output.push_str(&format!("\nNotes: {}\n", notes));
    }

    output
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn format_table(invoice: &InvoiceData, default_currency: &str) -> String {
    let currency = invoice.display_currency(default_currency);
    let mut output = String::new();

    output.push_str(&format!(
        "{} {}\n",
        style(&invoice.vendor_name).bold(),
        style(format!("#{}", invoice.invoice_number)).dim()
    ));
    output.push_str(&format!("Issued {}", invoice.invoice_date));
    if let Some(due_date) = &invoice.due_date {
        output.push_str(&format!(", due {}", due_date));
    }
    output.push_str(&format!(" ({})\n\n", currency));

    let width = invoice
        .line_items
        .iter()
        .map(|item| item.description.chars().count())
        .max()
        .unwrap_or(0)
        .clamp("Description".len(), MAX_DESCRIPTION_WIDTH);

    output.push_str(&format!(
        "{:<width$}  {:>8}  {:>12}  {:>12}\n",
        "Description",
        "Qty",
        "Unit price",
        "Amount",
        width = width
    ));
    output.push_str(&format!("{}\n", "-".repeat(width + 38)));

    for item in &invoice.line_items {
        output.push_str(&format!(
            "{:<width$}  {:>8}  {:>12}  {:>12}\n",
            truncate(&item.description, width),
            item.quantity.normalize().to_string(),
            format_amount(item.unit_price),
            format_amount(item.amount),
            width = width
        ));
    }

    output.push_str(&format!("{}\n", "-".repeat(width + 38)));
    let label_width = width + 24;
    let subtotal = invoice
        .line_items_total()
        .map(format_amount)
        .unwrap_or_else(|| "out of range".to_string());
    output.push_str(&format!(
        "{:>label_width$}  {:>12}\n",
        "Subtotal",
        subtotal,
        label_width = label_width
    ));
    output.push_str(&format!(
        "{:>label_width$}  {:>12}\n",
        "Tax",
        format_amount(invoice.tax_amount),
        label_width = label_width
    ));
    output.push_str(&format!(
        "{:>label_width$}  {:>12}\n",
        "Total",
        format_money(invoice.total_amount, &currency),
        label_width = label_width
    ));

    if let Some(notes) = &invoice.notes {
        output.push_str(&format!("\nNotes: {}\n", notes));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use invox_core::Decimal;
    use invox_core::models::invoice::LineItem;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample() -> InvoiceData {
        InvoiceData {
            vendor_name: "Acme Supplies".to_string(),
            invoice_number: "INV-1001".to_string(),
            invoice_date: "2024-03-01".to_string(),
            due_date: Some("2024-03-31".to_string()),
            total_amount: dec("1521.5"),
            tax_amount: dec("1.5"),
            currency: "usd".to_string(),
            line_items: vec![
                LineItem::new("Widget", dec("2"), dec("10"), dec("20")),
                LineItem::new("Consulting, March", dec("1"), dec("1500"), dec("1500")),
            ],
            notes: None,
        }
    }

    #[test]
    fn test_csv_has_row_per_line_item() {
        let csv = format_invoice(&sample(), OutputFormat::Csv, "USD").unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("vendor_name,invoice_number"));
        assert!(lines[2].contains("\"Consulting, March\""));
    }

    #[test]
    fn test_csv_uses_display_currency_and_normalized_amounts() {
        let mut invoice = sample();
        invoice.currency = "dollars".to_string();
        invoice.total_amount = dec("1521.50");

        let csv = format_invoice(&invoice, OutputFormat::Csv, "EUR").unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[1],
            "Acme Supplies,INV-1001,2024-03-01,2024-03-31,EUR,1,Widget,2,10,20,1.5,1521.5"
        );
    }

    #[test]
    fn test_csv_without_line_items_keeps_totals() {
        let mut invoice = sample();
        invoice.line_items.clear();

        let csv = format_invoice(&invoice, OutputFormat::Csv, "USD").unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "Acme Supplies,INV-1001,2024-03-01,2024-03-31,USD,,,,,,1.5,1521.5"
        );
    }

    #[test]
    fn test_plain_output_has_no_escape_codes() {
        console::set_colors_enabled(true);
        let table = format_invoice_plain(&sample(), OutputFormat::Table, "USD").unwrap();

        assert!(!table.contains('\u{1b}'));
        assert!(table.contains("Acme Supplies #INV-1001"));
    }

    #[test]
    fn test_table_shows_totals() {
        console::set_colors_enabled(false);
        let table = format_invoice(&sample(), OutputFormat::Table, "USD").unwrap();

        assert!(table.contains("Acme Supplies"));
        assert!(table.contains("due 2024-03-31"));
        assert!(table.contains("1,500.00"));
        assert!(table.contains("$1,521.50"));
    }

    #[test]
    fn test_invalid_currency_falls_back_in_text() {
        let mut invoice = sample();
        invoice.currency = "dollars".to_string();

        let text = format_invoice(&invoice, OutputFormat::Text, "EUR").unwrap();
        assert!(text.contains("Total: €1,521.50"));
    }

    #[test]
    fn test_json_uses_wire_names() {
        let json = format_invoice(&sample(), OutputFormat::Json, "USD").unwrap();
        assert!(json.contains("\"vendorName\""));
        assert!(json.contains("\"lineItems\""));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long description", 6), "a ver…");
    }

    #[test]
    fn test_describe_failure() {
        let failure = Failure {
            kind: FailureKind::NotAnInvoice,
            message: "This is a receipt photo.".to_string(),
        };
        assert_eq!(describe_failure(&failure), "Not an invoice: This is a receipt photo.");
    }
}
