//! Extraction client: sends one request to the model and parses the answer.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use tracing::error;

use crate::error::{ExtractionError, Result};
use crate::models::invoice::InvoiceData;
use crate::request::ExtractionRequest;
use crate::settings::Settings;

/// A service able to turn an extraction request into invoice data.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Run one extraction. Implementations must not retry.
    async fn extract(&self, request: &ExtractionRequest, settings: &Settings)
    -> Result<InvoiceData>;
}

/// Parse the model's text answer into invoice data.
///
/// Surrounding whitespace and a Markdown code fence are tolerated; anything
/// else that does not deserialize is a shape error carrying the raw text.
pub fn parse_invoice_text(text: &str) -> std::result::Result<InvoiceData, ExtractionError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| {
        error!(raw = %text, "Model response did not match the invoice schema: {}", e);
        ExtractionError::Shape {
            reason: e.to_string(),
            raw: text.to_string(),
        }
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"{"vendorName":"Acme","invoiceNumber":"42","invoiceDate":"2024-05-01",
        "totalAmount":21.5,"taxAmount":1.5,"currency":"USD",
        "lineItems":[{"description":"Widget","quantity":2,"unitPrice":10,"amount":20}]}"#;

    #[test]
    fn test_parses_plain_json() {
        let invoice = parse_invoice_text(VALID).unwrap();
        assert_eq!(invoice.vendor_name, "Acme");
        assert_eq!(invoice.line_items.len(), 1);
    }

    #[test]
    fn test_parses_fenced_json() {
        let fenced = format!("```json\n{}\n```", VALID);
        let invoice = parse_invoice_text(&fenced).unwrap();
        assert_eq!(invoice.invoice_number, "42");

        let fenced = format!("  ```\n{}\n```  ", VALID);
        assert!(parse_invoice_text(&fenced).is_ok());
    }

    #[test]
    fn test_non_json_is_shape_error_with_raw_text() {
        let err = parse_invoice_text("Sorry, I cannot read this image.").unwrap_err();
        match err {
            ExtractionError::Shape { raw, .. } => {
                assert_eq!(raw, "Sorry, I cannot read this image.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_is_shape_error() {
        let text = r#"{"invoiceNumber":"1","invoiceDate":"2024-01-01","totalAmount":1,
            "currency":"USD","lineItems":[]}"#;
        let err = parse_invoice_text(text).unwrap_err();
        match err {
            ExtractionError::Shape { reason, .. } => assert!(reason.contains("vendorName")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_line_item_missing_amount_is_shape_error() {
        let text = r#"{"vendorName":"A","invoiceNumber":"1","invoiceDate":"2024-01-01",
            "totalAmount":1,"currency":"USD",
            "lineItems":[{"description":"x","quantity":1,"unitPrice":1}]}"#;
        assert!(matches!(
            parse_invoice_text(text),
            Err(ExtractionError::Shape { .. })
        ));
    }
}
