//! Instruction text and response schema sent with every extraction.

use serde_json::{Value, json};

use crate::models::invoice::INVALID_DOCUMENT_VENDOR;

/// Fields the model must always return.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "vendorName",
    "invoiceNumber",
    "invoiceDate",
    "totalAmount",
    "currency",
    "lineItems",
];

/// Build the extraction instruction.
pub fn instruction() -> String {
    format!(
        "You are an invoice digitization engine. Extract the data from the attached invoice \
and answer with JSON matching the provided schema.\n\
\n\
Rules:\n\
1. All monetary fields (totalAmount, taxAmount, unitPrice, amount) must be plain numbers \
without currency symbols or thousands separators.\n\
2. Normalize every date to YYYY-MM-DD.\n\
3. If the invoice shows no due date, omit dueDate.\n\
4. If the invoice shows no tax, set taxAmount to 0.\n\
5. currency must be a 3-letter ISO 4217 code (for example USD, EUR, GBP).\n\
6. Check each line item: quantity x unitPrice should equal amount.\n\
7. Check the grand total: the sum of line item amounts plus taxAmount should equal totalAmount.\n\
8. For minor rounding differences, keep the values printed on the invoice. \
For larger discrepancies, keep the printed values and describe the discrepancy in notes.\n\
9. If the image is not an invoice or cannot be read as one, do not fail. Return vendorName \
\"{vendor}\", invoiceNumber \"\", invoiceDate \"\", totalAmount 0, taxAmount 0, currency \"USD\", \
an empty lineItems array, and a short explanation of what the image shows in notes.",
        vendor = INVALID_DOCUMENT_VENDOR
    )
}

/// Build the strict response schema (Gemini OpenAPI subset).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "vendorName": { "type": "STRING", "description": "Name of the vendor issuing the invoice" },
            "invoiceNumber": { "type": "STRING" },
            "invoiceDate": { "type": "STRING", "description": "Issue date, YYYY-MM-DD" },
            "dueDate": { "type": "STRING", "description": "Due date, YYYY-MM-DD" },
            "totalAmount": { "type": "NUMBER" },
            "taxAmount": { "type": "NUMBER" },
            "currency": { "type": "STRING", "description": "3-letter ISO 4217 code" },
            "lineItems": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "quantity": { "type": "NUMBER" },
                        "unitPrice": { "type": "NUMBER" },
                        "amount": { "type": "NUMBER" }
                    },
                    "required": ["description", "quantity", "unitPrice", "amount"]
                }
            },
            "notes": { "type": "STRING", "description": "Discrepancies, anomalies, or why the document was rejected" }
        },
        "required": REQUIRED_FIELDS,
    })
}
