//! Request construction for the extraction model.

mod prompt;
mod source;

pub use prompt::{REQUIRED_FIELDS, instruction, response_schema};
pub use source::{ImagePayload, ImageSource};

use serde_json::{Value, json};

use crate::settings::ModelChoice;

/// Everything needed for one extraction call, except the credential.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Encoded invoice image.
    pub payload: ImagePayload,
    /// Model to call.
    pub model: ModelChoice,
    /// Natural-language extraction rules.
    pub instruction: String,
    /// Strict output shape.
    pub schema: Value,
}

impl ExtractionRequest {
    /// Build a request for `source` against `model`.
    pub fn new(source: &ImageSource, model: ModelChoice) -> Self {
        Self {
            payload: source.encode(),
            model,
            instruction: instruction(),
            schema: response_schema(),
        }
    }

    /// Render the `generateContent` request body.
    pub fn to_body(&self) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": self.payload.mime_type,
                            "data": self.payload.data,
                        }
                    },
                    { "text": self.instruction }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": self.schema,
            }
        })
    }
}
