//! Core library for invoice digitization.
//!
//! This crate provides:
//! - Request building (image encoding, extraction instruction, response schema)
//! - An extraction client for the Gemini multimodal API
//! - Reconciliation of stated totals against line items
//! - An explicit session state machine for the presentation layer
//! - Persisted settings (credential and model preference)

pub mod client;
pub mod error;
pub mod invoice;
pub mod models;
pub mod request;
pub mod session;
pub mod settings;

pub use client::{ExtractionBackend, GeminiClient, parse_invoice_text};
pub use error::{InvoxError, Result};
pub use invoice::{Discrepancy, check_totals, format_money, normalize_currency};
pub use models::config::InvoxConfig;
pub use models::invoice::{ExtractionOutcome, InvoiceData, LineItem};
pub use request::{ExtractionRequest, ImagePayload, ImageSource};
pub use session::{Failure, FailureKind, Phase, Session, SessionState, Settlement};
pub use settings::{ModelChoice, Settings, SettingsStore};

/// Re-export the decimal type used for all amounts.
pub use rust_decimal::Decimal;
