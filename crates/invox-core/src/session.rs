//! Digitization session: the explicit state machine behind the presentation layer.
//!
//! ```text
//! Idle --select--> Ready --begin--> Processing --complete--> Settled
//!   ^                ^                                          |
//!   |                +------------------select-----------------+
//!   +------------------------------reset------------------------+
//! ```

use std::fmt;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::client::ExtractionBackend;
use crate::error::{ConfigError, ExtractionError, InvoxError, SessionError};
use crate::invoice::reconcile::{DEFAULT_TOLERANCE, Discrepancy, check_totals};
use crate::models::invoice::{ExtractionOutcome, InvoiceData};
use crate::request::{ExtractionRequest, ImageSource};
use crate::settings::Settings;

/// Message shown when a document is rejected without an explanation.
pub const NOT_AN_INVOICE_FALLBACK: &str = "The uploaded image does not appear to be a valid invoice.";

/// Coarse, observable phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    Processing,
    Settled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::Processing => "processing",
            Phase::Settled => "settled",
        };
        f.write_str(name)
    }
}

/// Category of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing or invalid configuration, found before any network activity.
    Configuration,
    /// The image could not be prepared for upload.
    Request,
    /// The call failed or the API reported an error.
    Transport,
    /// The response did not match the expected shape.
    Shape,
    /// The model flagged the image as not an invoice.
    NotAnInvoice,
}

/// A failed attempt, as shown in the error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    fn from_error(error: &InvoxError) -> Self {
        let kind = match error {
            InvoxError::Config(_) => FailureKind::Configuration,
            InvoxError::Request(_) | InvoxError::Io(_) => FailureKind::Request,
            InvoxError::Extraction(ExtractionError::Shape { .. }) => FailureKind::Shape,
            InvoxError::Extraction(_) => FailureKind::Transport,
            InvoxError::Session(_) => FailureKind::Configuration,
        };
        let message = match error {
            InvoxError::Config(e) => e.to_string(),
            InvoxError::Request(e) => e.to_string(),
            InvoxError::Extraction(e) => e.to_string(),
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How a settled attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Invoice data, with a non-fatal discrepancy warning when totals disagree.
    Extracted {
        invoice: InvoiceData,
        warning: Option<Discrepancy>,
    },
    /// The attempt failed.
    Failed(Failure),
}

/// Full session state. Each variant carries exactly the data valid in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Ready {
        file: ImageSource,
    },
    Processing {
        file: ImageSource,
    },
    Settled {
        file: ImageSource,
        settlement: Settlement,
    },
}

/// A single-file digitization session.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    tolerance: Decimal,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an idle session with the default tolerance.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the tolerance used for the total check.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Idle => Phase::Idle,
            SessionState::Ready { .. } => Phase::Ready,
            SessionState::Processing { .. } => Phase::Processing,
            SessionState::Settled { .. } => Phase::Settled,
        }
    }

    /// Selected file, if any.
    pub fn file(&self) -> Option<&ImageSource> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Ready { file }
            | SessionState::Processing { file }
            | SessionState::Settled { file, .. } => Some(file),
        }
    }

    /// Settlement of the last attempt, if settled.
    pub fn settlement(&self) -> Option<&Settlement> {
        match &self.state {
            SessionState::Settled { settlement, .. } => Some(settlement),
            _ => None,
        }
    }

    /// Extracted invoice, if the last attempt succeeded.
    pub fn invoice(&self) -> Option<&InvoiceData> {
        match self.settlement() {
            Some(Settlement::Extracted { invoice, .. }) => Some(invoice),
            _ => None,
        }
    }

    /// Discrepancy warning for the extracted invoice.
    pub fn warning(&self) -> Option<&Discrepancy> {
        match self.settlement() {
            Some(Settlement::Extracted { warning, .. }) => warning.as_ref(),
            _ => None,
        }
    }

    /// Error slot.
    pub fn error(&self) -> Option<&Failure> {
        match self.settlement() {
            Some(Settlement::Failed(failure)) => Some(failure),
            _ => None,
        }
    }

    /// Select a file, discarding any previous file, result, error and warning.
    pub fn select(&mut self, file: ImageSource) -> Result<(), SessionError> {
        if self.phase() == Phase::Processing {
            return Err(SessionError::Busy);
        }
        debug!("Session ready with {}", file.name());
        self.state = SessionState::Ready { file };
        Ok(())
    }

    /// Start an extraction and return the request to send.
    ///
    /// Without a credential the session settles with a configuration failure
    /// and no request is produced.
    pub fn begin(&mut self, settings: &Settings) -> Result<ExtractionRequest, SessionError> {
        let file = match std::mem::take(&mut self.state) {
            SessionState::Idle => return Err(SessionError::NoFile),
            state @ SessionState::Processing { .. } => {
                self.state = state;
                return Err(SessionError::Busy);
            }
            SessionState::Ready { file } | SessionState::Settled { file, .. } => file,
        };

        if settings.credential().is_none() {
            let failure = Failure::from_error(&ConfigError::MissingCredential.into());
            self.state = SessionState::Settled {
                file,
                settlement: Settlement::Failed(failure),
            };
            return Err(SessionError::MissingCredential);
        }

        let request = ExtractionRequest::new(&file, settings.model);
        self.state = SessionState::Processing { file };
        Ok(request)
    }

    /// Deliver the result of the in-flight extraction.
    pub fn complete(
        &mut self,
        result: Result<InvoiceData, InvoxError>,
    ) -> Result<&Settlement, SessionError> {
        let file = match std::mem::take(&mut self.state) {
            SessionState::Processing { file } => file,
            other => {
                self.state = other;
                return Err(SessionError::NotProcessing);
            }
        };

        let settlement = match result.map(InvoiceData::into_outcome) {
            Ok(ExtractionOutcome::Invoice(invoice)) => match check_totals(&invoice, self.tolerance) {
                Ok(warning) => {
                    info!(
                        "Extracted invoice {} from {} ({} line items)",
                        invoice.invoice_number,
                        invoice.vendor_name,
                        invoice.line_items.len()
                    );
                    Settlement::Extracted { invoice, warning }
                }
                Err(e) => Settlement::Failed(Failure::from_error(&e.into())),
            },
            Ok(ExtractionOutcome::NotAnInvoice { reason }) => {
                info!("{} was rejected as not an invoice", file.name());
                Settlement::Failed(Failure {
                    kind: FailureKind::NotAnInvoice,
                    message: reason.unwrap_or_else(|| NOT_AN_INVOICE_FALLBACK.to_string()),
                })
            }
            Err(e) => Settlement::Failed(Failure::from_error(&e)),
        };

        self.state = SessionState::Settled { file, settlement };
        let SessionState::Settled { settlement, .. } = &self.state else {
            unreachable!("session was settled above");
        };
        Ok(settlement)
    }

    /// Run one extraction against `backend`.
    pub async fn extract(
        &mut self,
        backend: &dyn ExtractionBackend,
        settings: &Settings,
    ) -> Result<&Settlement, SessionError> {
        let request = self.begin(settings)?;
        debug!("Extracting with {} backend", backend.name());
        let result = backend.extract(&request, settings).await;
        self.complete(result)
    }

    /// Return to idle, dropping the file and any result.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}
