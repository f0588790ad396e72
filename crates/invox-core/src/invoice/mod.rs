//! Validation of extracted invoices.

pub mod currency;
pub mod reconcile;

pub use currency::{DEFAULT_CURRENCY, format_amount, format_money, normalize_currency};
pub use reconcile::{DEFAULT_TOLERANCE, Discrepancy, LineIssue, check_totals, line_item_issues};
