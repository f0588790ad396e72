//! Currency code validation and money formatting.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

/// Code used when neither the extracted nor the configured code is usable.
pub const DEFAULT_CURRENCY: &str = "USD";

lazy_static! {
    static ref CURRENCY_CODE: Regex = Regex::new(r"^[A-Za-z]{3}$").unwrap();
}

/// Check whether a string looks like a 3-letter currency code.
pub fn is_currency_code(code: &str) -> bool {
    CURRENCY_CODE.is_match(code.trim())
}

/// Normalize a currency code for display.
///
/// Valid codes are upper-cased. Missing or malformed codes fall back to
/// `default`, and to [`DEFAULT_CURRENCY`] if `default` is malformed too.
pub fn normalize_currency(code: Option<&str>, default: &str) -> String {
    match code.map(str::trim) {
        Some(c) if is_currency_code(c) => c.to_ascii_uppercase(),
        _ if is_currency_code(default) => default.trim().to_ascii_uppercase(),
        _ => DEFAULT_CURRENCY.to_string(),
    }
}

fn symbol_for(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

/// Format an amount with two decimals and thousands separators (1,234.56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let Some((integer_part, decimal_part)) = unsigned.split_once('.') else {
        return format!("{}{}", sign, unsigned);
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}{}.{}", sign, grouped, decimal_part)
}

/// Format an amount in the given currency (e.g. "$1,234.56" or "CHF 1,234.56").
///
/// The code is assumed to be normalized already.
pub fn format_money(amount: Decimal, code: &str) -> String {
    let formatted = format_amount(amount);
    match (symbol_for(code), formatted.strip_prefix('-')) {
        (Some(symbol), Some(rest)) => format!("-{}{}", symbol, rest),
        (Some(symbol), None) => format!("{}{}", symbol, formatted),
        (None, _) => format!("{} {}", code, formatted),
    }
}
