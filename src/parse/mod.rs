mod error;
mod grammar;

use std::fmt;

use chrono::NaiveDateTime;

pub use error::ParseError;

/// Canonical output format of normalized date conditions.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a free-form date/time expression relative to `now`.
///
/// Accepts ISO (`2024-01-05`, `2024/01/05`, `2024-01-05 10:30:00.000`,
/// `2024-01-05T10:30`), US (`01/05/2024`, `1/5/24`), European (`05.01.2024`)
/// and written-out (`Jan 5, 2024`, `5 January 2024`) dates with an optional
/// time (`10:30`, `3:00 pm`), Unix timestamps (`@1704412800`), the keywords
/// `now`, `today`, `midnight`,
/// `tomorrow`, `yesterday`, and signed offsets such as `+1 day` or
/// `-2 hours`, alone or after a base. Matching is case-insensitive.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is empty, not a recognized form, names
/// an impossible calendar date, or overflows.
pub fn parse_datetime(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ParseError> {
    use winnow::Parser;
    let lowered = input.to_ascii_lowercase();
    let expr = grammar::date_expr
        .parse(lowered.as_str())
        .map_err(|e| describe(&e))?;
    if expr.is_empty() {
        return Err(ParseError::new("empty expression"));
    }
    expr.resolve(now)
        .ok_or_else(|| ParseError::new("date out of range"))
}

/// One-line message for a grammar failure: what was expected, or what was
/// found, and where.
fn describe<E: fmt::Display>(err: &winnow::error::ParseError<&str, E>) -> ParseError {
    let offset = err.offset();
    let expected = err.inner().to_string();
    let expected: Vec<&str> = expected.lines().filter(|l| !l.is_empty()).collect();
    if !expected.is_empty() {
        return ParseError::new(format!("{} at offset {offset}", expected.join("; ")));
    }
    match err.input().get(offset..).and_then(|rest| rest.chars().next()) {
        Some(found) => ParseError::new(format!("unexpected '{found}' at offset {offset}")),
        None => ParseError::new(format!("unexpected end of input at offset {offset}")),
    }
}

/// Parse and format as `YYYY-MM-DD HH:MM:SS`.
///
/// # Errors
///
/// See [`parse_datetime`].
pub fn normalize_datetime(input: &str, now: NaiveDateTime) -> Result<String, ParseError> {
    parse_datetime(input, now).map(|at| at.format(DATETIME_FORMAT).to_string())
}
