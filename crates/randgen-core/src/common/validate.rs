//! Client-side validation of the generator form.
//!
//! Field values arrive as raw strings. They are parsed the way a browser's
//! `parseInt` does (leading whitespace, optional sign, longest digit prefix)
//! and rejected when missing, unparseable, zero or negative. Validation has no
//! side effects: the caller decides how to surface [`Error::InvalidInput`].

use crate::{
    Error, Result,
    types::{COUNT_NUMBERS_FIELD, COUNT_THREADS_FIELD, GenerationRequest},
};
use std::collections::HashMap;

/// Raw field values of a submitted form, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the two generator fields.
    pub fn generator(count_numbers: impl Into<String>, count_threads: impl Into<String>) -> Self {
        Self::new()
            .with(COUNT_NUMBERS_FIELD, count_numbers)
            .with(COUNT_THREADS_FIELD, count_threads)
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Validates a submitted form into a [`GenerationRequest`].
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if either field is missing, not a number,
/// zero or negative.
pub fn validate_form(form: &FormData) -> Result<GenerationRequest> {
    let count_numbers = parse_count(form.get(COUNT_NUMBERS_FIELD))?;
    let count_threads = parse_count(form.get(COUNT_THREADS_FIELD))?;
    GenerationRequest::new(count_numbers, count_threads)
}

fn parse_count(raw: Option<&str>) -> Result<u32> {
    raw.and_then(parse_int)
        .and_then(|value| u32::try_from(value).ok())
        .filter(|&value| value > 0)
        .ok_or(Error::InvalidInput)
}

/// Parses the leading integer of `raw`, ignoring anything after the digits.
///
/// Returns `None` when no digits follow the optional sign, or when the value
/// does not fit in an `i64`.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for b in digits[..end].bytes() {
        value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    Some(if negative { -value } else { value })
}
