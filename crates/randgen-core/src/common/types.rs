//! # Wire Types
//!
//! The request/response shapes exchanged between the page controller and the
//! generator service. All three transports share them:
//!
//! - JSON WebSocket: [`GenerationRequest`] as a JSON text frame, answered by an
//!   [`Envelope`].
//! - Streaming WebSocket: [`GenerationRequest`] as query parameters, answered
//!   by plain-text chunks of space-separated numbers.
//! - HTTP POST: [`GenerationRequest`] as a form body, answered by a bare JSON
//!   array ([`GenerationResult`]).
//!
//! Field names on the wire are camelCase (`countNumbers`, `countThreads`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Name of the form field carrying the amount of numbers to generate.
pub const COUNT_NUMBERS_FIELD: &str = "countNumbers";

/// Name of the form field carrying the amount of generator threads.
pub const COUNT_THREADS_FIELD: &str = "countThreads";

/// Upper bound on generator threads accepted by the service.
pub const MAX_COUNT_THREADS: u32 = 32;

/// Separator used when rendering numbers and when joining streamed chunks.
pub const NUMBER_SEPARATOR: &str = " ";

/// The count parameters submitted by the user.
///
/// Both counts are strictly positive; use [`GenerationRequest::new`] or
/// [`crate::validate::validate_form`] to build one from untrusted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub count_numbers: u32,
    pub count_threads: u32,
}

impl GenerationRequest {
    /// Builds a request, rejecting zero in either field.
    pub fn new(count_numbers: u32, count_threads: u32) -> Result<Self> {
        if count_numbers == 0 || count_threads == 0 {
            return Err(Error::InvalidInput);
        }
        Ok(Self {
            count_numbers,
            count_threads,
        })
    }

    /// Enforces server-side limits on an already decoded request.
    ///
    /// Decoding alone accepts zero, so this re-checks positivity as well.
    pub fn check_limits(&self, max_count_numbers: u32, max_count_threads: u32) -> Result<()> {
        if self.count_numbers == 0 {
            return Err(Error::invalid_request("countNumbers must be greater than 0"));
        }
        if self.count_threads == 0 {
            return Err(Error::invalid_request("countThreads must be greater than 0"));
        }
        if self.count_numbers > max_count_numbers {
            return Err(Error::invalid_request(format!(
                "countNumbers {} exceeds maximum allowed ({max_count_numbers})",
                self.count_numbers
            )));
        }
        if self.count_threads > max_count_threads {
            return Err(Error::invalid_request(format!(
                "countThreads {} exceeds maximum allowed ({max_count_threads})",
                self.count_threads
            )));
        }
        Ok(())
    }
}

/// The ordered numbers returned by the backend.
///
/// Numbers are kept as [`serde_json::Number`] so whatever the server sends is
/// rendered verbatim (integers stay integers).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationResult(pub Vec<Number>);

impl GenerationResult {
    pub fn iter(&self) -> impl Iterator<Item = &Number> {
        self.0.iter()
    }

    /// Joins the numbers with single spaces, the way the output element shows
    /// them.
    pub fn render(&self) -> String {
        join_numbers(self.0.iter())
    }
}

impl From<Vec<u32>> for GenerationResult {
    fn from(numbers: Vec<u32>) -> Self {
        Self(numbers.into_iter().map(Number::from).collect())
    }
}

/// Joins anything displayable with [`NUMBER_SEPARATOR`].
pub fn join_numbers<T: core::fmt::Display>(numbers: impl IntoIterator<Item = T>) -> String {
    let mut out = String::new();
    for (i, number) in numbers.into_iter().enumerate() {
        if i > 0 {
            out.push_str(NUMBER_SEPARATOR);
        }
        out.push_str(&number.to_string());
    }
    out
}

/// Reply to a JSON WebSocket request.
///
/// `error` is set when `ok` is false and `result` when it is true; absent
/// fields are omitted from the encoded form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
}

impl Envelope {
    pub fn success(result: GenerationResult) -> Self {
        Self {
            ok: true,
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_fields() {
        let req = GenerationRequest::new(5, 2).unwrap();
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({"countNumbers": 5, "countThreads": 2})
        );
    }

    #[test]
    fn request_rejects_zero_counts() {
        assert_eq!(GenerationRequest::new(0, 2), Err(Error::InvalidInput));
        assert_eq!(GenerationRequest::new(5, 0), Err(Error::InvalidInput));
    }

    #[test]
    fn limits_are_enforced() {
        let req = GenerationRequest {
            count_numbers: 10,
            count_threads: 33,
        };
        assert!(matches!(
            req.check_limits(100, MAX_COUNT_THREADS),
            Err(Error::InvalidRequest { .. })
        ));

        let req = GenerationRequest {
            count_numbers: 101,
            count_threads: 1,
        };
        assert!(req.check_limits(100, MAX_COUNT_THREADS).is_err());

        let req = GenerationRequest {
            count_numbers: 0,
            count_threads: 1,
        };
        assert!(req.check_limits(100, MAX_COUNT_THREADS).is_err());

        let req = GenerationRequest::new(100, 32).unwrap();
        assert!(req.check_limits(100, MAX_COUNT_THREADS).is_ok());
    }

    #[test]
    fn result_renders_space_joined() {
        let result = GenerationResult::from(vec![1, 2, 3, 4, 5]);
        assert_eq!(result.render(), "1 2 3 4 5");
        assert_eq!(GenerationResult::default().render(), "");
    }

    #[test]
    fn result_keeps_non_integer_numbers() {
        let result: GenerationResult = serde_json::from_str("[1, 2.5, -3]").unwrap();
        assert_eq!(result.render(), "1 2.5 -3");
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let ok = Envelope::success(GenerationResult::from(vec![7]));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"ok": true, "result": [7]})
        );

        let err = Envelope::failure("bad params");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"ok": false, "error": "bad params"})
        );
    }

    #[test]
    fn envelope_decodes_without_optional_fields() {
        let env: Envelope = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert!(!env.ok);
        assert!(env.error.is_none());
        assert!(env.result.is_none());
    }
}
