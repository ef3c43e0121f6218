use reqwest::Url;
use snafu::Snafu;

use crate::providers::TransportError;

/// Longest slice of an error response body kept for diagnostics.
pub(crate) const BODY_SNIPPET_CHARS: usize = 100;

/// Why a single attempt was not accepted. Always retried while budget remains.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AttemptError {
    /// No response was obtained.
    #[snafu(display("transport failure: {source}"))]
    Transport { source: TransportError },

    /// The server answered outside `[200, 300)`.
    #[snafu(display("HTTP status {status}: {snippet}"))]
    HttpStatus { status: u16, snippet: String },

    /// A 2xx response whose body is not valid JSON.
    #[snafu(display("response body is not valid JSON: {source}"))]
    Parse { source: serde_json::Error },
}

/// Terminal outcome of a fetch whose every attempt failed.
#[derive(Debug, Snafu)]
#[snafu(display("GET {endpoint} failed after {attempts} attempt(s): {source}"))]
pub struct FetchError {
    pub(crate) endpoint: Url,
    pub(crate) attempts: u32,
    pub(crate) source: AttemptError,
}

impl FetchError {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Number of requests issued, equal to the budget's `max_attempts`.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The failure of the final attempt.
    pub fn last_failure(&self) -> &AttemptError {
        &self.source
    }
}

pub(crate) fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut snippet: String = text.chars().take(BODY_SNIPPET_CHARS).collect();
    if text.chars().count() > BODY_SNIPPET_CHARS {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(250);
        let snippet = body_snippet(body.as_bytes());
        assert_eq!(snippet.len(), BODY_SNIPPET_CHARS + 3);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn short_bodies_are_kept_verbatim() {
        assert_eq!(body_snippet(b"Service Unavailable"), "Service Unavailable");
    }

    #[test]
    fn fetch_error_names_endpoint_and_cause() {
        let err = FetchError {
            endpoint: Url::parse("http://localhost:8000/api/information/").unwrap(),
            attempts: 3,
            source: AttemptError::HttpStatus {
                status: 502,
                snippet: "Bad Gateway".into(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("http://localhost:8000/api/information/"));
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("HTTP status 502"));
    }
}
