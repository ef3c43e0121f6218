//! Retrying GET client for one configured endpoint.

use reqwest::Url;
use snafu::ResultExt;
use tracing::{debug, error, warn};

use crate::{
    errors::Error,
    models::{RawPayload, retry_budget::RetryBudget},
    providers::HttpTransport,
    requests::errors::{
        AttemptError, FetchError, HttpStatusSnafu, ParseSnafu, TransportSnafu, body_snippet,
    },
};

/// Checks that `endpoint` is an absolute `http`/`https` URL with a host.
pub fn validate_endpoint(endpoint: &Url) -> Result<(), Error> {
    let invalid = |message: &str| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message: message.to_string(),
    };

    if endpoint.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base"));
    }
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if endpoint.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host"));
    }
    Ok(())
}

/// Parses and validates an endpoint string.
pub fn parse_endpoint(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidEndpoint {
        endpoint: raw.to_string(),
        message: e.to_string(),
    })?;
    validate_endpoint(&url)?;
    Ok(url)
}

/// Fetches JSON from one endpoint, retrying failed attempts with exponential backoff.
///
/// A response is accepted only when the transport succeeds, the status is 2xx
/// and the body parses as JSON. Anything else is an attempt failure. Retry
/// counters live in each [`fetch`](Self::fetch) call, so concurrent calls on
/// the same client never share them.
pub struct FetchClient<T> {
    transport: T,
    endpoint: Url,
    budget: RetryBudget,
}

impl<T: HttpTransport> FetchClient<T> {
    /// Creates a client bound to `endpoint` and `budget`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidEndpoint`] - `endpoint` is not an absolute http(s) URL.
    /// * [`Error::InvalidBudget`] - `budget.max_attempts` is 0 or its cap is below its base.
    pub fn new(transport: T, endpoint: Url, budget: RetryBudget) -> Result<Self, Error> {
        validate_endpoint(&endpoint)?;
        budget.validate()?;
        Ok(Self {
            transport,
            endpoint,
            budget,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn budget(&self) -> &RetryBudget {
        &self.budget
    }

    /// Fetches the endpoint, retrying until an attempt is accepted or the budget is spent.
    pub async fn fetch(&self) -> Result<RawPayload, FetchError> {
        self.fetch_with_progress(|_| {}).await
    }

    /// Like [`fetch`](Self::fetch), calling `on_attempt` with the 0-based
    /// attempt number right before each request.
    ///
    /// Never issues more than `budget.max_attempts` requests. Dropping the
    /// returned future cancels both a pending request and a pending backoff.
    pub async fn fetch_with_progress<F>(&self, mut on_attempt: F) -> Result<RawPayload, FetchError>
    where
        F: FnMut(u32) + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            on_attempt(attempt);

            let failure = match self.attempt().await {
                Ok(payload) => {
                    debug!(endpoint = %self.endpoint, attempt, "Fetch attempt accepted");
                    return Ok(payload);
                }
                Err(failure) => failure,
            };

            if !self.budget.should_retry(attempt) {
                error!(
                    endpoint = %self.endpoint,
                    attempts = attempt + 1,
                    error = %failure,
                    "Fetch failed, retry budget exhausted"
                );
                return Err(FetchError {
                    endpoint: self.endpoint.clone(),
                    attempts: attempt + 1,
                    source: failure,
                });
            }

            let delay = self.budget.delay_for(attempt);
            warn!(
                endpoint = %self.endpoint,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Fetch attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self) -> Result<RawPayload, AttemptError> {
        let response = self
            .transport
            .get(&self.endpoint)
            .await
            .context(TransportSnafu)?;

        if !response.is_success() {
            return HttpStatusSnafu {
                status: response.status,
                snippet: body_snippet(&response.body),
            }
            .fail();
        }

        serde_json::from_slice(&response.body).context(ParseSnafu)
    }
}
