//! HTTP transport abstraction for the sensor endpoint.
//!
//! This module defines the [`HttpTransport`] trait, the only thing the
//! [`FetchClient`](crate::requests::fetch_client::FetchClient) needs from the
//! network. It performs exactly one GET and reports the raw status and body;
//! deciding what counts as success, and whether to retry, is the client's job.
//!
//! [`reqwest_transport::ReqwestTransport`] is the production implementation;
//! [`scripted::ScriptedTransport`] replays canned outcomes in its place.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use reqwest::Url;
//! use sensor_feed::providers::{HttpResponse, HttpTransport, TransportError};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl HttpTransport for Canned {
//!     async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
//!         Ok(HttpResponse::new(200, b"[]".to_vec()))
//!     }
//! }
//! ```

pub mod reqwest_transport;
pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use snafu::{Backtrace, Snafu};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs single GET requests.
///
/// Implementations must not retry on their own; one call is one attempt.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET to `url` and returns whatever the server answered.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpResponse)` - The server answered, with any status code.
    /// * `Err(TransportError)` - No response was obtained (DNS, connect, timeout, ...).
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        (**self).get(url).await
    }
}

/// Errors that can occur during the creation of a transport instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// A request that produced no HTTP response at all.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    /// Network failure, timeout or protocol error inside reqwest.
    #[snafu(display("request failed: {source}"))]
    Reqwest { source: reqwest::Error },

    /// A failure reported by a non-reqwest transport.
    #[snafu(display("{message}"))]
    Other { message: String },
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        TransportError::Other {
            message: message.into(),
        }
    }
}
