use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use snafu::ResultExt;

use crate::providers::{
    ClientBuildSnafu, HttpResponse, HttpTransport, ProviderInitError, ReqwestSnafu, TransportError,
};

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport that asks for JSON.
    ///
    /// `request_timeout` bounds each individual request, connect included.
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(ClientBuildSnafu)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context(ReqwestSnafu)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.context(ReqwestSnafu)?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
