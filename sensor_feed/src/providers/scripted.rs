//! An in-memory [`HttpTransport`] that replays canned outcomes.
//!
//! Lets fetch and acquisition logic run without a server, and under
//! `tokio::time::pause` when timing matters. Once the script is exhausted every
//! request fails with `connection refused`.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Url;
use tokio::time::Instant;

use crate::providers::{HttpResponse, HttpTransport, TransportError};

/// One scripted outcome: a response, or a transport failure message.
pub type Reply = Result<HttpResponse, String>;

pub struct ScriptedTransport {
    latency: Duration,
    replies: Mutex<VecDeque<Reply>>,
    arrivals: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    /// Answers immediately.
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Self::with_latency(Duration::ZERO, replies)
    }

    /// Answers each request `latency` after it arrives.
    pub fn with_latency(latency: Duration, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            latency,
            replies: Mutex::new(replies.into()),
            arrivals: Mutex::default(),
        })
    }

    /// Number of requests received so far.
    pub fn requests(&self) -> usize {
        self.arrivals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// When each request arrived, in order.
    pub fn arrivals(&self) -> Vec<Instant> {
        self.arrivals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
        self.arrivals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err("connection refused".into()));
        reply.map_err(TransportError::other)
    }
}

/// A `200 OK` carrying `body`.
pub fn ok(body: &str) -> Reply {
    status(200, body)
}

pub fn status(code: u16, body: &str) -> Reply {
    Ok(HttpResponse::new(code, body.as_bytes().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://localhost:8000/api/information/").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn replays_script_then_refuses() {
        let transport = ScriptedTransport::with_latency(
            Duration::from_millis(250),
            vec![status(503, "busy"), ok("[]")],
        );

        let started = Instant::now();
        assert_eq!(transport.get(&url()).await.unwrap().status, 503);
        assert_eq!(started.elapsed(), Duration::from_millis(250));
        assert_eq!(transport.get(&url()).await.unwrap().body, b"[]");

        let err = transport.get(&url()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");

        let arrivals = transport.arrivals();
        assert_eq!(transport.requests(), 3);
        assert_eq!(arrivals[1] - arrivals[0], Duration::from_millis(250));
    }
}
