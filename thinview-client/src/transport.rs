//! The network seam. The session only ever talks to a [`Transport`].

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub endpoint: String,
    pub body: Value,
    /// Whether an identical earlier reply may be served from the replay cache.
    #[serde(skip)]
    pub cacheable: bool,
}

impl Request {
    pub fn new(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            body,
            cacheable: false,
        }
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Absolute address of this request under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Cache key: endpoint plus the body in canonical (key-sorted) JSON.
    pub fn signature(&self) -> String {
        format!("{}\n{}", self.endpoint, self.body)
    }
}

pub trait Transport {
    /// Sends one request to `url` and returns the raw reply body.
    fn send(
        &self,
        url: &str,
        request: &Request,
    ) -> impl Future<Output = ClientResult<Value>> + Send;
}

/// Serves pre-recorded replies in order. Used for replays and tests.
#[derive(Debug, Default)]
pub struct RecordedTransport {
    replies: Mutex<VecDeque<Value>>,
    sent: Mutex<Vec<Request>>,
    urls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl RecordedTransport {
    pub fn new(replies: impl IntoIterator<Item = Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Holds every reply back for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: Value) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Requests seen so far, in send order.
    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Addresses the requests went to, in send order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Transport for RecordedTransport {
    async fn send(&self, url: &str, request: &Request) -> ClientResult<Value> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        reply.ok_or_else(|| {
            ClientError::Transport(format!("no recorded reply left for '{}'", request.endpoint))
        })
    }
}
