//! Request session: owns the content store for one login and drives the
//! request → reply → apply cycle.
//!
//! Requests are awaited one at a time; applying a reply is synchronous, so a
//! new batch never starts before the previous one finished. Jobs queued while
//! disconnected are flushed in enqueue order by [`Session::reconnect`].

use std::collections::VecDeque;
use std::sync::Arc;

use thinview_content::ContentStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::dispatch::{dispatch, DispatchReport};
use crate::error::{ClientError, ClientResult};
use crate::replay::ReplayCache;
use crate::response::Response;
use crate::transport::{Request, Transport};

/// A request held back until the session is connected again.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub request: Request,
}

pub struct Session<T: Transport> {
    id: Uuid,
    transport: T,
    store: ContentStore,
    config: ClientConfig,
    cache: Arc<ReplayCache>,
    jobs: VecDeque<Job>,
    cancel: CancellationToken,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let cache = Arc::new(ReplayCache::new(config.replay_ttl(), config.replay_capacity));
        Self::with_cache(transport, config, cache)
    }

    /// Builds a session sharing an existing replay cache.
    pub fn with_cache(transport: T, config: ClientConfig, cache: Arc<ReplayCache>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            store: ContentStore::new(),
            config,
            cache,
            jobs: VecDeque::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore {
        &mut self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ReplayCache> {
        &self.cache
    }

    /// Token that aborts the in-flight request and every later one until
    /// [`Session::reconnect`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Sends `request`, then applies the reply to the store as one batch.
    pub async fn request(&mut self, request: Request) -> ClientResult<DispatchReport> {
        let body = self.fetch(&request).await?;
        let responses = Response::parse_all(body)?;
        let report = dispatch(&mut self.store, responses);
        debug!(
            session = %self.id,
            endpoint = %request.endpoint,
            applied = report.applied,
            ignored = report.ignored,
            failed = report.failed,
            "applied reply"
        );
        Ok(report)
    }

    async fn fetch(&self, request: &Request) -> ClientResult<serde_json::Value> {
        let signature = request.signature();
        if request.cacheable {
            if let Some(body) = self.cache.get(&signature) {
                return Ok(body);
            }
        }

        let url = request.url(&self.config.base_url);
        let timeout = self.config.request_timeout();
        let body = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(ClientError::Cancelled {
                    endpoint: request.endpoint.clone(),
                });
            }
            result = tokio::time::timeout(timeout, self.transport.send(&url, request)) => match result {
                Ok(body) => body?,
                Err(_) => {
                    warn!(url = %url, ?timeout, "request timed out");
                    return Err(ClientError::Timeout {
                        endpoint: request.endpoint.clone(),
                        timeout_ms: self.config.request_timeout_ms,
                    });
                }
            },
        };

        if request.cacheable {
            self.cache.insert(signature, body.clone());
        }
        Ok(body)
    }

    /// Queues a request to run after the next reconnect.
    pub fn enqueue_job(&mut self, request: Request) -> Uuid {
        let id = Uuid::new_v4();
        self.jobs.push_back(Job { id, request });
        id
    }

    pub fn pending_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Starts over: fresh store and cancellation token, the `startup`
    /// request, then every queued job in enqueue order.
    ///
    /// A failing job stops the flush and stays at the front of the queue.
    pub async fn reconnect(&mut self, startup: Request) -> ClientResult<Vec<DispatchReport>> {
        self.cancel = CancellationToken::new();
        self.store.reset();

        let mut reports = vec![self.request(startup).await?];
        info!(session = %self.id, jobs = self.jobs.len(), "flushing job queue");
        while let Some(job) = self.jobs.pop_front() {
            match self.request(job.request.clone()).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(job = %job.id, error = %err, "queued job failed, keeping the rest");
                    self.jobs.push_front(job);
                    return Err(err);
                }
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordedTransport;
    use serde_json::json;
    use std::time::Duration;

    fn open_screen(name: &str, id: &str) -> serde_json::Value {
        json!([{
            "name": "screen.generic",
            "componentId": name,
            "changedComponents": [{"id": id, "name": name, "className": "Panel"}]
        }])
    }

    #[tokio::test]
    async fn test_request_applies_reply() {
        let transport = RecordedTransport::new([open_screen("S1", "1")]);
        let mut session = Session::new(transport, ClientConfig::default());

        let report = session.request(Request::new("api/open", json!({}))).await.unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(session.store().screens().head().unwrap().name, "S1");
    }

    #[tokio::test]
    async fn test_requests_go_to_configured_base_url() {
        let transport = RecordedTransport::new([open_screen("S1", "1")]);
        let config = ClientConfig {
            base_url: "https://erp.example.com/services/mobile".to_string(),
            ..ClientConfig::default()
        };
        let mut session = Session::new(transport, config);

        session.request(Request::new("api/open", json!({}))).await.unwrap();
        assert_eq!(
            session.transport().urls(),
            vec!["https://erp.example.com/services/mobile/api/open"]
        );
    }

    #[tokio::test]
    async fn test_cacheable_request_replays_from_cache() {
        let transport = RecordedTransport::new([open_screen("S1", "1")]);
        let mut session = Session::new(transport, ClientConfig::default());
        let request = Request::new("api/startup", json!({"app": "demo"})).cacheable();

        session.request(request.clone()).await.unwrap();
        session.request(request).await.unwrap();
        assert_eq!(session.transport().sent().len(), 1);
        assert_eq!(session.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_error() {
        let transport =
            RecordedTransport::new([open_screen("S1", "1")]).with_delay(Duration::from_millis(200));
        let config = ClientConfig {
            request_timeout_ms: 10,
            ..ClientConfig::default()
        };
        let mut session = Session::new(transport, config);
        let err = session.request(Request::new("api/slow", json!({}))).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout { timeout_ms: 10, .. }));
    }

    #[tokio::test]
    async fn test_cancelled_session_refuses_requests() {
        let transport = RecordedTransport::new([open_screen("S1", "1")]);
        let mut session = Session::new(transport, ClientConfig::default());
        session.cancel();
        let err = session.request(Request::new("api/open", json!({}))).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_reconnect_flushes_jobs_in_order() {
        let transport = RecordedTransport::new([
            open_screen("Home", "h"),
            open_screen("A", "a"),
            open_screen("B", "b"),
        ]);
        let mut session = Session::new(transport, ClientConfig::default());
        session.enqueue_job(Request::new("api/a", json!({})));
        session.enqueue_job(Request::new("api/b", json!({})));
        session.cancel();

        let reports = session.reconnect(Request::new("api/startup", json!({}))).await.unwrap();
        assert_eq!(reports.len(), 3);
        let endpoints: Vec<String> = session.transport().sent().into_iter().map(|r| r.endpoint).collect();
        assert_eq!(endpoints, vec!["api/startup", "api/a", "api/b"]);
        assert_eq!(session.store().screens().head().unwrap().name, "B");
        assert_eq!(session.pending_jobs().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_job_stays_queued() {
        let transport = RecordedTransport::new([open_screen("Home", "h")]);
        let mut session = Session::new(transport, ClientConfig::default());
        let job = session.enqueue_job(Request::new("api/a", json!({})));

        assert!(session.reconnect(Request::new("api/startup", json!({}))).await.is_err());
        assert_eq!(session.pending_jobs().next().map(|j| j.id), Some(job));
    }
}
