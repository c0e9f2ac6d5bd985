//! Asynchronous client core
//!
//! [`AsyncRpcClient`] submits a request through a [`Transport`] and awaits
//! the completion handler over a oneshot channel. Dropping the returned
//! future abandons the request; a late completion is discarded.

use msgrpc_core::{ClientConfig, Error, Message, Params, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::oneshot;

use crate::protocol::{self, Request, RequestParams, REQUEST_CONTENT_TYPE};
use crate::transport::{HttpRequest, Transport};

/// Endpoint and request id sequencing shared by both client front-ends
#[derive(Debug, Default)]
pub(crate) struct RequestFactory {
    endpoint: Option<String>,
    next_id: AtomicU64,
}

impl RequestFactory {
    pub(crate) fn set_endpoint(&mut self, url: String) {
        self.endpoint = Some(url);
        *self.next_id.get_mut() = 0;
    }

    pub(crate) fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Assign the next id and encode the HTTP request.
    ///
    /// Fails without consuming an id when no endpoint is set.
    pub(crate) fn build(
        &self,
        method: &str,
        params: RequestParams,
        user_agent: &str,
    ) -> Result<(u64, HttpRequest)> {
        let url = self.endpoint.as_deref().ok_or(Error::EndpointNotSet)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = Request::new(method, id, params).to_body()?;

        let request = HttpRequest::post(url, body)
            .with_header("User-Agent", user_agent)
            .with_header("Content-Type", REQUEST_CONTENT_TYPE);
        Ok((id, request))
    }
}

pub(crate) fn log_result(id: u64, method: &str, result: &Result<Vec<Message>>) {
    match result {
        Ok(messages) => {
            tracing::debug!(id, method, messages = messages.len(), "Request completed")
        }
        Err(e) => tracing::warn!(id, method, "Request failed: {}", e),
    }
}

/// Marks a client busy for as long as it is alive
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Awaitable JSON-RPC client.
///
/// At most one request is in flight per instance; an overlapping call fails
/// with [`Error::Busy`].
///
/// Calls must be polled inside a tokio runtime with the time driver enabled,
/// since the response wait is bounded by `tokio::time::timeout`.
pub struct AsyncRpcClient<T> {
    transport: T,
    config: ClientConfig,
    requests: RequestFactory,
    in_flight: AtomicBool,
}

impl<T: Transport> AsyncRpcClient<T> {
    /// Create a client with the default configuration
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
            requests: RequestFactory::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(transport)
        })
    }

    /// Set the target URL and restart request ids at 0
    pub fn set_endpoint(&mut self, url: impl Into<String>) {
        self.requests.set_endpoint(url.into());
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.requests.endpoint()
    }

    /// Id the next request will carry
    pub fn next_request_id(&self) -> u64 {
        self.requests.next_id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `method` with a flat parameter object
    pub async fn call(&self, method: &str, params: &Params) -> Result<Vec<Message>> {
        self.dispatch(method, RequestParams::Object(params.clone())).await
    }

    /// Call `method` with a batch of messages
    pub async fn call_messages(&self, method: &str, messages: &[Message]) -> Result<Vec<Message>> {
        self.dispatch(method, RequestParams::batch(messages)).await
    }

    async fn dispatch(&self, method: &str, params: RequestParams) -> Result<Vec<Message>> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let (id, request) = self
            .requests
            .build(method, params, &self.config.user_agent)?;

        tracing::debug!(id, method, url = %request.url, "Submitting request");
        tracing::trace!(id, body = %request.body, "Request body");

        let (tx, rx) = oneshot::channel();
        self.transport.submit(
            request,
            Box::new(move |outcome| {
                // Receiver is gone if the caller timed out or was cancelled
                let _ = tx.send(outcome);
            }),
        );

        let timeout = self.config.timeout();
        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => {
                protocol::decode_outcome(outcome, &self.config.response_content_type)
            }
            Ok(Err(_)) => Err(Error::Transport(
                "Completion handler dropped without a response".to_string(),
            )),
            Err(_) => Err(Error::Timeout(timeout)),
        };

        log_result(id, method, &result);
        result
    }
}
