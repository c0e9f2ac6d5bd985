//! HTTP transport abstraction
//!
//! A transport accepts a request together with a completion handler and
//! returns immediately. The handler is invoked exactly once, on a thread the
//! caller does not control, when the exchange finishes or fails.

use msgrpc_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub verb: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            verb: "POST".to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Result of a submitted request as seen by the completion handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    /// The server answered (any status)
    Completed {
        status: u16,
        content_type: Option<String>,
        body: String,
    },
    /// No usable response: connect error, bad URL, body read failure...
    Failed(String),
}

pub type CompletionHandler = Box<dyn FnOnce(HttpOutcome) + Send + 'static>;

pub trait Transport: Send + Sync {
    /// Start `request` and return without waiting for it
    fn submit(&self, request: HttpRequest, on_complete: CompletionHandler);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn submit(&self, request: HttpRequest, on_complete: CompletionHandler) {
        (**self).submit(request, on_complete)
    }
}

/// reqwest-backed transport driven by a tokio runtime.
///
/// Blocking callers must not run on a thread of the runtime that drives
/// this transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl ReqwestTransport {
    /// Create a transport with its own single-worker runtime
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("msgrpc-http")
            .enable_all()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to start HTTP runtime: {}", e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Create a transport that spawns onto an existing runtime
    pub fn with_handle(handle: Handle) -> Self {
        Self::with_client(reqwest::Client::new(), handle)
    }

    pub fn with_client(client: reqwest::Client, handle: Handle) -> Self {
        Self {
            client,
            handle,
            runtime: None,
        }
    }
}

impl Transport for ReqwestTransport {
    fn submit(&self, request: HttpRequest, on_complete: CompletionHandler) {
        let client = self.client.clone();
        self.handle.spawn(async move {
            let outcome = send(&client, request).await;
            on_complete(outcome);
        });
    }
}

impl Drop for ReqwestTransport {
    fn drop(&mut self) {
        // Plain drop panics when it happens inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn send(client: &reqwest::Client, request: HttpRequest) -> HttpOutcome {
    let method = match reqwest::Method::from_bytes(request.verb.as_bytes()) {
        Ok(method) => method,
        Err(e) => return HttpOutcome::Failed(format!("Invalid verb '{}': {}", request.verb, e)),
    };

    let mut builder = client.request(method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = match builder.body(request.body).send().await {
        Ok(response) => response,
        Err(e) => return HttpOutcome::Failed(e.to_string()),
    };

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match response.text().await {
        Ok(body) => HttpOutcome::Completed {
            status,
            content_type,
            body,
        },
        Err(e) => HttpOutcome::Failed(format!("Failed to read response body: {}", e)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use msgrpc_core::models::config::DEFAULT_RESPONSE_CONTENT_TYPE;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Completes each request from a fresh thread with the next queued
    /// outcome. Requests with nothing queued are parked and never complete.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        outcomes: Mutex<VecDeque<HttpOutcome>>,
        requests: Mutex<Vec<HttpRequest>>,
        parked: Mutex<Vec<CompletionHandler>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub(crate) fn push(&self, outcome: HttpOutcome) {
            self.outcomes.lock().unwrap().push_back(outcome);
        }

        pub(crate) fn push_messages(&self, body: &str) {
            self.push(HttpOutcome::Completed {
                status: 200,
                content_type: Some(DEFAULT_RESPONSE_CONTENT_TYPE.to_string()),
                body: body.to_string(),
            });
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Parsed JSON bodies of every submitted request
        pub(crate) fn bodies(&self) -> Vec<serde_json::Value> {
            self.requests()
                .iter()
                .map(|r| serde_json::from_str(&r.body).unwrap())
                .collect()
        }

        /// Complete the oldest parked request
        pub(crate) fn release(&self, outcome: HttpOutcome) -> bool {
            let handler = {
                let mut parked = self.parked.lock().unwrap();
                if parked.is_empty() {
                    return false;
                }
                parked.remove(0)
            };
            handler(outcome);
            true
        }
    }

    impl Transport for ScriptedTransport {
        fn submit(&self, request: HttpRequest, on_complete: CompletionHandler) {
            self.requests.lock().unwrap().push(request);
            match self.outcomes.lock().unwrap().pop_front() {
                Some(outcome) => {
                    std::thread::spawn(move || on_complete(outcome));
                }
                None => self.parked.lock().unwrap().push(on_complete),
            }
        }
    }
}
