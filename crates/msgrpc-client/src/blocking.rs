//! Blocking client
//!
//! [`RpcClient`] parks the calling thread on a [`Completion`] until the
//! transport's handler fires, then keeps the outcome as polled state:
//! check [`RpcClient::is_last_request_ok`] before trusting
//! [`RpcClient::response`].

use msgrpc_core::{ClientConfig, Error, Message, Params, Result};
use std::sync::Arc;

use crate::client::{log_result, RequestFactory};
use crate::protocol::{self, RequestParams};
use crate::signal::Completion;
use crate::transport::{HttpOutcome, ReqwestTransport, Transport};

/// Hands one transport outcome to the waiting caller.
///
/// Dropping it without firing signals a transport failure, so the caller is
/// released as soon as the transport discards the handler.
struct Notifier {
    completion: Option<Arc<Completion<HttpOutcome>>>,
    generation: u64,
}

impl Notifier {
    fn fire(mut self, outcome: HttpOutcome) {
        if let Some(completion) = self.completion.take() {
            completion.signal(self.generation, outcome);
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            completion.signal(
                self.generation,
                HttpOutcome::Failed("Completion handler dropped without a response".to_string()),
            );
        }
    }
}

/// Blocking JSON-RPC client with polled response state.
///
/// Calls take `&mut self`, so one instance never has two requests in flight.
/// Wrap it in a `Mutex` to share it between threads.
pub struct RpcClient<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
    requests: RequestFactory,
    completion: Arc<Completion<HttpOutcome>>,
    last_ok: bool,
    last_error: Option<Error>,
    response: Vec<Message>,
}

impl RpcClient<ReqwestTransport> {
    /// Create a client over reqwest with its own background runtime
    pub fn over_http() -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new()?))
    }
}

impl<T: Transport> RpcClient<T> {
    /// Create a client with the default configuration
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
            requests: RequestFactory::default(),
            completion: Arc::new(Completion::new()),
            last_ok: false,
            last_error: None,
            response: Vec::new(),
        }
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(transport)
        })
    }

    /// Set the target URL and restart request ids at 0. No I/O.
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

    /// Call `method` with a flat parameter object and block until it completes
    pub fn call(&mut self, method: &str, params: &Params) {
        self.dispatch(method, RequestParams::Object(params.clone()));
    }

    /// Call `method` with a batch of messages and block until it completes
    pub fn call_messages(&mut self, method: &str, messages: &[Message]) {
        self.dispatch(method, RequestParams::batch(messages));
    }

    /// Like [`call_messages`](Self::call_messages), then replace the contents
    /// of `out` with the response
    pub fn call_messages_into(
        &mut self,
        method: &str,
        messages: &[Message],
        out: &mut Vec<Message>,
    ) {
        self.call_messages(method, messages);
        out.clear();
        out.extend_from_slice(&self.response);
    }

    /// Whether the most recent call succeeded
    pub fn is_last_request_ok(&self) -> bool {
        self.last_ok
    }

    /// Messages decoded by the most recent call; empty after a failure
    pub fn response(&self) -> &[Message] {
        &self.response
    }

    /// Why the most recent call failed
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    fn dispatch(&mut self, method: &str, params: RequestParams) {
        let result = self.exchange(method, params);
        match result {
            Ok(messages) => {
                self.last_ok = true;
                self.last_error = None;
                self.response = messages;
            }
            Err(e) => {
                self.last_ok = false;
                self.last_error = Some(e);
                self.response.clear();
            }
        }
    }

    fn exchange(&self, method: &str, params: RequestParams) -> Result<Vec<Message>> {
        let (id, request) = self
            .requests
            .build(method, params, &self.config.user_agent)?;

        tracing::debug!(id, method, url = %request.url, "Submitting request");
        tracing::trace!(id, body = %request.body, "Request body");

        let notifier = Notifier {
            generation: self.completion.reset(),
            completion: Some(self.completion.clone()),
        };
        self.transport
            .submit(request, Box::new(move |outcome| notifier.fire(outcome)));

        let timeout = self.config.timeout();
        let result = if self.completion.wait_timeout(timeout) {
            match self.completion.take() {
                Some(outcome) => {
                    protocol::decode_outcome(outcome, &self.config.response_content_type)
                }
                None => Err(Error::Transport(
                    "Completion signaled without an outcome".to_string(),
                )),
            }
        } else {
            Err(Error::Timeout(timeout))
        };

        log_result(id, method, &result);
        result
    }
}
