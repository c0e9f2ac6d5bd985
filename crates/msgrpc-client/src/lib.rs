//! msgrpc client library
//!
//! JSON-RPC 2.0 over HTTP POST for topic/parameter message exchanges.
//! [`AsyncRpcClient`] is the awaitable core; [`RpcClient`] is a blocking
//! adapter that keeps the last call's outcome as polled state.

pub mod blocking;
pub mod client;
pub mod protocol;
pub mod signal;
pub mod transport;

pub use blocking::RpcClient;
pub use client::AsyncRpcClient;
pub use msgrpc_core::{ClientConfig, Error, Message, Params, Result};
pub use protocol::{Request, RequestParams, ResponseError, JSON_RPC_VERSION};
pub use signal::Completion;
pub use transport::{CompletionHandler, HttpOutcome, HttpRequest, ReqwestTransport, Transport};
