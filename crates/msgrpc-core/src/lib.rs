//! msgrpc core types
//!
//! Data model, client configuration and the shared error type.

pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{ClientConfig, Message, Params};
