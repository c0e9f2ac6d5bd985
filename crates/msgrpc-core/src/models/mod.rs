pub mod config;
pub mod message;

pub use config::ClientConfig;
pub use message::{Message, Params};
