//! Named parameter bundles

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat string parameter map sent with single-object calls
pub type Params = BTreeMap<String, String>;

/// A topic with its own set of string parameters.
///
/// Used both as an element of a batch request and as one decoded entry of
/// `result.messages` in a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub params: Params,
}

impl Message {
    /// Create a message with no parameters
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            params: Params::new(),
        }
    }

    /// Create a message from any iterator of key/value pairs
    pub fn from_params<I, K, V>(topic: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            topic: topic.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add a parameter, replacing any previous value for the key
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
