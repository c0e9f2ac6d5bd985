//! JSON-RPC wire format
//!
//! Requests carry their id as a decimal string. Successful responses are
//! expected to look like `{"result":{"messages":{"<topic>":{"<k>":"<v>"}}}}`.

use msgrpc_core::{Error, Message, Params, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::HttpOutcome;

pub const JSON_RPC_VERSION: &str = "2.0";

/// Content type of every request body
pub const REQUEST_CONTENT_TYPE: &str = "application/json";

/// The two shapes of `params` a request can carry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RequestParams {
    /// `"params": {"k": "v", ...}`
    Object(Params),
    /// `"params": {"params": [{"topic": .., "params": {..}}, ...]}`
    Batch { params: Vec<Message> },
}

impl RequestParams {
    pub fn batch(messages: &[Message]) -> Self {
        RequestParams::Batch {
            params: messages.to_vec(),
        }
    }
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub method: String,
    pub id: String,
    pub params: RequestParams,
}

impl Request {
    pub fn new(method: impl Into<String>, id: u64, params: RequestParams) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION,
            method: method.into(),
            id: id.to_string(),
            params,
        }
    }

    pub fn to_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ResponseError>,
}

/// Turn a finished HTTP exchange into the decoded message list.
///
/// The content type must match `expected_content_type` exactly.
pub fn decode_outcome(outcome: HttpOutcome, expected_content_type: &str) -> Result<Vec<Message>> {
    match outcome {
        HttpOutcome::Failed(reason) => Err(Error::Transport(reason)),
        HttpOutcome::Completed {
            status,
            content_type,
            body,
        } => {
            if !(200..300).contains(&status) {
                return Err(Error::Status(status));
            }

            let actual = content_type.unwrap_or_default();
            if actual != expected_content_type {
                return Err(Error::ContentType {
                    expected: expected_content_type.to_string(),
                    actual,
                });
            }

            decode_messages(&body)
        }
    }
}

/// Decode `result.messages` into one [`Message`] per field, in wire order
pub fn decode_messages(body: &str) -> Result<Vec<Message>> {
    let response: ResponseBody = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(Error::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let result = response
        .result
        .ok_or_else(|| malformed("missing 'result'"))?;
    let messages = result
        .get("messages")
        .ok_or_else(|| malformed("missing 'result.messages'"))?
        .as_object()
        .ok_or_else(|| malformed("'result.messages' is not an object"))?;

    messages
        .iter()
        .map(|(topic, value)| decode_message(topic, value))
        .collect()
}

fn decode_message(topic: &str, value: &Value) -> Result<Message> {
    let fields = value
        .as_object()
        .ok_or_else(|| malformed(format!("message '{}' is not an object", topic)))?;

    let mut params = Params::new();
    for (key, value) in fields {
        let value = match value {
            Value::String(s) => s.clone(),
            // Scalars are accepted in their JSON text form
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(malformed(format!(
                    "parameter '{}' of message '{}' is not a scalar",
                    key, topic
                )))
            }
        };
        params.insert(key.clone(), value);
    }

    Ok(Message {
        topic: topic.to_string(),
        params,
    })
}

fn malformed(detail: impl Into<String>) -> Error {
    Error::MalformedResponse(detail.into())
}
