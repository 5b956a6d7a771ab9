//! Client side of the Express Checkout NVP protocol.
//!
//! Requests are flat key/value maps sent as a form-encoded POST. Responses
//! come back form-encoded too and are parsed into `key -> [values]`, since
//! the gateway repeats keys for list-style fields.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod http;

pub use http::HttpGateway;

/// Outbound request fields.
pub type PostData = BTreeMap<String, String>;

const DEFAULT_ERROR_MESSAGE: &str = "Exception when calling Paypal.";

/// Parsed gateway response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GatewayResponse(BTreeMap<String, Vec<String>>);

impl GatewayResponse {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn ack(&self) -> Ack {
        Ack::parse(self.first("ACK"))
    }

    /// Human readable error message, taken from the first `L_LONGMESSAGE0`.
    pub fn long_message(&self) -> &str {
        self.first("L_LONGMESSAGE0").unwrap_or(DEFAULT_ERROR_MESSAGE)
    }

    /// First value of `field`, or a [`GatewayError::MissingField`] carrying the response.
    pub fn require(&self, field: &'static str) -> Result<String, GatewayError> {
        self.first(field)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::MissingField {
                field,
                response: self.clone(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for GatewayResponse {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(pairs: T) -> Self {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            fields.entry(key).or_default().push(value);
        }
        Self(fields)
    }
}

/// Top level status of a gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Success,
    SuccessWithWarning,
    Failure,
    FailureWithWarning,
    Other(String),
    Missing,
}

impl Ack {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("Success") => Ack::Success,
            Some("SuccessWithWarning") => Ack::SuccessWithWarning,
            Some("Failure") => Ack::Failure,
            Some("FailureWithWarning") => Ack::FailureWithWarning,
            Some(other) => Ack::Other(other.to_string()),
            None => Ack::Missing,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Ack::Success | Ack::SuccessWithWarning)
    }
}

/// Every way a gateway call can fail. The three checkout steps handle all
/// variants the same way: log, then take their failure branch.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{}", .0.long_message())]
    Failure(GatewayResponse),

    #[error("Gateway response is missing {field}")]
    MissingField {
        field: &'static str,
        response: GatewayResponse,
    },
}

impl GatewayError {
    pub fn response(&self) -> Option<&GatewayResponse> {
        match self {
            GatewayError::Transport(_) => None,
            GatewayError::Failure(response) | GatewayError::MissingField { response, .. } => {
                Some(response)
            }
        }
    }

    /// Payload stored on the error log row.
    pub fn log_payload(&self) -> String {
        match self.response() {
            Some(response) => {
                serde_json::to_string(response).unwrap_or_else(|_| format!("{:?}", response))
            }
            None => self.to_string(),
        }
    }
}

pub fn encode_post_data(post_data: &PostData) -> Result<String, GatewayError> {
    serde_urlencoded::to_string(post_data)
        .map_err(|e| GatewayError::Transport(format!("Could not encode request: {}", e)))
}

/// Parses a form-encoded body. Pairs with blank values are dropped.
pub fn parse_response(body: &str) -> GatewayResponse {
    url::form_urlencoded::parse(body.as_bytes())
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Turns a response with a non-success `ACK` into [`GatewayError::Failure`].
pub fn check_ack(response: GatewayResponse) -> Result<GatewayResponse, GatewayError> {
    if response.ack().is_success() {
        Ok(response)
    } else {
        Err(GatewayError::Failure(response))
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Posts `post_data` and parses the reply. Only transport problems are
    /// errors here; the `ACK` is not inspected.
    async fn send(&self, post_data: &PostData) -> Result<GatewayResponse, GatewayError>;

    async fn call(&self, post_data: &PostData) -> Result<GatewayResponse, GatewayError> {
        check_ack(self.send(post_data).await?)
    }
}
