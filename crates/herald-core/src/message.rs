//! Message: the unit carried by every transport.
//!
//! A message is a string-to-string metadata map plus an opaque body.
//! JSON is the conventional body encoding but nothing here requires it;
//! `from_bytes` and `text` carry arbitrary payloads.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Well-known metadata keys and values.
pub mod headers {
    /// Outcome marker set by the success/error constructors.
    pub const RESULT: &str = "result";
    pub const SUCCESS: &str = "success";
    pub const ERROR: &str = "error";
}

/// Body of a message built with [`Message::error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub metadata: HashMap<String, String>,
    pub body: Bytes,
}

impl Message {
    /// No metadata, no body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap raw bytes as a successful message.
    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        Self::empty()
            .with_header(headers::RESULT, headers::SUCCESS)
            .with_body(body)
    }

    /// Wrap UTF-8 text as a successful message. The text is not JSON-quoted.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into())
    }

    /// Serialize `body` as JSON into a successful message.
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(body)?;
        Ok(Self::from_bytes(bytes))
    }

    /// An error reply: `result=error` with body `{"message": ...}`.
    pub fn error(message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "message": message.into() }).to_string();
        Self::empty()
            .with_header(headers::RESULT, headers::ERROR)
            .with_body(body)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.header(headers::RESULT) == Some(headers::ERROR)
    }

    /// Decode the body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The body as UTF-8, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Error text of a message built with [`Message::error`].
    pub fn error_text(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }
        self.decode::<ErrorBody>().ok().map(|e| e.message)
    }
}

/// Incremental construction of a [`Message`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.message.metadata.insert(key.into(), value.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.bytes(text.into())
    }

    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.message.body = body.into();
        self
    }

    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self.bytes(bytes))
    }

    pub fn build(self) -> Message {
        self.message
    }
}
