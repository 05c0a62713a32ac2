//! Plain-data HTTP types shared by the adapter and transport implementations.
//!
//! # Design
//! These types describe what crosses the transport boundary: the method a
//! handle is opened with, the ready state it reports, the response type it
//! is asked to produce and the raw body it hands back. None of them perform
//! I/O. Transport implementations translate them to whatever the underlying
//! connection understands.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method a transport handle is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a transport handle, numbered the way browser transports
/// number it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReadyState {
    #[default]
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    /// Terminal: the request finished, failed at the network level, or was
    /// aborted.
    Done = 4,
}

impl ReadyState {
    pub fn is_done(self) -> bool {
        self == ReadyState::Done
    }
}

/// Body representation requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    #[default]
    Json,
    #[serde(rename = "arraybuffer")]
    ArrayBuffer,
    Blob,
    Document,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response body as the transport produced it, before the caller's
/// transform runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Text(String),
    /// Already decoded by a transport that honours the `json` response type.
    Json(serde_json::Value),
    Binary(Vec<u8>),
}

impl RawResponse {
    /// Mirrors the falsy check browser callers apply: no body, an empty
    /// string, an empty buffer or a JSON `null` all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            RawResponse::Text(text) => text.is_empty(),
            RawResponse::Json(value) => value.is_null(),
            RawResponse::Binary(bytes) => bytes.is_empty(),
        }
    }
}

impl Default for RawResponse {
    fn default() -> Self {
        RawResponse::Text(String::new())
    }
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawResponse::Text(text) => f.write_str(text),
            RawResponse::Json(value) => write!(f, "{value}"),
            RawResponse::Binary(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}
