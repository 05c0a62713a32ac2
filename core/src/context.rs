//! Caller-supplied hooks that travel with a request.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::RequestConfig;
use crate::error::TransformError;
use crate::http::RawResponse;

/// Runs right before `send`, with the final configuration.
pub type BeforeRequestHook = Arc<dyn Fn(&mut RequestConfig) + Send + Sync>;

/// Turns a raw response body into the caller's value.
pub struct ResponseTransform<T>(Arc<dyn Fn(RawResponse) -> Result<T, TransformError> + Send + Sync>);

impl<T> ResponseTransform<T> {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(RawResponse) -> Result<T, TransformError> + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    pub fn apply(&self, raw: RawResponse) -> Result<T, TransformError> {
        (self.0)(raw)
    }
}

impl<T: DeserializeOwned> ResponseTransform<T> {
    /// Parse the body as JSON, whether the transport already decoded it or
    /// handed back text or bytes.
    pub fn json() -> Self {
        Self::new(|raw| match raw {
            RawResponse::Json(value) => serde_json::from_value(value).map_err(Into::into),
            RawResponse::Text(text) => serde_json::from_str(&text).map_err(Into::into),
            RawResponse::Binary(bytes) => serde_json::from_slice(&bytes).map_err(Into::into),
        })
    }
}

impl ResponseTransform<String> {
    pub fn text() -> Self {
        Self::new(|raw| Ok(raw.to_string()))
    }
}

impl<T> Clone for ResponseTransform<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for ResponseTransform<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseTransform")
    }
}

/// Hooks for one request.
pub struct RequestContext<T> {
    pub on_before_request: Option<BeforeRequestHook>,
    pub response_transform: ResponseTransform<T>,
}

impl<T> RequestContext<T> {
    pub fn new(response_transform: ResponseTransform<T>) -> Self {
        Self {
            on_before_request: None,
            response_transform,
        }
    }

    pub fn on_before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RequestConfig) + Send + Sync + 'static,
    {
        self.on_before_request = Some(Arc::new(hook));
        self
    }
}

impl<T> Clone for RequestContext<T> {
    fn clone(&self) -> Self {
        Self {
            on_before_request: self.on_before_request.clone(),
            response_transform: self.response_transform.clone(),
        }
    }
}

impl<T> fmt::Debug for RequestContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("on_before_request", &self.on_before_request.is_some())
            .field("response_transform", &self.response_transform)
            .finish()
    }
}
