//! Request configuration and the merge of caller overrides onto defaults.
//!
//! # Design
//! `ConfigOverrides` is the partial configuration a caller hands in, either
//! built in code or deserialized from a JSON-style option map using the
//! browser option names (`crossDomain`, `withCredentials`, ...). Unknown
//! option names are rejected at deserialization time instead of being copied
//! through. `RequestConfig::merge` replaces each default with the override
//! when one is present; `headers` is replaced as a whole, never merged.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::http::{HttpMethod, ResponseType};

pub const DEFAULT_METHOD: HttpMethod = HttpMethod::Get;
pub const DEFAULT_CROSS_DOMAIN: bool = false;
pub const DEFAULT_ASYNC: bool = true;
pub const DEFAULT_RESPONSE_TYPE: ResponseType = ResponseType::Json;
pub const DEFAULT_WITH_CREDENTIALS: bool = true;

/// Header marking a request as issued by script rather than navigation.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// Fully-populated configuration for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: HttpMethod,
    pub url: String,
    pub cross_domain: bool,
    pub asynchronous: bool,
    pub headers: BTreeMap<String, String>,
    pub response_type: ResponseType,
    pub timeout: Option<Duration>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub data: Option<String>,
    pub with_credentials: bool,
}

impl RequestConfig {
    /// Apply `overrides` on top of the defaults.
    pub fn merge(overrides: ConfigOverrides) -> Self {
        Self {
            method: overrides.method.unwrap_or(DEFAULT_METHOD),
            url: overrides.url,
            cross_domain: overrides.cross_domain.unwrap_or(DEFAULT_CROSS_DOMAIN),
            asynchronous: overrides.asynchronous.unwrap_or(DEFAULT_ASYNC),
            headers: overrides.headers.unwrap_or_default(),
            response_type: overrides.response_type.unwrap_or(DEFAULT_RESPONSE_TYPE),
            timeout: overrides.timeout,
            user: overrides.user,
            password: overrides.password,
            data: overrides.data,
            // Anything but an explicit `false` sends credentials.
            with_credentials: overrides
                .with_credentials
                .unwrap_or(DEFAULT_WITH_CREDENTIALS),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Caller-supplied partial configuration.
///
/// Only `url` is required. Every other field left as `None` falls back to the
/// default in [`RequestConfig::merge`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub method: Option<HttpMethod>,
    pub url: String,
    pub cross_domain: Option<bool>,
    #[serde(rename = "async")]
    pub asynchronous: Option<bool>,
    pub headers: Option<BTreeMap<String, String>>,
    pub response_type: Option<ResponseType>,
    /// Milliseconds when deserialized.
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub timeout: Option<Duration>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub data: Option<String>,
    pub with_credentials: Option<bool>,
}

impl ConfigOverrides {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: None,
            url: url.into(),
            cross_domain: None,
            asynchronous: None,
            headers: None,
            response_type: None,
            timeout: None,
            user: None,
            password: None,
            data: None,
            with_credentials: None,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn cross_domain(mut self, cross_domain: bool) -> Self {
        self.cross_domain = Some(cross_domain);
        self
    }

    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = Some(asynchronous);
        self
    }

    /// Add one header, creating the header map on first use.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
