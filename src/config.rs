//! Request configuration and merge semantics.
//!
//! A [`RequestOptions`] value is both the base configuration a client is
//! created with and the per-call override shape. [`RequestOptions::merge`]
//! produces the effective configuration for one call: mapping-valued fields
//! merge key by key, array-valued fields are replaced wholesale, scalar
//! fields are replaced when the override sets them. The merge never shares
//! mutable nested structure with either input; the single exception is a
//! multipart body, whose `Arc` handle transfers by reference because the
//! payload is not safely duplicable.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HttpError, Result};
use crate::multipart::MultipartForm;

/// How the response body should be decoded.
///
/// The serialized names are part of the external contract: `json`, `text`,
/// `arrayBuffer`, `blob`, `bytes`, `formData`, `stream`, `original`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "arrayBuffer")]
    ArrayBuffer,
    #[serde(rename = "blob")]
    Blob,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "formData")]
    FormData,
    /// Hand the raw body stream through without buffering.
    #[serde(rename = "stream")]
    Stream,
    /// Decode by content-type sniffing, as if no type were set.
    #[serde(rename = "original")]
    Original,
}

impl ResponseType {
    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::ArrayBuffer => "arrayBuffer",
            Self::Blob => "blob",
            Self::Bytes => "bytes",
            Self::FormData => "formData",
            Self::Stream => "stream",
            Self::Original => "original",
        }
    }
}

impl FromStr for ResponseType {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "arrayBuffer" => Ok(Self::ArrayBuffer),
            "blob" => Ok(Self::Blob),
            "bytes" => Ok(Self::Bytes),
            "formData" => Ok(Self::FormData),
            "stream" => Ok(Self::Stream),
            "original" => Ok(Self::Original),
            other => Err(HttpError::config(format!("unsupported responseType: {other}"))),
        }
    }
}

/// Credential mode passed through to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    SameOrigin,
    Include,
}

/// Cache mode passed through to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

/// Request payload.
#[derive(Debug, Clone)]
pub enum Body {
    /// Serialized as compact JSON at finalization.
    Json(Value),
    /// Sent verbatim.
    Text(String),
    /// Pre-encoded `application/x-www-form-urlencoded` payload.
    Form(String),
    /// Multipart payload, carried by reference.
    Multipart(Arc<MultipartForm>),
}

impl Body {
    /// JSON payload from any serializable value.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|err| HttpError::config(format!("failed to serialize JSON body: {err}")))
    }

    /// Urlencoded form payload from any serializable value.
    pub fn form<T: Serialize>(value: &T) -> Result<Self> {
        serde_urlencoded::to_string(value)
            .map(Body::Form)
            .map_err(|err| HttpError::config(format!("failed to encode form body: {err}")))
    }

    /// Multipart payload.
    pub fn multipart(form: MultipartForm) -> Self {
        Body::Multipart(Arc::new(form))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Arc<MultipartForm>> for Body {
    fn from(form: Arc<MultipartForm>) -> Self {
        Body::Multipart(form)
    }
}

impl From<MultipartForm> for Body {
    fn from(form: MultipartForm) -> Self {
        Body::multipart(form)
    }
}

/// Retry marker accompanying a request through rejection handlers.
///
/// The pipeline never caps or increments this itself: rejection handlers
/// that resubmit a request bump `attempts` on the configuration they
/// resubmit, and use it to stop their own loops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryContext {
    /// Resubmissions performed so far for this logical request.
    pub attempts: u32,
}

impl RetryContext {
    /// True once a rejection handler has resubmitted this request.
    pub fn is_retry(&self) -> bool {
        self.attempts > 0
    }
}

/// Base configuration and per-call override shape.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Prefix joined with relative request urls.
    pub base_url: Option<String>,
    /// Default headers.
    pub headers: HeaderMap,
    /// Query parameters; values may be scalars or arrays of scalars.
    pub params: BTreeMap<String, Value>,
    /// Request payload.
    pub body: Option<Body>,
    /// Explicit response decode strategy.
    pub response_type: Option<ResponseType>,
    /// Transport passthrough: credential mode.
    pub credentials: Option<Credentials>,
    /// Transport passthrough: cache mode.
    pub cache: Option<CacheMode>,
    /// Transport passthrough: overall deadline for the transport call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base url.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Extend with a prepared header map.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the payload.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the response decode strategy.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Set the credential mode.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the cache mode.
    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the transport deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a bearer `Authorization` header.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.header(header::AUTHORIZATION.as_str(), format!("Bearer {}", token.into()))
    }

    /// Set a basic `Authorization` header.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        let credentials = match password {
            Some(password) => format!("{}:{}", username.into(), password.into()),
            None => format!("{}:", username.into()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header(header::AUTHORIZATION.as_str(), format!("Basic {encoded}"))
    }

    /// Merge an override onto a base, producing the effective options.
    ///
    /// Neither input is modified and the result shares no mutable nested
    /// structure with either, except multipart bodies which transfer by
    /// `Arc` handle.
    pub fn merge(base: &Self, overlay: &Self) -> Self {
        let mut headers = base.headers.clone();
        for key in overlay.headers.keys() {
            headers.remove(key);
        }
        for (key, value) in overlay.headers.iter() {
            headers.append(key.clone(), value.clone());
        }

        let mut params = base.params.clone();
        params.extend(overlay.params.iter().map(|(k, v)| (k.clone(), v.clone())));

        let body = match (&base.body, &overlay.body) {
            (Some(Body::Json(base_value)), Some(Body::Json(overlay_value))) => {
                Some(Body::Json(merge_json_values(base_value, overlay_value)))
            }
            (_, Some(overlay_body)) => Some(overlay_body.clone()),
            (Some(base_body), None) => Some(base_body.clone()),
            (None, None) => None,
        };

        Self {
            base_url: overlay.base_url.clone().or_else(|| base.base_url.clone()),
            headers,
            params,
            body,
            response_type: overlay.response_type.or(base.response_type),
            credentials: overlay.credentials.or(base.credentials),
            cache: overlay.cache.or(base.cache),
            timeout: overlay.timeout.or(base.timeout),
        }
    }
}

/// Deep-merge two JSON values: objects merge per key, everything else
/// (arrays included) is replaced by the overlay.
pub(crate) fn merge_json_values(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let next = match merged.get(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        merge_json_values(base_value, overlay_value)
                    }
                    _ => overlay_value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

/// Configuration for one call: a method and url over [`RequestOptions`].
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub url: String,
    pub options: RequestOptions,
    /// Retry marker, preserved across resubmission by rejection handlers.
    pub retry: RetryContext,
}

impl RequestConfig {
    /// New configuration with empty options.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            options: RequestOptions::default(),
            retry: RetryContext::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Merge a base configuration under this call's options.
    pub fn with_defaults(mut self, defaults: &RequestOptions) -> Self {
        self.options = RequestOptions::merge(defaults, &self.options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_scalars_and_maps() {
        let base = RequestOptions::new()
            .base_url("https://api.example.com")
            .header("Content-Type", "application/json")
            .param("page", 1);
        let overlay = RequestOptions::new()
            .header("Authorization", "Bearer token")
            .param("page", 2)
            .param("sort", "desc");

        let merged = RequestOptions::merge(&base, &overlay);

        assert_eq!(merged.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(
            merged.headers.get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(
            merged.headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer token")
        );
        assert_eq!(merged.params.get("page"), Some(&json!(2)));
        assert_eq!(merged.params.get("sort"), Some(&json!("desc")));

        // Inputs are untouched.
        assert_eq!(base.params.get("page"), Some(&json!(1)));
        assert!(base.headers.get("authorization").is_none());
        assert!(overlay.base_url.is_none());
    }

    #[test]
    fn test_merge_replaces_arrays_wholesale() {
        let base = RequestOptions::new().param("tags", json!(["a", "b"]));
        let overlay = RequestOptions::new().param("tags", json!(["c"]));

        let merged = RequestOptions::merge(&base, &overlay);

        assert_eq!(merged.params.get("tags"), Some(&json!(["c"])));
        assert_eq!(base.params.get("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_merge_json_bodies_deeply() {
        let base = RequestOptions::new().body(json!({"a": {"b": 1}, "keep": true}));
        let overlay = RequestOptions::new().body(json!({"a": {"c": 2}, "list": [3, 4]}));

        let merged = RequestOptions::merge(&base, &overlay);

        let Some(Body::Json(value)) = merged.body else {
            panic!("expected JSON body");
        };
        assert_eq!(
            value,
            json!({"a": {"b": 1, "c": 2}, "keep": true, "list": [3, 4]})
        );
    }

    #[test]
    fn test_merge_json_arrays_replaced_not_concatenated() {
        let merged = merge_json_values(&json!({"a": [1, 2]}), &json!({"a": [3]}));
        assert_eq!(merged, json!({"a": [3]}));
    }

    #[test]
    fn test_multipart_body_transfers_by_reference() {
        let form = Arc::new(MultipartForm::new().text("field", "value"));
        let base = RequestOptions::new();
        let overlay = RequestOptions::new().body(Arc::clone(&form));

        let merged = RequestOptions::merge(&base, &overlay);

        let Some(Body::Multipart(merged_form)) = merged.body else {
            panic!("expected multipart body");
        };
        assert!(Arc::ptr_eq(&merged_form, &form));
    }

    #[test]
    fn test_override_body_replaces_mismatched_kind() {
        let base = RequestOptions::new().body(json!({"a": 1}));
        let overlay = RequestOptions::new().body("raw text");

        let merged = RequestOptions::merge(&base, &overlay);
        assert!(matches!(merged.body, Some(Body::Text(ref s)) if s == "raw text"));
    }

    #[test]
    fn test_with_defaults_merges_under_call_options() {
        let defaults = RequestOptions::new()
            .base_url("https://api.example.com")
            .header("X-App", "courier");
        let config = RequestConfig::new(Method::POST, "/create")
            .with_options(RequestOptions::new().header("X-Call", "1"))
            .with_defaults(&defaults);

        assert_eq!(config.options.base_url.as_deref(), Some("https://api.example.com"));
        assert!(config.options.headers.contains_key("x-app"));
        assert!(config.options.headers.contains_key("x-call"));
    }

    #[test]
    fn test_response_type_wire_names() {
        assert_eq!(ResponseType::ArrayBuffer.as_str(), "arrayBuffer");
        assert_eq!(ResponseType::FormData.as_str(), "formData");
        assert_eq!("bytes".parse::<ResponseType>().unwrap(), ResponseType::Bytes);
        assert!("document".parse::<ResponseType>().is_err());
        assert_eq!(
            serde_json::to_string(&ResponseType::ArrayBuffer).unwrap(),
            "\"arrayBuffer\""
        );
    }
}
