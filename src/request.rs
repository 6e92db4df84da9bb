//! Finalized transport request.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderValue, Method, header};

use crate::codec::{resolve_body, resolve_params, resolve_url};
use crate::config::{Body, CacheMode, Credentials, RequestConfig, ResponseType};
use crate::multipart::MultipartForm;

/// Transport-ready payload.
#[derive(Debug, Clone)]
pub enum TransportBody {
    /// Serialized text (JSON, urlencoded form, or a raw string).
    Text(String),
    /// Multipart payload, identity preserved from the configuration.
    Multipart(Arc<MultipartForm>),
}

/// The configuration narrowed to exactly what the transport needs: the base
/// url and query parameters are folded into `url`, the payload is resolved.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<TransportBody>,
    pub response_type: Option<ResponseType>,
    pub credentials: Option<Credentials>,
    pub cache: Option<CacheMode>,
    pub timeout: Option<Duration>,
}

impl Request {
    /// Get a header value as a string.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get(name.as_ref()).and_then(|v| v.to_str().ok())
    }
}

impl RequestConfig {
    /// Build the finalized request from this configuration.
    ///
    /// For multipart payloads any configured `Content-Type` header is
    /// removed so the HTTP stack can set the boundary itself. Pre-encoded
    /// form payloads get a urlencoded `Content-Type` unless one is already
    /// set.
    pub fn finalize(&self) -> Request {
        let options = &self.options;
        let url = format!(
            "{}{}",
            resolve_url(options.base_url.as_deref(), &self.url),
            resolve_params(&options.params)
        );

        let body = resolve_body(options.body.as_ref());
        let mut headers = options.headers.clone();
        match &body {
            Some(TransportBody::Multipart(_)) => {
                headers.remove(header::CONTENT_TYPE);
            }
            Some(TransportBody::Text(_)) => {
                if matches!(options.body, Some(Body::Form(_)))
                    && !headers.contains_key(header::CONTENT_TYPE)
                {
                    headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/x-www-form-urlencoded"),
                    );
                }
            }
            None => {}
        }

        Request {
            method: self.method.clone(),
            url,
            headers,
            body,
            response_type: options.response_type,
            credentials: options.credentials,
            cache: options.cache,
            timeout: options.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestOptions;
    use serde_json::json;

    #[test]
    fn test_finalize_folds_base_and_params() {
        let config = RequestConfig::new(Method::GET, "/search").with_options(
            RequestOptions::new()
                .base_url("https://api.example.com")
                .param("q", "hello world"),
        );

        let request = config.finalize();
        assert_eq!(request.url, "https://api.example.com/search?q=hello%20world");
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn test_finalize_multipart_strips_content_type() {
        let config = RequestConfig::new(Method::POST, "/upload").with_options(
            RequestOptions::new()
                .header("Content-Type", "application/json")
                .body(MultipartForm::new().text("file", "data")),
        );

        let request = config.finalize();
        assert!(request.header("content-type").is_none());
        assert!(matches!(request.body, Some(TransportBody::Multipart(_))));
    }

    #[test]
    fn test_finalize_form_body_sets_content_type() {
        let body = Body::form(&[("a", "1"), ("b", "two")]).unwrap();
        let config = RequestConfig::new(Method::POST, "/submit")
            .with_options(RequestOptions::new().body(body));

        let request = config.finalize();
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        let Some(TransportBody::Text(text)) = request.body else {
            panic!("expected text body");
        };
        assert_eq!(text, "a=1&b=two");
    }

    #[test]
    fn test_finalize_json_body_serialized() {
        let config = RequestConfig::new(Method::POST, "/create")
            .with_options(RequestOptions::new().body(json!({"name": "Test"})));

        let request = config.finalize();
        let Some(TransportBody::Text(text)) = request.body else {
            panic!("expected text body");
        };
        assert_eq!(text, "{\"name\":\"Test\"}");
    }
}
