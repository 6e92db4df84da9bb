//! Decoded response model.

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::RequestConfig;
use crate::error::{HttpError, Result};
use crate::request::Request;
use crate::transport::BodyStream;

/// A binary body with its advertised content type.
#[derive(Debug, Clone)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Decoded response payload, typed by the explicit response type or by
/// content-type sniffing.
pub enum ResponseData {
    Json(Value),
    Text(String),
    Bytes(Bytes),
    Blob(Blob),
    /// Urlencoded pairs, in body order.
    Form(Vec<(String, String)>),
    /// The raw body handle, unbuffered.
    Stream(BodyStream),
    /// Sniffed decoding failed; a decode problem never masks a completed
    /// transport result.
    None,
}

impl ResponseData {
    /// True when decoding yielded no data.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Blob(blob) => f.debug_tuple("Blob").field(&blob.content_type).finish(),
            Self::Form(pairs) => f.debug_tuple("Form").field(pairs).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::None => f.write_str("None"),
        }
    }
}

/// One completed transport call.
///
/// Interceptors receive a `Response` by value and pass a (possibly new)
/// value downstream; a response is never mutated in place across handler
/// boundaries.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub data: ResponseData,
    /// Configuration this response was produced from.
    pub config: RequestConfig,
    /// Finalized request that produced this response.
    pub request: Request,
}

impl Response {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get a header value as a string.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get(name.as_ref()).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the decoded data as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            ResponseData::Json(value) => Ok(serde_json::from_value(value.clone())?),
            ResponseData::Text(text) => Ok(serde_json::from_str(text)?),
            ResponseData::Bytes(bytes) => Ok(serde_json::from_slice(bytes)?),
            ResponseData::Blob(blob) => Ok(serde_json::from_slice(&blob.bytes)?),
            _ => Err(HttpError::decode("response data is not decodable as JSON")),
        }
    }

    /// Text payload, when the data decoded as text.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Binary payload, when the data decoded as bytes or a blob.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.data {
            ResponseData::Bytes(bytes) => Some(bytes),
            ResponseData::Blob(blob) => Some(&blob.bytes),
            _ => None,
        }
    }

    /// Take the raw body stream, when the `stream` response type was used.
    pub fn into_stream(self) -> Option<BodyStream> {
        match self.data {
            ResponseData::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// `message` field of a JSON body, used for error messages.
    pub(crate) fn error_message(&self) -> Option<String> {
        match &self.data {
            ResponseData::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}
