//! Pipeline error types.

use http::StatusCode;
use thiserror::Error;

use crate::config::RequestConfig;
use crate::request::Request;
use crate::response::Response;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Error class, used to decide recovery eligibility and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure (connection refused, DNS, timeout, abort).
    /// No response exists.
    Transport,
    /// The server answered with a non-success status. A response is attached.
    Status,
    /// An explicitly requested decode strategy failed on the response body.
    Decode,
    /// Programmer error (duplicate interceptor key, unserializable body).
    /// Raised at the point of misuse, never routed through rejection chains.
    Config,
}

/// The pipeline's typed error, carrying the configuration, the finalized
/// request, and (when the server answered) the response that produced it.
///
/// `config` is context for inspection and is not meant to be mutated further;
/// `request` and the `retry` marker on `config` may be updated by rejection
/// handlers before resubmission (e.g. a silent token refresh).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    /// Human-readable failure description.
    pub message: String,
    /// Error class.
    pub kind: ErrorKind,
    /// Configuration the failing call was resolved from.
    pub config: Option<RequestConfig>,
    /// Finalized request, when one was built before the failure.
    pub request: Option<Request>,
    /// Response, present only for non-success statuses.
    pub response: Option<Response>,
}

impl HttpError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            config: None,
            request: None,
            response: None,
        }
    }

    /// Transport-level failure, raised before any response exists.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Explicit response decode failure.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Configuration misuse.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// HTTP-level failure for a non-success status.
    pub fn status(
        message: impl Into<String>,
        config: RequestConfig,
        request: Request,
        response: Response,
    ) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Status,
            config: Some(config),
            request: Some(request),
            response: Some(response),
        }
    }

    /// Attach the originating configuration and request, keeping any
    /// context already present.
    pub fn with_context(mut self, config: RequestConfig, request: Request) -> Self {
        if self.config.is_none() {
            self.config = Some(config);
        }
        if self.request.is_none() {
            self.request = Some(request);
        }
        self
    }

    /// Attach the originating configuration when none is present.
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        if self.config.is_none() {
            self.config = Some(config);
        }
        self
    }

    /// True for transport-level failures.
    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    /// True when the server answered with a non-success status.
    pub fn is_status(&self) -> bool {
        self.kind == ErrorKind::Status
    }

    /// True for decode failures of an explicit response type.
    pub fn is_decode(&self) -> bool {
        self.kind == ErrorKind::Decode
    }

    /// True for configuration misuse.
    pub fn is_config(&self) -> bool {
        self.kind == ErrorKind::Config
    }

    /// Status code of the attached response, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|response| response.status)
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("JSON error: {err}"))
    }
}

impl From<http::header::InvalidHeaderValue> for HttpError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::config(format!("invalid header value: {err}"))
    }
}

impl From<http::header::InvalidHeaderName> for HttpError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::config(format!("invalid header name: {err}"))
    }
}

/// Type guard: is this one of our pipeline errors?
///
/// Useful when the error has been boxed into `dyn Error` by application
/// code and recovery logic needs the full pipeline shape back.
pub fn is_http_error(error: &(dyn std::error::Error + 'static)) -> bool {
    error.downcast_ref::<HttpError>().is_some()
}
