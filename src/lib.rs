//! # Courier
//!
//! A configurable HTTP request client with a layered interceptor pipeline.
//!
//! ## Features
//!
//! - **Layered configuration**: client-wide defaults deep-merged with
//!   per-call overrides
//! - **Interceptor chains**: ordered, string-keyed request and response
//!   handlers with ejection and recovery
//! - **Error recovery**: rejection handlers can resolve an error into a
//!   successful response, including re-submitting the request
//! - **Content-aware decoding**: explicit response types or content-type
//!   sniffing, with unbuffered streaming on demand
//! - **Pluggable transport**: reqwest by default, any [`Transport`] impl
//!   for testing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier::{HttpClient, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(
//!         RequestOptions::new().base_url("https://api.example.com"),
//!     );
//!
//!     let response = client.get("/users", RequestOptions::new()).await?;
//!     let users: serde_json::Value = response.json()?;
//!
//!     println!("Status: {}", response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## With Interceptors
//!
//! ```rust,no_run
//! use courier::{PipelineClient, Recovery, RequestConfig, RequestOptions};
//! use courier::{HeaderValue, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PipelineClient::new(
//!         RequestOptions::new().base_url("https://api.example.com"),
//!     );
//!
//!     client.interceptors().request.on_fulfilled(
//!         "auth",
//!         |mut config: RequestConfig| async move {
//!             config.options.headers.insert(
//!                 "authorization",
//!                 HeaderValue::from_static("Bearer token"),
//!             );
//!             Ok(config)
//!         },
//!     )?;
//!
//!     let retry = client.clone();
//!     client.interceptors().response.on_rejected("refresh", move |error| {
//!         let client = retry.clone();
//!         async move {
//!             match error.config.clone() {
//!                 Some(mut config)
//!                     if error.status_code() == Some(StatusCode::UNAUTHORIZED)
//!                         && !config.retry.is_retry() =>
//!                 {
//!                     config.retry.attempts += 1;
//!                     Ok(Recovery::Resolved(client.request(config).await?))
//!                 }
//!                 _ => Ok(Recovery::Unhandled(error)),
//!             }
//!         }
//!     })?;
//!
//!     let response = client.get("/users/profile", RequestOptions::new()).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod codec;
mod config;
mod error;
mod interceptor;
mod multipart;
mod request;
mod response;
mod transport;

pub use client::{HttpClient, PipelineClient};
pub use config::{
    Body, CacheMode, Credentials, RequestConfig, RequestOptions, ResponseType, RetryContext,
};
pub use error::{ErrorKind, HttpError, Result, is_http_error};
pub use interceptor::{
    FulfilledHandler, InterceptorChain, Interceptors, Recovery, RejectedHandler, fulfilled,
    rejected,
};
pub use multipart::{MultipartForm, Part};
pub use request::{Request, TransportBody};
pub use response::{Blob, Response, ResponseData};
pub use transport::{BodyStream, RawResponse, ReqwestTransport, Transport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};

/// Prelude for common imports.
///
/// ```
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{HttpClient, PipelineClient};
    pub use crate::config::{
        Body, CacheMode, Credentials, RequestConfig, RequestOptions, ResponseType,
    };
    pub use crate::error::{ErrorKind, HttpError, Result};
    pub use crate::interceptor::{Interceptors, Recovery};
    pub use crate::multipart::{MultipartForm, Part};
    pub use crate::response::{Response, ResponseData};
    pub use crate::transport::Transport;
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
