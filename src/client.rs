//! Client facades.
//!
//! [`HttpClient`] is the simple pass-through: resolve the configuration and
//! dispatch, no interceptor chains. [`PipelineClient`] runs the full
//! pipeline: request-phase handlers, dispatch, response-phase handlers, and
//! rejection handlers with recovery.

use std::sync::Arc;

use http::Method;

use crate::config::{Body, RequestConfig, RequestOptions};
use crate::error::Result;
use crate::interceptor::{Interceptors, run_fulfilled, run_rejected};
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport, dispatch};

/// Simple facade: base configuration merged with per-call overrides,
/// straight through the transport.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    defaults: Arc<RequestOptions>,
}

impl HttpClient {
    /// Client over the default reqwest transport.
    pub fn new(defaults: RequestOptions) -> Self {
        Self::with_transport(defaults, Arc::new(ReqwestTransport::new()))
    }

    /// Client over a caller-provided transport.
    pub fn with_transport(defaults: RequestOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            defaults: Arc::new(defaults),
        }
    }

    /// The base configuration.
    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Run one configured request.
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        dispatch(self.transport.as_ref(), config.with_defaults(&self.defaults)).await
    }

    /// GET `url`.
    pub async fn get(&self, url: impl Into<String>, options: RequestOptions) -> Result<Response> {
        self.request(RequestConfig::new(Method::GET, url).with_options(options))
            .await
    }

    /// POST `url` with an optional payload. An explicit body in `options`
    /// takes precedence.
    pub async fn post(
        &self,
        url: impl Into<String>,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(verb_config(Method::POST, url, body, options))
            .await
    }

    /// PUT `url` with an optional payload.
    pub async fn put(
        &self,
        url: impl Into<String>,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(verb_config(Method::PUT, url, body, options))
            .await
    }

    /// PATCH `url` with an optional payload.
    pub async fn patch(
        &self,
        url: impl Into<String>,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(verb_config(Method::PATCH, url, body, options))
            .await
    }

    /// DELETE `url`.
    pub async fn delete(&self, url: impl Into<String>, options: RequestOptions) -> Result<Response> {
        self.request(RequestConfig::new(Method::DELETE, url).with_options(options))
            .await
    }
}

fn verb_config(
    method: Method,
    url: impl Into<String>,
    body: Option<Body>,
    mut options: RequestOptions,
) -> RequestConfig {
    if options.body.is_none() {
        options.body = body;
    }
    RequestConfig::new(method, url).with_options(options)
}

/// Full pipeline facade with interceptor chains.
#[derive(Clone)]
pub struct PipelineClient {
    transport: Arc<dyn Transport>,
    defaults: Arc<RequestOptions>,
    interceptors: Arc<Interceptors>,
}

impl PipelineClient {
    /// Pipeline client over the default reqwest transport.
    pub fn new(defaults: RequestOptions) -> Self {
        Self::with_transport(defaults, Arc::new(ReqwestTransport::new()))
    }

    /// Pipeline client over a caller-provided transport.
    pub fn with_transport(defaults: RequestOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            defaults: Arc::new(defaults),
            interceptors: Arc::new(Interceptors::new()),
        }
    }

    /// The base configuration.
    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Management surface for the request and response chains.
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Run one configured request through the pipeline.
    ///
    /// Request-phase handler failures are offered to the request chain's
    /// rejection handlers; dispatch and response-phase failures to the
    /// response chain's. A recovered value becomes the successful result,
    /// indistinguishable to the caller from the non-error path.
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        let merged = config.with_defaults(&self.defaults);
        let fallback = merged.clone();

        let config = match run_fulfilled(
            self.interceptors.request.fulfilled_snapshot(),
            merged,
        )
        .await
        {
            Ok(config) => config,
            Err(error) => {
                return run_rejected(
                    self.interceptors.request.rejected_snapshot(),
                    error.with_config(fallback),
                )
                .await;
            }
        };

        let outcome = match dispatch(self.transport.as_ref(), config).await {
            Ok(response) => {
                run_fulfilled(self.interceptors.response.fulfilled_snapshot(), response).await
            }
            Err(error) => Err(error),
        };

        match outcome {
            Ok(response) => Ok(response),
            Err(error) => {
                run_rejected(self.interceptors.response.rejected_snapshot(), error).await
            }
        }
    }

    /// GET `url`.
    pub async fn get(&self, url: impl Into<String>, options: RequestOptions) -> Result<Response> {
        self.request(RequestConfig::new(Method::GET, url).with_options(options))
            .await
    }

    /// POST `url` with an optional payload. An explicit body in `options`
    /// takes precedence.
    pub async fn post(
        &self,
        url: impl Into<String>,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(verb_config(Method::POST, url, body, options))
            .await
    }

    /// PUT `url` with an optional payload.
    pub async fn put(
        &self,
        url: impl Into<String>,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(verb_config(Method::PUT, url, body, options))
            .await
    }

    /// PATCH `url` with an optional payload.
    pub async fn patch(
        &self,
        url: impl Into<String>,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(verb_config(Method::PATCH, url, body, options))
            .await
    }

    /// DELETE `url`.
    pub async fn delete(&self, url: impl Into<String>, options: RequestOptions) -> Result<Response> {
        self.request(RequestConfig::new(Method::DELETE, url).with_options(options))
            .await
    }
}
