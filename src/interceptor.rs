//! Interceptor chains and the recovery model.
//!
//! Each pipeline client owns two named chains: a request chain transforming
//! the resolved configuration before dispatch, and a response chain
//! transforming the response after it. Every entry is keyed by a
//! caller-chosen string and pairs an optional fulfillment handler with an
//! optional rejection handler; entries execute in registration order.
//!
//! Handler lists are snapshotted at the start of each phase, so ejecting or
//! clearing a chain while a call is mid-flight never affects that call.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::trace;

use crate::config::RequestConfig;
use crate::error::{HttpError, Result};
use crate::response::Response;

/// Success-path handler: receives the previous handler's output and
/// produces the next value.
pub type FulfilledHandler<T> =
    Arc<dyn Fn(T) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Failure-path handler: receives the current error and may recover.
pub type RejectedHandler =
    Arc<dyn Fn(HttpError) -> BoxFuture<'static, Result<Recovery>> + Send + Sync>;

/// Outcome of a rejection handler.
pub enum Recovery {
    /// Recovered: this response becomes the pipeline's successful result
    /// and no further rejection handlers run.
    Resolved(Response),
    /// Not recovered: the (possibly updated) error continues to the next
    /// rejection handler.
    Unhandled(HttpError),
}

/// Wrap an async closure into a [`FulfilledHandler`].
pub fn fulfilled<T, F, Fut>(handler: F) -> FulfilledHandler<T>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move |value| Box::pin(handler(value)))
}

/// Wrap an async closure into a [`RejectedHandler`].
pub fn rejected<F, Fut>(handler: F) -> RejectedHandler
where
    F: Fn(HttpError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Recovery>> + Send + 'static,
{
    Arc::new(move |error| Box::pin(handler(error)))
}

struct Entry<T> {
    key: String,
    on_fulfilled: Option<FulfilledHandler<T>>,
    on_rejected: Option<RejectedHandler>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            on_fulfilled: self.on_fulfilled.clone(),
            on_rejected: self.on_rejected.clone(),
        }
    }
}

/// One ordered, string-keyed chain of interceptor entries.
pub struct InterceptorChain<T> {
    name: &'static str,
    entries: RwLock<Vec<Entry<T>>>,
}

impl<T> InterceptorChain<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a paired entry under `key`.
    ///
    /// A key already present on this chain is a configuration error and
    /// leaves the existing registration untouched. Registering with neither
    /// handler is a tolerated no-op, so conditional wiring does not need
    /// its own branching.
    pub fn register(
        &self,
        key: impl Into<String>,
        on_fulfilled: Option<FulfilledHandler<T>>,
        on_rejected: Option<RejectedHandler>,
    ) -> Result<()> {
        if on_fulfilled.is_none() && on_rejected.is_none() {
            return Ok(());
        }

        let key = key.into();
        let mut entries = self.entries.write();
        if entries.iter().any(|entry| entry.key == key) {
            return Err(HttpError::config(format!(
                "interceptor `{key}` is already registered on the {} chain",
                self.name
            )));
        }

        trace!(chain = self.name, key = %key, "registered interceptor");
        entries.push(Entry {
            key,
            on_fulfilled,
            on_rejected,
        });
        Ok(())
    }

    /// Register a fulfillment-only entry from an async closure.
    pub fn on_fulfilled<F, Fut>(&self, key: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.register(key, Some(fulfilled(handler)), None)
    }

    /// Register a rejection-only entry from an async closure.
    pub fn on_rejected<F, Fut>(&self, key: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(HttpError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Recovery>> + Send + 'static,
    {
        self.register(key, None, Some(rejected(handler)))
    }

    /// Remove the entry under `key`. Returns whether an entry was removed;
    /// a missing key is not an error.
    pub fn eject(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        entries.len() != before
    }

    /// Remove all entries from this chain.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Registered keys, in execution order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().iter().map(|entry| entry.key.clone()).collect()
    }

    /// True when `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().iter().any(|entry| entry.key == key)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub(crate) fn fulfilled_snapshot(&self) -> Vec<FulfilledHandler<T>> {
        self.entries
            .read()
            .iter()
            .filter_map(|entry| entry.on_fulfilled.clone())
            .collect()
    }

    pub(crate) fn rejected_snapshot(&self) -> Vec<RejectedHandler> {
        self.entries
            .read()
            .iter()
            .filter_map(|entry| entry.on_rejected.clone())
            .collect()
    }
}

/// The two chains of a pipeline client. Independent: clearing one never
/// affects the other.
pub struct Interceptors {
    pub request: InterceptorChain<RequestConfig>,
    pub response: InterceptorChain<Response>,
}

impl Interceptors {
    pub(crate) fn new() -> Self {
        Self {
            request: InterceptorChain::new("request"),
            response: InterceptorChain::new("response"),
        }
    }
}

/// Fold a value through fulfillment handlers, strictly in sequence: each
/// handler's asynchronous work completes before the next begins, because
/// later handlers operate on the prior handler's output.
pub(crate) async fn run_fulfilled<T>(
    handlers: Vec<FulfilledHandler<T>>,
    mut value: T,
) -> Result<T> {
    for handler in handlers {
        value = handler(value).await?;
    }
    Ok(value)
}

/// Offer an error to rejection handlers in order. A resolved recovery
/// short-circuits the rest; a handler that itself fails aborts immediately;
/// exhaustion re-raises the error as last threaded through the handlers.
pub(crate) async fn run_rejected(
    handlers: Vec<RejectedHandler>,
    mut error: HttpError,
) -> Result<Response> {
    for handler in handlers {
        match handler(error).await? {
            Recovery::Resolved(response) => {
                trace!("rejection handler recovered");
                return Ok(response);
            }
            Recovery::Unhandled(next) => error = next,
        }
    }
    Err(error)
}
