//! Privilege middleware implementation for axum.
//!
//! This module provides the [`PrivilegeLayer`] and [`PrivilegeMiddleware`]
//! types that integrate with axum's middleware system.

use crate::error::{AccessDenied, AccessDeniedHandler, DefaultDeniedHandler, DenialReason};
use crate::extractor::{HeaderPrivilegeExtractor, PrivilegeExtractionResult, PrivilegeExtractor};
use crate::table::{Decision, PrivilegeTable, SharedPrivilegeTable};

use axum::response::Response;
use futures_util::future::BoxFuture;
use http::{Method, Request};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// State shared by every clone of the layer and its services.
struct MiddlewareState<E> {
    table: SharedPrivilegeTable,
    extractor: Arc<E>,
    denied_handler: Arc<dyn AccessDeniedHandler>,
}

// Manual Clone impl to avoid requiring E: Clone (it's behind Arc)
impl<E> Clone for MiddlewareState<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            extractor: self.extractor.clone(),
            denied_handler: self.denied_handler.clone(),
        }
    }
}

/// A Tower layer that enforces endpoint privileges.
///
/// # Example
/// ```no_run
/// use axum::{Router, routing::post};
/// use axum_privileges::{PrivilegeLayer, PrivilegeTable};
/// use http::Method;
///
/// async fn create_icon() -> &'static str {
///     "created"
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let table = PrivilegeTable::builder()
///         .add("^/icon$", Method::POST, ["CREATE_ICON"])
///         .build()
///         .expect("privilege rules must compile");
///
///     let app = Router::new()
///         .route("/icon", post(create_icon))
///         .layer(PrivilegeLayer::new(table));
///
///     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
///     axum::serve(listener, app).await.unwrap();
/// }
/// ```
pub struct PrivilegeLayer<E> {
    state: MiddlewareState<E>,
}

impl<E> Clone for PrivilegeLayer<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl PrivilegeLayer<HeaderPrivilegeExtractor> {
    /// Create a new layer with the given table.
    ///
    /// Uses the default header extractor (`X-Privileges` header) and the
    /// default denied handler (plain text 401/403).
    pub fn new(table: PrivilegeTable) -> Self {
        Self::shared(SharedPrivilegeTable::new(table))
    }

    /// Create a new layer over a replaceable table.
    ///
    /// Tables installed later through the [`SharedPrivilegeTable`] apply to
    /// subsequent requests.
    pub fn shared(table: SharedPrivilegeTable) -> Self {
        Self {
            state: MiddlewareState {
                table,
                extractor: Arc::new(HeaderPrivilegeExtractor::default()),
                denied_handler: Arc::new(DefaultDeniedHandler),
            },
        }
    }
}

impl<E> PrivilegeLayer<E> {
    /// Use a custom privilege extractor.
    ///
    /// # Example
    /// ```
    /// use axum_privileges::{PrivilegeLayer, PrivilegeTable, HeaderPrivilegeExtractor};
    ///
    /// let layer = PrivilegeLayer::new(PrivilegeTable::new())
    ///     .with_extractor(HeaderPrivilegeExtractor::new("X-Session-Privileges"));
    /// ```
    pub fn with_extractor<E2>(self, extractor: E2) -> PrivilegeLayer<E2> {
        PrivilegeLayer {
            state: MiddlewareState {
                table: self.state.table,
                extractor: Arc::new(extractor),
                denied_handler: self.state.denied_handler,
            },
        }
    }

    /// Set a custom access denied handler.
    pub fn with_denied_handler(mut self, handler: impl AccessDeniedHandler + 'static) -> Self {
        self.state.denied_handler = Arc::new(handler);
        self
    }

    /// The table currently in effect.
    pub fn table(&self) -> Arc<PrivilegeTable> {
        self.state.table.snapshot()
    }

    /// The replaceable table handle, for reloads.
    pub fn shared_table(&self) -> &SharedPrivilegeTable {
        &self.state.table
    }
}

impl<S, E> Layer<S> for PrivilegeLayer<E> {
    type Service = PrivilegeMiddleware<S, E>;

    fn layer(&self, inner: S) -> Self::Service {
        PrivilegeMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

/// The privilege middleware service.
pub struct PrivilegeMiddleware<S, E> {
    inner: S,
    state: MiddlewareState<E>,
}

impl<S: Clone, E> Clone for PrivilegeMiddleware<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S, E, ReqBody> Service<Request<ReqBody>> for PrivilegeMiddleware<S, E>
where
    S: Service<Request<ReqBody>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    E: PrivilegeExtractor<ReqBody> + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let caller = match self.state.extractor.extract_privileges(&request) {
            PrivilegeExtractionResult::Error(e) => {
                tracing::warn!(
                    error = %e,
                    method = %method,
                    path = %path,
                    "Failed to extract caller privileges, treating as unauthenticated"
                );
                None
            }
            result => result.into_caller(),
        };

        // Evaluation is synchronous and pure; only the inner call is async.
        let table = self.state.table.snapshot();
        let mut required = table.required_privileges_for(&path, &method);
        // axum routes HEAD to GET handlers.
        if method == Method::HEAD {
            required.extend(table.required_privileges_for(&path, &Method::GET));
        }
        let reason = match PrivilegeTable::decide(&required, caller.as_ref()) {
            Decision::Allowed => {
                tracing::trace!(
                    method = %method,
                    path = %path,
                    required = ?required,
                    "Privilege check passed"
                );
                // Call the service that was driven to readiness.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                return Box::pin(async move { inner.call(request).await });
            }
            Decision::Unauthenticated => DenialReason::Unauthenticated,
            Decision::Forbidden => DenialReason::Forbidden,
        };

        tracing::info!(
            method = %method,
            path = %path,
            required = ?required,
            held = ?caller,
            reason = ?reason,
            "Privilege check denied request"
        );

        let denied = AccessDenied::new(reason, method, path, required);
        let response = self.state.denied_handler.handle(&denied);
        Box::pin(async move { Ok(response) })
    }
}
