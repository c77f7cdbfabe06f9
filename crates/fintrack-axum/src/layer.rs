//! Tower middleware layer running the session gate.
//!
//! [`SessionLayer`] verifies the `Authorization` credential before the
//! inner service runs and stores the resulting identity in the request
//! extensions. Rejected requests never reach the handler.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::{IntoResponse, Response};
use fintrack_auth_core::{AuthError, SessionGate};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::context::AuthContextExt;
use crate::error::AuthRejection;

/// Configuration for the session layer.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Reject requests without a credential. When false such requests pass
    /// through anonymously; a credential that is present must still verify.
    pub require_auth: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

impl SessionConfig {
    /// Create a new config builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to require authentication.
    #[must_use]
    pub fn require_auth(mut self, require: bool) -> Self {
        self.require_auth = require;
        self
    }
}

/// Tower layer that authenticates requests with a [`SessionGate`].
#[derive(Debug, Clone)]
pub struct SessionLayer {
    gate: SessionGate,
    config: SessionConfig,
}

impl SessionLayer {
    /// Create a layer that requires authentication.
    #[must_use]
    pub fn new(gate: SessionGate) -> Self {
        Self {
            gate,
            config: SessionConfig::default(),
        }
    }

    /// Create a layer with custom configuration.
    #[must_use]
    pub fn with_config(gate: SessionGate, config: SessionConfig) -> Self {
        Self { gate, config }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            gate: self.gate.clone(),
            config: self.config.clone(),
        }
    }
}

/// The session-gate service.
#[derive(Debug, Clone)]
pub struct SessionService<S> {
    inner: S,
    gate: SessionGate,
    config: SessionConfig,
}

impl<S> SessionService<S> {
    fn authenticate(&self, req: &mut Request<Body>) -> Result<(), AuthError> {
        let authorization = match req.headers().get(header::AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
            None => None,
        };

        match self.gate.authenticate(authorization) {
            Ok(identity) => {
                req.extensions_mut().insert(AuthContextExt(identity));
                Ok(())
            }
            Err(AuthError::MissingCredential) if !self.config.require_auth => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl<S> Service<Request<Body>> for SessionService<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = SessionFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        match self.authenticate(&mut req) {
            Ok(()) => SessionFuture::Calling {
                future: self.inner.call(req),
            },
            Err(err) => {
                tracing::debug!(
                    path = %req.uri().path(),
                    code = err.error_code(),
                    "Session gate rejected request"
                );
                SessionFuture::Rejected {
                    response: Some(AuthRejection::new(err).into_response()),
                }
            }
        }
    }
}

pin_project! {
    /// Future for the session service.
    #[project = SessionFutureProj]
    pub enum SessionFuture<F> {
        Rejected {
            response: Option<Response>,
        },
        Calling {
            #[pin]
            future: F,
        },
    }
}

impl<F, E> Future for SessionFuture<F>
where
    F: Future<Output = Result<Response, E>>,
{
    type Output = Result<Response, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            SessionFutureProj::Rejected { response } => match response.take() {
                Some(response) => Poll::Ready(Ok(response)),
                None => panic!("polled after completion"),
            },
            SessionFutureProj::Calling { future } => future.poll(cx),
        }
    }
}
