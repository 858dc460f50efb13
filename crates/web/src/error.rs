//! Failures at the dispatch boundary and at construction time.
//!
//! Every failure raised while serving a request ends up as a [`DispatchError`] and is
//! turned into exactly one response by [`DispatchError::into_response`]. Whether the
//! message reaches the client depends on the `browser_safe` flag: anything not marked safe
//! is answered with a generic 500.

use std::borrow::Cow;
use std::error::Error;

use http::{Response, StatusCode};
use thiserror::Error;
use tracing::{debug, error};

use crate::body::ResponseBody;
use crate::responder::text_response;

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";
pub(crate) const CANCELLED_MESSAGE: &str = "The server is shutting down.";

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A failure with a human readable message, usually attributable to the client.
    #[error("{message}")]
    Reported { status: StatusCode, message: Cow<'static, str>, browser_safe: bool },

    /// Server shutdown was observed at a cancellation checkpoint.
    #[error("request cancelled by server shutdown")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(Box<dyn Error + Send + Sync>),
}

impl DispatchError {
    /// A client error whose message is returned as-is.
    pub fn client(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Reported { status, message: message.into(), browser_safe: true }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::client(StatusCode::BAD_REQUEST, message)
    }

    /// A failure reported by application code, exposed to the client only when `browser_safe` is set.
    pub fn server(message: impl Into<Cow<'static, str>>, browser_safe: bool) -> Self {
        Self::Reported { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into(), browser_safe }
    }

    pub fn internal<E>(e: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Internal(e.into())
    }

    pub(crate) fn missing_parameter(name: &str) -> Self {
        Self::bad_request(format!("Parameter \"{name}\" has not been specified."))
    }

    pub(crate) fn invalid_parameter(name: &str, expected: &str) -> Self {
        Self::bad_request(format!("Parameter \"{name}\" is not a valid {expected}."))
    }

    /// The status this failure is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Reported { status, browser_safe: true, .. } => *status,
            Self::Reported { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        let status = self.status();
        match self {
            Self::Reported { message, browser_safe: true, .. } => {
                debug!(%status, %message, "request rejected");
                text_response(status, message.into_owned())
            }
            Self::Reported { message, .. } => {
                error!(%message, "request failed");
                text_response(status, INTERNAL_ERROR_MESSAGE)
            }
            Self::Cancelled => {
                debug!("request cancelled");
                text_response(status, CANCELLED_MESSAGE)
            }
            Self::Internal(e) => {
                error!(cause = %e, "request failed");
                text_response(status, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

/// Raised while building a [`HandlerRegistry`](crate::registry::HandlerRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route name '{name}' can not be produced by the router, only ASCII letters and digits are allowed")]
    InvalidRouteName { name: String },

    #[error("route '{name}' declares {declared} parameter names but its handler takes {expected} arguments")]
    ParameterMismatch { name: String, declared: usize, expected: usize },
}

/// Raised by [`ServerBuilder::build`](crate::ServerBuilder::build).
#[derive(Debug, Error)]
pub enum ServerBuildError {
    #[error("handler registry must be set")]
    MissingRegistry,

    #[error("address must be set")]
    MissingAddress,

    #[error("invalid address: {source}")]
    InvalidAddress {
        #[from]
        source: std::io::Error,
    },
}

/// Raised by [`Server::bind`](crate::Server::bind) and [`Server::start`](crate::Server::start).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bind server error: {source}")]
    Bind { source: std::io::Error },

    #[error("server is already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn browser_safe_message_is_exposed() {
        let response = DispatchError::bad_request("No such controller.").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, "No such controller.");
    }

    #[tokio::test]
    async fn unsafe_message_is_hidden() {
        let response = DispatchError::server("db password is hunter2", false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn safe_server_message_is_exposed() {
        let response = DispatchError::server("Quota exceeded.", true).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Quota exceeded.");
    }

    #[tokio::test]
    async fn internal_error_is_generic() {
        let io = std::io::Error::other("disk on fire");
        let response = DispatchError::internal(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn cancelled_is_unavailable() {
        assert_eq!(DispatchError::Cancelled.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
