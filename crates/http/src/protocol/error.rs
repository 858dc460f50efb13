use std::fmt::Display;
use std::io;

use thiserror::Error;

/// Failure while serving the single request of a connection.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to read request: {0}")]
    Request(#[from] ParseError),

    #[error("failed to write response: {0}")]
    Response(#[from] SendError),
}

/// The request head or body could not be decoded.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("request head of {size} bytes exceeds the {limit} byte limit")]
    HeadTooLarge { size: usize, limit: usize },

    #[error("more than {limit} request headers")]
    TooManyHeaders { limit: usize },

    #[error("malformed request head: {reason}")]
    InvalidHeader { reason: String },

    #[error("unsupported http version {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("malformed request method")]
    InvalidMethod,

    #[error("malformed request target")]
    InvalidUri,

    #[error("bad content-length: {reason}")]
    InvalidContentLength { reason: String },

    #[error("transfer-encoding '{encoding}' is not supported")]
    UnsupportedTransferEncoding { encoding: String },

    #[error("malformed request body: {reason}")]
    InvalidBody { reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ParseError {
    pub fn head_too_large(size: usize, limit: usize) -> Self {
        Self::HeadTooLarge { size, limit }
    }

    pub fn too_many_headers(limit: usize) -> Self {
        Self::TooManyHeaders { limit }
    }

    pub fn invalid_header(reason: impl Display) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }

    pub fn invalid_body(reason: impl Display) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }

    pub fn invalid_content_length(reason: impl Display) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    pub fn unsupported_transfer_encoding(encoding: impl Display) -> Self {
        Self::UnsupportedTransferEncoding { encoding: encoding.to_string() }
    }
}

/// The response could not be written.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("response body failed: {reason}")]
    InvalidBody { reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SendError {
    pub fn invalid_body(reason: impl Display) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }

    pub fn io(e: impl Into<io::Error>) -> Self {
        Self::Io(e.into())
    }
}
