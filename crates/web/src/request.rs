//! The per-request context handed through the dispatch pipeline.

use std::time::{Duration, Instant};

use http::{HeaderMap, Method, Request, Response, Uri, Version};
use listener_http::protocol::{ReqBody, RequestHeader};
use tokio_util::sync::CancellationToken;

use crate::body::ResponseBody;
use crate::error::DispatchError;

/// Everything one worker knows about the request it serves.
///
/// A context is created when the request head has been read and is exclusively owned by
/// the worker serving it. The request body can be taken once and the response slot can be
/// written once; it is dropped when the worker completes.
#[derive(Debug)]
pub struct RequestContext {
    id: u64,
    request_header: RequestHeader,
    body: Option<ReqBody>,
    response: Option<Response<ResponseBody>>,
    cancellation: CancellationToken,
    max_body_size: usize,
    started_at: Instant,
}

impl RequestContext {
    pub fn new(id: u64, request: Request<ReqBody>, cancellation: CancellationToken, max_body_size: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            id,
            request_header: RequestHeader::from(parts),
            body: Some(body),
            response: None,
            cancellation,
            max_body_size,
            started_at: Instant::now(),
        }
    }

    /// Monotonic id assigned at accept time, also recorded on the request span.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request_header(&self) -> &RequestHeader {
        &self.request_header
    }

    pub fn method(&self) -> &Method {
        self.request_header.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request_header.uri()
    }

    pub fn version(&self) -> Version {
        self.request_header.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request_header.headers()
    }

    /// Takes the request body; `None` once it has been taken.
    pub fn take_body(&mut self) -> Option<ReqBody> {
        self.body.take()
    }

    /// Upper bound for reading the request body into memory.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fails with [`DispatchError::Cancelled`] if server shutdown has been requested.
    pub fn checkpoint(&self) -> Result<(), DispatchError> {
        if self.cancellation.is_cancelled() { Err(DispatchError::Cancelled) } else { Ok(()) }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores the response. A request is answered exactly once, a second write is an error.
    pub fn respond(&mut self, response: Response<ResponseBody>) -> Result<(), DispatchError> {
        if self.response.is_some() {
            return Err(DispatchError::internal("a response has already been written for this request"));
        }
        self.response = Some(response);
        Ok(())
    }

    pub fn has_responded(&self) -> bool {
        self.response.is_some()
    }

    pub(crate) fn take_response(&mut self) -> Option<Response<ResponseBody>> {
        self.response.take()
    }
}
