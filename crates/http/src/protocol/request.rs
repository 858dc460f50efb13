//! The head of an inbound HTTP request.

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

use crate::protocol::ParseError;

/// Method, target, version and headers of a request, without its body.
///
/// Wraps a `http::Request<()>` so the head can be built before the body exists and
/// joined with it afterwards through [`RequestHeader::body`].
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body, producing the full request handed to the dispatcher.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|_| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }
}

impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

impl<'headers, 'buf> TryFrom<httparse::Request<'headers, 'buf>> for RequestHeader {
    type Error = ParseError;

    fn try_from(req: httparse::Request<'headers, 'buf>) -> Result<Self, Self::Error> {
        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let method = Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::InvalidMethod)?;
        let uri = req.path.ok_or(ParseError::InvalidUri)?.parse::<Uri>().map_err(|_e| ParseError::InvalidUri)?;
        let version = match req.version {
            Some(1) => Version::HTTP_11,
            Some(0) => Version::HTTP_10,
            other => return Err(ParseError::InvalidVersion(other)),
        };

        let mut builder = Request::builder().method(method).uri(uri).version(version);
        if let Some(headers) = builder.headers_mut() {
            headers.reserve(req.headers.len());
        }
        for header in req.headers.iter() {
            builder = builder.header(header.name, header.value);
        }

        let inner = builder.body(()).map_err(ParseError::invalid_header)?;
        Ok(RequestHeader { inner })
    }
}
