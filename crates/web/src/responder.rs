//! Helpers shared by the render strategies and the error boundary for building responses.

use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use mime::Mime;

use crate::body::ResponseBody;

/// Builds a response with the given status, content type and body.
pub fn response_with(status: StatusCode, content_type: &Mime, body: impl Into<ResponseBody>) -> Response<ResponseBody> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().reserve(8);
    response.headers_mut().insert(CONTENT_TYPE, header_value(content_type));
    response
}

/// A `text/plain; charset=utf-8` response, used for every error and fixed message.
pub fn text_response(status: StatusCode, body: impl Into<ResponseBody>) -> Response<ResponseBody> {
    response_with(status, &mime::TEXT_PLAIN_UTF_8, body)
}

fn header_value(content_type: &Mime) -> HeaderValue {
    HeaderValue::from_str(content_type.as_ref()).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}
