//! Connection handling: read one request, write one response.
//!
//! - [`HttpConnection`]: wraps the read and write halves of an accepted stream,
//!   decodes the request head, hands the rest of the stream to the request body and
//!   writes the single response with `Connection: close`.

mod http_connection;

pub use http_connection::HttpConnection;
