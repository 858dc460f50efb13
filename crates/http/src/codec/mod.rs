//! HTTP codec module for decoding requests and encoding responses
//!
//! - [`RequestDecoder`]: decodes the request head and its `Content-Length` payload
//! - [`ResponseEncoder`]: encodes a fully buffered response
//!
//! # Example
//!
//! ```no_run
//! use listener_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET /Index HTTP/1.1\r\n\r\n");
//! let request = decoder.decode(&mut buffer);
//! ```

mod request_decoder;
mod response_encoder;

pub use request_decoder::MAX_HEADER_BYTES;
pub use request_decoder::MAX_HEADER_NUM;
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
