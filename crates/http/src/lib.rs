//! A small HTTP/1.x transport serving one request per connection.
//!
//! This crate provides the accept-side primitives the `listener-web` dispatch runtime is
//! built on: decoding a request head, exposing the request body as an
//! [`http_body::Body`] read lazily from the socket, and writing a single buffered response.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Response, StatusCode};
//! use http_body_util::Full;
//! use listener_http::connection::HttpConnection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tcp_listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     loop {
//!         let (tcp_stream, _remote_addr) = tcp_listener.accept().await?;
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let mut connection = HttpConnection::new(reader, writer);
//!             if let Ok(Some(request)) = connection.read_request().await {
//!                 let body = format!("hello {}\r\n", request.uri().path());
//!                 let response = Response::builder().status(StatusCode::OK).body(Full::new(Bytes::from(body)));
//!                 if let Ok(response) = response {
//!                     let _ = connection.send_response(response).await;
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only, no keep-alive: the connection closes after one response
//! - Request bodies must be framed by `Content-Length`; chunked requests are rejected
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
