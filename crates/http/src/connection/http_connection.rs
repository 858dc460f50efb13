use std::fmt::Display;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::EXPECT;
use http::{Request, Response};
use http_body::Body;
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::protocol::{BoxedReader, HttpError, Message, ParseError, ReqBody, RequestHeader, SendError};

/// Initial capacity of the read buffer, large enough for a typical request head.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// One accepted HTTP connection serving a single request.
///
/// The read half is handed to the request body once the head is decoded, so the body
/// is read lazily by whoever consumes the request. The write half stays with the
/// connection and receives exactly one response, after which it is shut down.
pub struct HttpConnection<W> {
    framed_read: Option<FramedRead<BoxedReader, RequestDecoder>>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<W> HttpConnection<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new<R>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        Self {
            framed_read: Some(FramedRead::with_capacity(reader, RequestDecoder::new(), READ_BUFFER_SIZE)),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Reads the request head and returns the request with a lazily read body.
    ///
    /// Returns `Ok(None)` when the peer closed the connection without sending anything.
    pub async fn read_request(&mut self) -> Result<Option<Request<ReqBody>>, HttpError> {
        let Some(mut framed_read) = self.framed_read.take() else {
            return Err(ParseError::invalid_header("the request of this connection has already been read").into());
        };

        match framed_read.next().await {
            Some(Ok(Message::Header((header, payload_size)))) => {
                debug!(method = %header.method(), uri = %header.uri(), ?payload_size, "received request head");
                self.continue_if_expected(&header).await?;
                Ok(Some(header.body(ReqBody::framed(framed_read))))
            }
            Some(Ok(Message::Payload(_))) => Err(ParseError::invalid_body("need header while receive body").into()),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Buffers the whole response body, writes the response and shuts the write half down.
    pub async fn send_response<B>(&mut self, response: Response<B>) -> Result<(), HttpError>
    where
        B: Body<Data = Bytes>,
        B::Error: Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| SendError::invalid_body(format!("resolve response body error: {e}")))?
            .to_bytes();

        self.framed_write.send(Response::from_parts(parts, body)).await?;
        self.framed_write.get_mut().shutdown().await.map_err(SendError::io)?;
        Ok(())
    }

    // Clients sending `Expect: 100-continue` wait for this before sending the body.
    async fn continue_if_expected(&mut self, header: &RequestHeader) -> Result<(), SendError> {
        let Some(value) = header.headers().get(EXPECT) else {
            return Ok(());
        };

        if value.as_bytes().eq_ignore_ascii_case(b"100-continue") {
            let writer = self.framed_write.get_mut();
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
            writer.flush().await.map_err(SendError::io)?;
            info!("receive expect request header, sent continue response");
        }
        Ok(())
    }
}

impl<W> std::fmt::Debug for HttpConnection<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection").field("request_read", &self.framed_read.is_none()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use tokio::io::{AsyncReadExt, duplex};

    #[tokio::test]
    async fn reads_request_and_writes_response() {
        let (client, server) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write
            .write_all(b"POST /Add?x=1 HTTP/1.1\r\nContent-Length: 7\r\nContent-Type: application/x-www-form-urlencoded\r\n\r\na=1&b=2")
            .await
            .unwrap();

        let mut connection = HttpConnection::new(server_read, server_write);
        let request = connection.read_request().await.unwrap().unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.uri().query(), Some("x=1"));

        let body = request.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"a=1&b=2"));

        let response =
            Response::builder().status(StatusCode::OK).body(Full::new(Bytes::from_static(b"{\"sum\":3}"))).unwrap();
        connection.send_response(response).await.unwrap();

        let mut written = String::new();
        client_read.read_to_string(&mut written).await.unwrap();
        assert!(written.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(written.ends_with("{\"sum\":3}"));
    }

    #[tokio::test]
    async fn closed_before_request() {
        let (client, server) = duplex(64);
        drop(client);
        let (server_read, server_write) = tokio::io::split(server);

        let mut connection = HttpConnection::new(server_read, server_write);
        assert!(connection.read_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn request_is_read_only_once() {
        let (mut client, server) = duplex(256);
        client.write_all(b"GET /Index HTTP/1.1\r\n\r\n").await.unwrap();
        let (server_read, server_write) = tokio::io::split(server);

        let mut connection = HttpConnection::new(server_read, server_write);
        assert!(connection.read_request().await.unwrap().is_some());
        assert!(matches!(connection.read_request().await, Err(HttpError::Request { .. })));
    }
}
