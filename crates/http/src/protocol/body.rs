//! Request body handling.
//!
//! The transport serves exactly one request per connection, so the body does not need a
//! channel back to the connection: [`ReqBody`] takes ownership of the framed reader once
//! the head has been decoded and pulls payload items from it on demand. Nothing is read
//! from the socket unless the body is polled.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::RequestDecoder;
use crate::protocol::{Message, ParseError, PayloadItem};

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

pub struct ReqBody {
    kind: Kind,
}

enum Kind {
    Empty,
    Full(Option<Bytes>),
    Framed(FramedRead<BoxedReader, RequestDecoder>),
}

impl ReqBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// A body backed by the remaining payload of the connection.
    pub(crate) fn framed(framed: FramedRead<BoxedReader, RequestDecoder>) -> Self {
        if framed.decoder().remaining_payload() == 0 {
            Self::empty()
        } else {
            Self { kind: Kind::Framed(framed) }
        }
    }
}

impl From<Bytes> for ReqBody {
    fn from(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { kind: Kind::Full(Some(bytes)) } }
    }
}

impl From<String> for ReqBody {
    fn from(value: String) -> Self {
        Bytes::from(value).into()
    }
}

impl From<&'static str> for ReqBody {
    fn from(value: &'static str) -> Self {
        Bytes::from_static(value.as_bytes()).into()
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match &mut this.kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Full(bytes) => Poll::Ready(bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Framed(framed) => match ready!(Pin::new(framed).poll_next(cx)) {
                Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
                Some(Ok(Message::Payload(PayloadItem::Eof))) => {
                    this.kind = Kind::Empty;
                    Poll::Ready(None)
                }
                Some(Ok(Message::Header(_))) => {
                    this.kind = Kind::Empty;
                    Poll::Ready(Some(Err(ParseError::invalid_body("received a request head while reading body"))))
                }
                Some(Err(e)) => {
                    this.kind = Kind::Empty;
                    Poll::Ready(Some(Err(e)))
                }
                None => {
                    this.kind = Kind::Empty;
                    Poll::Ready(Some(Err(ParseError::invalid_body("connection closed before body completed"))))
                }
            },
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Full(bytes) => bytes.is_none(),
            Kind::Framed(_) => false,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Empty | Kind::Full(None) => SizeHint::with_exact(0),
            Kind::Full(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Framed(framed) => SizeHint::with_exact(framed.decoder().remaining_payload()),
        }
    }
}

impl fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Empty => "empty",
            Kind::Full(_) => "full",
            Kind::Framed(_) => "framed",
        };
        f.debug_struct("ReqBody").field("kind", &kind).field("size_hint", &self.size_hint().exact()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn full_body_is_read_once() {
        let mut body = ReqBody::from("a=1&b=2");

        assert_eq!(body.size_hint().exact(), Some(7));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(bytes, Bytes::from_static(b"a=1&b=2"));
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn empty_body() {
        let body = ReqBody::from("");
        assert!(body.is_end_stream());
        assert_eq!(body.collect().await.unwrap().to_bytes(), Bytes::new());
    }

    #[tokio::test]
    async fn framed_body_reads_declared_length() {
        let reader: BoxedReader = Box::new(&b"hello world, and then some trailing bytes"[..]);
        let mut decoder = RequestDecoder::new();
        decoder.expect_payload(11);
        let framed = FramedRead::new(reader, decoder);

        let body = ReqBody::framed(framed);
        assert_eq!(body.size_hint().exact(), Some(11));
        assert_eq!(body.collect().await.unwrap().to_bytes(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn framed_body_detects_truncation() {
        let reader: BoxedReader = Box::new(&b"short"[..]);
        let mut decoder = RequestDecoder::new();
        decoder.expect_payload(64);
        let framed = FramedRead::new(reader, decoder);

        let result = ReqBody::framed(framed).collect().await;
        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));
    }
}
