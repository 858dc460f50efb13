//! HTTP request decoder.
//!
//! Decodes the request head with `httparse`, then yields the `Content-Length` delimited
//! payload as [`PayloadItem`] chunks followed by a single [`PayloadItem::Eof`].

use bytes::{Buf, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::HeaderMap;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};

/// Maximum number of headers accepted in one request head.
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes of one request head.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Two-phase decoder: request head first, then the payload if one was declared.
///
/// `remaining` is `None` while a head is expected and `Some(n)` while `n` payload bytes
/// are still outstanding.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    remaining: Option<u64>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Payload bytes not yet yielded for the current request.
    pub fn remaining_payload(&self) -> u64 {
        self.remaining.unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn expect_payload(&mut self, length: u64) {
        self.remaining = Some(length);
    }

    fn decode_payload(&mut self, remaining: u64, src: &mut BytesMut) -> Option<PayloadItem> {
        if remaining == 0 {
            self.remaining = None;
            return Some(PayloadItem::Eof);
        }

        if src.is_empty() {
            return None;
        }

        let length = remaining.min(src.len() as u64);
        // length <= src.len(), so it fits in usize
        let chunk = src.split_to(length as usize).freeze();
        self.remaining = Some(remaining - length);
        Some(PayloadItem::Chunk(chunk))
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHeader, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(remaining) = self.remaining {
            return Ok(self.decode_payload(remaining, src).map(Message::Payload));
        }

        let Some((header, payload_size, consumed)) = decode_head(src)? else {
            return Ok(None);
        };
        src.advance(consumed);

        trace!(method = %header.method(), uri = %header.uri(), ?payload_size, "decoded request head");
        if !payload_size.is_empty() {
            self.remaining = Some(payload_size.len());
        }
        Ok(Some(Message::Header((header, payload_size))))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        match self.remaining {
            Some(remaining) => {
                Err(ParseError::invalid_body(format!("connection closed with {remaining} body bytes outstanding")))
            }
            None if !src.is_empty() => Err(ParseError::invalid_header("connection closed inside the request head")),
            None => Ok(None),
        }
    }
}

fn decode_head(src: &BytesMut) -> Result<Option<(RequestHeader, PayloadSize, usize)>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut parsed_req = httparse::Request::new(&mut headers);

    let status = parsed_req.parse(src).map_err(|e| match e {
        httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        httparse::Error::Version => ParseError::InvalidVersion(None),
        httparse::Error::Token => ParseError::InvalidMethod,
        e => ParseError::invalid_header(e),
    })?;

    match status {
        httparse::Status::Partial => {
            ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::head_too_large(src.len(), MAX_HEADER_BYTES));
            Ok(None)
        }
        httparse::Status::Complete(consumed) => {
            ensure!(consumed <= MAX_HEADER_BYTES, ParseError::head_too_large(consumed, MAX_HEADER_BYTES));
            let header = RequestHeader::try_from(parsed_req)?;
            let payload_size = payload_size(header.headers())?;
            Ok(Some((header, payload_size, consumed)))
        }
    }
}

fn payload_size(headers: &HeaderMap) -> Result<PayloadSize, ParseError> {
    if let Some(encoding) = headers.get(TRANSFER_ENCODING) {
        let encoding = encoding.to_str().map_err(ParseError::invalid_header)?;
        ensure!(encoding.trim().eq_ignore_ascii_case("identity"), ParseError::unsupported_transfer_encoding(encoding));
    }

    let mut length = None;
    for value in headers.get_all(CONTENT_LENGTH) {
        let value = value.to_str().map_err(ParseError::invalid_content_length)?;
        let parsed = value.trim().parse::<u64>().map_err(ParseError::invalid_content_length)?;
        ensure!(
            length.is_none_or(|previous| previous == parsed),
            ParseError::invalid_content_length("conflicting content-length values")
        );
        length = Some(parsed);
    }

    Ok(match length {
        Some(0) | None => PayloadSize::Empty,
        Some(length) => PayloadSize::Length(length),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use indoc::indoc;

    fn decode_all(raw: &str) -> Result<Vec<Message<(RequestHeader, PayloadSize)>>, ParseError> {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from(raw);
        let mut messages = vec![];
        while let Some(message) = decoder.decode_eof(&mut buf)? {
            messages.push(message);
        }
        Ok(messages)
    }

    #[test]
    fn head_without_body() {
        let messages = decode_all(indoc! {r##"
        GET /Index?name=bob HTTP/1.1
        Host: 127.0.0.1:8080

        "##})
        .unwrap();

        assert_eq!(messages.len(), 1);
        let Message::Header((header, payload_size)) = &messages[0] else { panic!("expected head") };
        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.uri().query(), Some("name=bob"));
        assert_eq!(*payload_size, PayloadSize::Empty);
    }

    #[test]
    fn head_with_body() {
        let raw = "POST /Add HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 7\r\n\r\na=1&b=2";
        let mut messages = decode_all(raw).unwrap().into_iter();

        let Some(Message::Header((_, payload_size))) = messages.next() else { panic!("expected head") };
        assert_eq!(payload_size, PayloadSize::Length(7));
        assert_eq!(messages.next().and_then(Message::into_payload_item), Some(PayloadItem::Chunk("a=1&b=2".into())));
        assert_eq!(messages.next().and_then(Message::into_payload_item), Some(PayloadItem::Eof));
        assert!(messages.next().is_none());
    }

    #[test]
    fn body_arrives_in_pieces() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("POST /Add HTTP/1.1\r\nContent-Length: 6\r\n\r\nabc");

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        assert_eq!(decoder.decode(&mut buf).unwrap().and_then(Message::into_payload_item), Some(PayloadItem::Chunk("abc".into())));
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.remaining_payload(), 3);

        buf.extend_from_slice(b"def");
        assert_eq!(decoder.decode(&mut buf).unwrap().and_then(Message::into_payload_item), Some(PayloadItem::Chunk("def".into())));
        assert_eq!(decoder.decode(&mut buf).unwrap().and_then(Message::into_payload_item), Some(PayloadItem::Eof));
    }

    #[test]
    fn partial_head_waits_for_more() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET /Index HTTP/1.1\r\nHost: local");
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(matches!(decoder.decode_eof(&mut buf), Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn chunked_request_is_rejected() {
        let result = decode_all("POST /Add HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnsupportedTransferEncoding { .. })));
    }

    #[test]
    fn conflicting_content_length_is_rejected() {
        let result = decode_all("POST /Add HTTP/1.1\r\nContent-Length: 3\r\nContent-Length: 4\r\n\r\nabcd");
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET /Index HTTP/1.1\r\n");
        buf.extend_from_slice(format!("X-Padding: {}\r\n", "a".repeat(MAX_HEADER_BYTES)).as_bytes());
        assert!(matches!(decoder.decode(&mut buf), Err(ParseError::HeadTooLarge { .. })));
    }
}
