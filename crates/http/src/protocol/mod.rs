//! Protocol types shared by the codec and the connection.
//!
//! - [`Message`], [`PayloadItem`], [`PayloadSize`]: what the request decoder yields
//! - [`RequestHeader`]: the decoded request head
//! - [`ReqBody`]: the request body, an `http_body::Body` over the rest of the connection
//! - [`HttpError`], [`ParseError`], [`SendError`]: transport errors

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

mod body;
pub use body::ReqBody;
pub(crate) use body::BoxedReader;
