//! A minimal request-dispatch runtime on top of `listener-http`.
//!
//! Every request is routed by the first segment of its path to a named handler. The
//! handler's typed arguments are bound from the query string or form body, and its result
//! is rendered by the route's [`RenderStrategy`].
//!
//! # Example
//!
//! ```no_run
//! use listener_web::{HandlerRegistry, HandlerResult, JsonRender, Server, handler_fn};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Sum {
//!     total_value: i64,
//! }
//!
//! async fn add(a: i64, b: i64) -> HandlerResult<Sum> {
//!     Ok(Sum { total_value: a + b })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let registry = HandlerRegistry::builder()
//!         .route("Add", JsonRender::get(), handler_fn(add, &["a", "b"]))
//!         .build()?;
//!
//!     let server = Server::builder().registry(registry).address("127.0.0.1:8080").build()?;
//!     // GET /Add?a=1&b=2 answers {"totalValue":3}
//!     server.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Request flow
//!
//! 1. `/favicon.ico` is answered with `404 Not found.` without dispatching.
//! 2. Listeners are notified that the request begins.
//! 3. The route name is resolved in the [`HandlerRegistry`], else `400 No such controller.`
//! 4. The render strategy's sanity check runs, then parameters are bound.
//! 5. The handler is invoked unless the server is shutting down, and its result rendered.
//! 6. Failures become a single response through [`DispatchError::into_response`], and
//!    listeners are notified that the request ended.
//!
//! One connection serves one request and is closed after the response.

mod body;
mod config;
mod date;
mod error;
mod fn_trait;
mod handler;
mod lifecycle;
mod registry;
mod request;
mod responder;
mod server;

pub mod binder;
pub mod param;
pub mod render;
pub mod router;

pub use body::ResponseBody;
pub use config::{DEFAULT_MAX_BODY_SIZE, DEFAULT_SHUTDOWN_GRACE, ServerConfig};
pub use date::DateService;
pub use error::{DispatchError, RegistryError, ServerBuildError, ServerError};
pub use fn_trait::FnTrait;
pub use handler::{FnHandler, HandlerResult, IntoModel, Model, RouteHandler, handler_fn};
pub use lifecycle::{RequestInfo, RequestListener, TracingListener};
pub use registry::{Controller, HandlerRegistry, HandlerRegistryBuilder, RouteEntry};
pub use render::{JsonRender, RedirectRender, RenderStrategy, RequestMethod, TextRender};
pub use request::RequestContext;
pub use responder::{response_with, text_response};
pub use server::{Server, ServerBuilder};
