use http::StatusCode;
use serde_json::Value;

use crate::error::DispatchError;
use crate::handler::Model;
use crate::render::{RenderStrategy, RequestMethod};
use crate::request::RequestContext;
use crate::responder::text_response;

/// Writes a string model verbatim as `text/plain`, any other model as compact JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRender {
    method: RequestMethod,
}

impl TextRender {
    pub fn new(method: RequestMethod) -> Self {
        Self { method }
    }

    pub fn get() -> Self {
        Self::new(RequestMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(RequestMethod::Post)
    }

    pub fn any() -> Self {
        Self::new(RequestMethod::Any)
    }
}

impl RenderStrategy for TextRender {
    fn sanity_check(&self, ctx: &RequestContext) -> Result<(), DispatchError> {
        self.method.check(ctx.method())
    }

    fn render(&self, _name: &str, model: Model, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let body = match model {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        ctx.respond(text_response(StatusCode::OK, body))
    }
}
