use http::header::LOCATION;
use http::{HeaderValue, StatusCode};
use serde_json::Value;

use crate::error::DispatchError;
use crate::handler::Model;
use crate::render::{RenderStrategy, RequestMethod};
use crate::request::RequestContext;
use crate::responder::text_response;

/// Redirects to the location returned by the handler with `302 Found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectRender {
    method: RequestMethod,
}

impl RedirectRender {
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

impl RenderStrategy for RedirectRender {
    fn sanity_check(&self, ctx: &RequestContext) -> Result<(), DispatchError> {
        self.method.check(ctx.method())
    }

    fn render(&self, name: &str, model: Model, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let Value::String(target) = model else {
            return Err(DispatchError::internal(format!("route '{name}' must return the redirect target as a string")));
        };
        let location = HeaderValue::from_str(&target).map_err(DispatchError::internal)?;

        let mut response = text_response(StatusCode::FOUND, ());
        response.headers_mut().insert(LOCATION, location);
        ctx.respond(response)
    }
}
