//! Render strategies turn a handler's [`Model`] into the response.
//!
//! Each route carries one strategy. Before parameters are bound, the strategy's
//! [`RenderStrategy::sanity_check`] may reject the request; after the handler returns,
//! [`RenderStrategy::render`] writes exactly one response into the
//! [`RequestContext`].

mod json;
mod redirect;
mod text;

pub use json::JsonRender;
pub use json::camel_case;
pub use redirect::RedirectRender;
pub use text::TextRender;

use http::{Method, StatusCode};

use crate::error::DispatchError;
use crate::handler::Model;
use crate::request::RequestContext;

pub trait RenderStrategy: Send + Sync {
    /// Validates the request before parameter binding, e.g. its verb.
    fn sanity_check(&self, _ctx: &RequestContext) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Writes the response for `model` through [`RequestContext::respond`].
    fn render(&self, name: &str, model: Model, ctx: &mut RequestContext) -> Result<(), DispatchError>;
}

/// The request verb a built-in render strategy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
    Any,
}

impl RequestMethod {
    pub fn check(self, method: &Method) -> Result<(), DispatchError> {
        let accepted = match self {
            RequestMethod::Get => Method::GET,
            RequestMethod::Post => Method::POST,
            RequestMethod::Any => return Ok(()),
        };

        if *method == accepted {
            Ok(())
        } else {
            Err(DispatchError::client(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("This controller only accepts {accepted} requests."),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_default() {
        assert_eq!(RequestMethod::default(), RequestMethod::Get);
    }

    #[test]
    fn any_accepts_everything() {
        assert!(RequestMethod::Any.check(&Method::DELETE).is_ok());
        assert!(RequestMethod::Any.check(&Method::GET).is_ok());
    }

    #[test]
    fn other_verbs_are_rejected() {
        assert!(RequestMethod::Post.check(&Method::POST).is_ok());

        let e = RequestMethod::Post.check(&Method::GET).unwrap_err();
        assert_eq!(e.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(e.to_string(), "This controller only accepts POST requests.");

        let e = RequestMethod::Get.check(&Method::PUT).unwrap_err();
        assert_eq!(e.to_string(), "This controller only accepts GET requests.");
    }
}
