//! Binds the request's key/value input to a handler's declared parameters.
//!
//! The key/value source is the form body when the request carries
//! `Content-Type: application/x-www-form-urlencoded`, and the query string otherwise. The
//! two are never merged.

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use mime::Mime;
use tracing::debug;

use crate::error::DispatchError;
use crate::param::{ParamSpec, ParamValue};
use crate::request::RequestContext;

/// Decoded key/value pairs with ASCII case-insensitive lookup.
///
/// Repeated keys are joined with `,` in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ParamSource {
    values: HashMap<String, String>,
}

impl ParamSource {
    /// Decodes `application/x-www-form-urlencoded` text, which is also the query string syntax.
    pub fn from_urlencoded(input: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values: HashMap<String, String> = HashMap::new();
        for (key, value) in pairs {
            values
                .entry(key.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Produces one [`ParamValue`] per declared parameter, in declaration order.
pub async fn bind(params: &[ParamSpec], ctx: &mut RequestContext) -> Result<Vec<ParamValue>, DispatchError> {
    if params.is_empty() {
        return Ok(Vec::new());
    }

    let source = read_source(ctx).await?;
    bind_from(params, &source)
}

/// Converts the values of `source` for each declared parameter.
pub fn bind_from(params: &[ParamSpec], source: &ParamSource) -> Result<Vec<ParamValue>, DispatchError> {
    params
        .iter()
        .map(|param| match source.get(param.name) {
            Some(raw) => param.kind.parse(raw).ok_or_else(|| DispatchError::invalid_parameter(param.name, param.kind.description())),
            None if param.nullable => Ok(ParamValue::Absent),
            None => Err(DispatchError::missing_parameter(param.name)),
        })
        .collect()
}

async fn read_source(ctx: &mut RequestContext) -> Result<ParamSource, DispatchError> {
    if is_form(ctx) {
        let body = read_form_body(ctx).await?;
        debug!(len = body.len(), "binding parameters from form body");
        return ParamSource::from_urlencoded(&body).map_err(|e| {
            debug!(cause = %e, "malformed form body");
            DispatchError::bad_request("Malformed form body.")
        });
    }

    let query = ctx.uri().query().unwrap_or_default();
    ParamSource::from_urlencoded(query.as_bytes()).map_err(|e| {
        debug!(cause = %e, "malformed query string");
        DispatchError::bad_request("Malformed query string.")
    })
}

fn is_form(ctx: &RequestContext) -> bool {
    ctx.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

async fn read_form_body(ctx: &mut RequestContext) -> Result<Bytes, DispatchError> {
    let Some(body) = ctx.take_body() else {
        return Err(DispatchError::internal("request body has already been consumed"));
    };

    match Limited::new(body, ctx.max_body_size()).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(DispatchError::client(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large."))
        }
        Err(e) => {
            debug!(cause = %e, "unable to read form body");
            Err(DispatchError::bad_request("Unable to read request body."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamKind;
    use crate::request::tests::context;
    use http::Method;

    const FORM: &str = "application/x-www-form-urlencoded";

    fn specs() -> Vec<ParamSpec> {
        vec![ParamSpec::new("a", ParamKind::I32, false), ParamSpec::new("b", ParamKind::I32, false)]
    }

    fn message(e: DispatchError) -> (StatusCode, String) {
        match e {
            DispatchError::Reported { status, message, .. } => (status, message.into_owned()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn binds_query_string() {
        let mut ctx = context(Method::GET, "/Add?a=2&b=3", None, "");
        let values = bind(&specs(), &mut ctx).await.unwrap();
        assert_eq!(values, vec![ParamValue::I32(2), ParamValue::I32(3)]);
    }

    #[tokio::test]
    async fn binds_form_body() {
        let mut ctx = context(Method::POST, "/Add?a=100", Some("application/x-www-form-urlencoded; charset=utf-8"), "a=2&b=3");
        let values = bind(&specs(), &mut ctx).await.unwrap();
        assert_eq!(values, vec![ParamValue::I32(2), ParamValue::I32(3)]);
    }

    #[tokio::test]
    async fn form_source_ignores_query() {
        let mut ctx = context(Method::POST, "/Add?b=3", Some(FORM), "a=2");
        let (status, message) = message(bind(&specs(), &mut ctx).await.unwrap_err());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Parameter \"b\" has not been specified.");
    }

    #[tokio::test]
    async fn non_form_body_is_ignored() {
        let mut ctx = context(Method::POST, "/Add?a=1&b=2", Some("application/json"), "{\"a\":5}");
        let values = bind(&specs(), &mut ctx).await.unwrap();
        assert_eq!(values, vec![ParamValue::I32(1), ParamValue::I32(2)]);
    }

    #[tokio::test]
    async fn missing_parameter_is_named() {
        let mut ctx = context(Method::GET, "/Add?a=2", None, "");
        let (status, message) = message(bind(&specs(), &mut ctx).await.unwrap_err());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Parameter \"b\" has not been specified.");
    }

    #[tokio::test]
    async fn invalid_value_is_named() {
        let mut ctx = context(Method::GET, "/Add?a=2&b=three", None, "");
        let (status, message) = message(bind(&specs(), &mut ctx).await.unwrap_err());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Parameter \"b\" is not a valid integer.");
    }

    #[tokio::test]
    async fn nullable_parameter_may_be_absent() {
        let params = vec![ParamSpec::new("name", ParamKind::Str, false), ParamSpec::new("age", ParamKind::U32, true)];
        let mut ctx = context(Method::GET, "/Greet?name=Ada%20L", None, "");
        let values = bind(&params, &mut ctx).await.unwrap();
        assert_eq!(values, vec![ParamValue::Str("Ada L".into()), ParamValue::Absent]);
    }

    #[tokio::test]
    async fn oversized_form_body_is_rejected() {
        let body: &'static str = Box::leak("a=1&".repeat(400).into_boxed_str());
        let mut ctx = context(Method::POST, "/Add", Some(FORM), body);
        let (status, _) = message(bind(&specs(), &mut ctx).await.unwrap_err());
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn no_parameters_reads_nothing() {
        let mut ctx = context(Method::POST, "/Index", Some(FORM), "a=1");
        assert!(bind(&[], &mut ctx).await.unwrap().is_empty());
        assert!(ctx.take_body().is_some());
    }

    #[test]
    fn keys_are_case_insensitive() {
        let source = ParamSource::from_urlencoded(b"Name=ada").unwrap();
        assert_eq!(source.get("name"), Some("ada"));
        assert_eq!(source.get("NAME"), Some("ada"));
    }

    #[test]
    fn repeated_keys_are_joined() {
        let source = ParamSource::from_urlencoded(b"tag=a&TAG=b&tag=c").unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.get("tag"), Some("a,b,c"));
    }

    #[test]
    fn plus_and_percent_are_decoded() {
        let source = ParamSource::from_urlencoded(b"q=hello+world%21").unwrap();
        assert_eq!(source.get("q"), Some("hello world!"));
    }
}
