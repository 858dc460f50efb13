use http::StatusCode;
use serde_json::{Map, Value};

use crate::error::DispatchError;
use crate::handler::Model;
use crate::render::{RenderStrategy, RequestMethod};
use crate::request::RequestContext;
use crate::responder::response_with;

/// Writes the model as JSON with camel case object keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRender {
    method: RequestMethod,
}

impl JsonRender {
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

impl RenderStrategy for JsonRender {
    fn sanity_check(&self, ctx: &RequestContext) -> Result<(), DispatchError> {
        self.method.check(ctx.method())
    }

    fn render(&self, _name: &str, model: Model, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(&camel_case_keys(model)).map_err(DispatchError::internal)?;
        ctx.respond(response_with(StatusCode::OK, &mime::APPLICATION_JSON, body))
    }
}

fn camel_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(key, value)| (camel_case(&key), camel_case_keys(value))).collect::<Map<_, _>>())
        }
        Value::Array(values) => Value::Array(values.into_iter().map(camel_case_keys).collect()),
        other => other,
    }
}

/// Converts a property name to camel case.
///
/// `_` and `-` separated words are joined with their first letter capitalized, then the
/// leading run of capitals is lowered, keeping the last one when it starts the next word:
/// `user_id` → `userId`, `ID` → `id`, `HTTPServer` → `httpServer`.
pub fn camel_case(name: &str) -> String {
    let mut joined = String::with_capacity(name.len());
    for (i, word) in name.split(['_', '-']).filter(|word| !word.is_empty()).enumerate() {
        if i == 0 {
            joined.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            joined.extend(first.to_uppercase());
            joined.push_str(chars.as_str());
        }
    }

    lower_leading_capitals(&joined)
}

fn lower_leading_capitals(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if !chars.first().is_some_and(|c| c.is_uppercase()) {
        return name.to_owned();
    }

    let mut lowered = chars.clone();
    for i in 0..chars.len() {
        if i == 1 && !chars[i].is_uppercase() {
            break;
        }
        if i > 0 && chars.get(i + 1).is_some_and(|next| !next.is_uppercase()) {
            break;
        }
        lowered[i] = chars[i].to_lowercase().next().unwrap_or(chars[i]);
    }
    lowered.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::tests::context;
    use http::Method;
    use http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[test]
    fn camel_case_names() {
        assert_eq!(camel_case("name"), "name");
        assert_eq!(camel_case("user_id"), "userId");
        assert_eq!(camel_case("first-name"), "firstName");
        assert_eq!(camel_case("Name"), "name");
        assert_eq!(camel_case("ID"), "id");
        assert_eq!(camel_case("HTTPServer"), "httpServer");
        assert_eq!(camel_case("UserID"), "userID");
        assert_eq!(camel_case("alreadyCamel"), "alreadyCamel");
        assert_eq!(camel_case("item_2"), "item2");
        assert_eq!(camel_case("_private"), "private");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn keys_are_rewritten_recursively() {
        let model = json!({
            "Total_Count": 2,
            "items": [{ "item_name": "a", "Tags": { "IsNew": true } }],
            "note": "keep_values_as_is"
        });
        let expected = json!({
            "totalCount": 2,
            "items": [{ "itemName": "a", "tags": { "isNew": true } }],
            "note": "keep_values_as_is"
        });
        assert_eq!(camel_case_keys(model), expected);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        order_id: u64,
        customer_name: String,
        line_items: Vec<LineItem>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct LineItem {
        unit_price: f64,
        is_gift: bool,
    }

    #[tokio::test]
    async fn renders_camel_case_json() {
        let order = Order {
            order_id: 7,
            customer_name: "Ada".into(),
            line_items: vec![LineItem { unit_price: 2.5, is_gift: false }],
        };
        // handlers serialize with their field names, the renderer rewrites them
        let model = json!({
            "order_id": 7,
            "customer_name": "Ada",
            "line_items": [{ "unit_price": 2.5, "is_gift": false }]
        });

        let mut ctx = context(Method::GET, "/Order", None, "");
        JsonRender::get().render("Order", model, &mut ctx).unwrap();

        let response = ctx.take_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let decoded: Order = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn sanity_check_uses_method() {
        let ctx = context(Method::GET, "/Order", None, "");
        assert!(JsonRender::get().sanity_check(&ctx).is_ok());
        assert!(JsonRender::any().sanity_check(&ctx).is_ok());
        assert_eq!(JsonRender::post().sanity_check(&ctx).unwrap_err().status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn second_render_is_an_error() {
        let mut ctx = context(Method::GET, "/Order", None, "");
        JsonRender::get().render("Order", json!(1), &mut ctx).unwrap();
        let e = JsonRender::get().render("Order", json!(2), &mut ctx).unwrap_err();
        assert!(matches!(e, DispatchError::Internal(_)));
    }
}
