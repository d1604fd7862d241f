//! Response normalization.
//!
//! [`Reply`] is the output half of the marshaling layer. It describes the
//! shape a handler returned (a schema instance, a list, a plain JSON value
//! or text, optionally paired with a status code and headers) and turns
//! every schema instance it finds into its plain mapping before axum
//! renders the response.
//!
//! | returned | rendered |
//! |----------|----------|
//! | `Reply::model(x)` | mapping of `x` |
//! | `Reply::list(items)` | each model item mapped, other items untouched |
//! | `Reply::json(v)` / `Reply::text(s)` | untouched |
//! | any of the above `.with_status(c)` | same body, status `c` |

use std::fmt;

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::error::FrestResult;
use crate::schema::{IntoMapping, Schema};

/// One element of a list reply.
pub enum Item {
    /// Schema instance, mapped during normalization.
    Model(Box<dyn IntoMapping>),
    /// Anything else, passed through.
    Json(Value),
}

impl Item {
    pub fn model<T: Schema>(value: T) -> Self {
        Item::Model(Box::new(value))
    }

    pub fn json(value: impl Into<Value>) -> Self {
        Item::Json(value.into())
    }

    fn normalize(self) -> FrestResult<Value> {
        match self {
            Item::Model(model) => Ok(Value::Object(model.to_mapping()?)),
            Item::Json(value) => Ok(value),
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Model(model) => f.debug_tuple("Model").field(&model.schema_name()).finish(),
            Item::Json(value) => f.debug_tuple("Json").field(value).finish(),
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Json(value)
    }
}

impl From<Map<String, Value>> for Item {
    fn from(map: Map<String, Value>) -> Self {
        Item::Json(Value::Object(map))
    }
}

/// Body of a reply before normalization.
pub enum Payload {
    Model(Box<dyn IntoMapping>),
    List(Vec<Item>),
    Json(Value),
    Text(String),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Model(model) => f.debug_tuple("Model").field(&model.schema_name()).finish(),
            Payload::List(items) => f.debug_tuple("List").field(items).finish(),
            Payload::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// Handler return value understood by the marshaling layer.
#[derive(Debug)]
pub struct Reply {
    payload: Payload,
    status: Option<StatusCode>,
    headers: HeaderMap,
}

/// Body after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Json(Value),
    Text(String),
}

/// A reply whose schema instances have all been mapped.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub body: Rendered,
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

impl Reply {
    fn from_payload(payload: Payload) -> Self {
        Self {
            payload,
            status: None,
            headers: HeaderMap::new(),
        }
    }

    /// Reply with a single schema instance.
    pub fn model<T: Schema>(value: T) -> Self {
        Self::from_payload(Payload::Model(Box::new(value)))
    }

    /// Reply with a list whose schema items are mapped individually.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        Self::from_payload(Payload::List(items.into_iter().map(Into::into).collect()))
    }

    /// Reply with a list of schema instances.
    pub fn models<T: Schema>(values: impl IntoIterator<Item = T>) -> Self {
        Self::list(values.into_iter().map(Item::model))
    }

    /// Reply with a JSON value that is passed through as is.
    pub fn json(value: impl Into<Value>) -> Self {
        Self::from_payload(Payload::Json(value.into()))
    }

    /// Reply with plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_payload(Payload::Text(text.into()))
    }

    /// Attach a status code, like returning `(body, status)`.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a response header, like returning `(body, status, headers)`.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Map every schema instance in the payload, keeping status and headers.
    pub fn normalize(self) -> FrestResult<Normalized> {
        let body = match self.payload {
            Payload::Model(model) => Rendered::Json(Value::Object(model.to_mapping()?)),
            Payload::List(items) => Rendered::Json(Value::Array(
                items
                    .into_iter()
                    .map(Item::normalize)
                    .collect::<FrestResult<Vec<_>>>()?,
            )),
            Payload::Json(value) => Rendered::Json(value),
            Payload::Text(text) => Rendered::Text(text),
        };

        Ok(Normalized {
            body,
            status: self.status,
            headers: self.headers,
        })
    }
}

impl IntoResponse for Normalized {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Rendered::Json(value) => Json(value).into_response(),
            Rendered::Text(text) => text.into_response(),
        };

        if let Some(status) = self.status {
            *response.status_mut() = status;
        }

        // Reply headers replace defaults such as content-type.
        let mut current: Option<HeaderName> = None;
        for (name, value) in self.headers {
            match name {
                Some(name) => {
                    response.headers_mut().insert(name.clone(), value);
                    current = Some(name);
                }
                None => {
                    if let Some(name) = &current {
                        response.headers_mut().append(name.clone(), value);
                    }
                }
            }
        }

        response
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.normalize() {
            Ok(normalized) => normalized.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::json(value)
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(map: Map<String, Value>) -> Self {
        Reply::json(Value::Object(map))
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::text(text)
    }
}

impl From<&'static str> for Reply {
    fn from(text: &'static str) -> Self {
        Reply::text(text)
    }
}

impl<T: Schema> From<Vec<T>> for Reply {
    fn from(values: Vec<T>) -> Self {
        Reply::models(values)
    }
}

impl<R: Into<Reply>> From<(R, StatusCode)> for Reply {
    fn from((body, status): (R, StatusCode)) -> Self {
        body.into().with_status(status)
    }
}

impl<R: Into<Reply>> From<(R, StatusCode, HeaderMap)> for Reply {
    fn from((body, status, headers): (R, StatusCode, HeaderMap)) -> Self {
        let mut reply = body.into().with_status(status);
        reply.headers.extend(headers);
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrestError;
    use axum::http::header::{CONTENT_TYPE, LOCATION};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Person {
        name: String,
        age: i32,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Cat {
        name: String,
        age: i32,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Meters(f64);

    fn cat(name: &str, age: i32) -> Cat {
        Cat {
            name: name.to_string(),
            age,
        }
    }

    fn json_body(normalized: Normalized) -> Value {
        match normalized.body {
            Rendered::Json(value) => value,
            Rendered::Text(text) => panic!("expected json, got text {text}"),
        }
    }

    #[test]
    fn test_model_is_mapped() {
        let reply = Reply::model(Person {
            name: "xx".to_string(),
            age: 12,
        });
        let normalized = reply.normalize().unwrap();
        assert_eq!(normalized.status, None);
        assert_eq!(json_body(normalized), json!({"name": "xx", "age": 12}));
    }

    #[test]
    fn test_model_with_status_keeps_status() {
        let reply: Reply = (Reply::model(cat("Tom", 12)), StatusCode::CREATED).into();
        let normalized = reply.normalize().unwrap();
        assert_eq!(normalized.status, Some(StatusCode::CREATED));
        assert_eq!(json_body(normalized), json!({"name": "Tom", "age": 12}));
    }

    #[test]
    fn test_plain_mapping_with_status_passes_through() {
        let reply: Reply = (json!({"id": 7, "ok": true}), StatusCode::CREATED).into();
        let normalized = reply.normalize().unwrap();
        assert_eq!(normalized.status, Some(StatusCode::CREATED));
        assert_eq!(json_body(normalized), json!({"id": 7, "ok": true}));
    }

    #[test]
    fn test_list_of_models() {
        let reply: Reply = vec![cat("Tom", 12), cat("Jerry", 2)].into();
        assert_eq!(
            json_body(reply.normalize().unwrap()),
            json!([{"name": "Tom", "age": 12}, {"name": "Jerry", "age": 2}])
        );
    }

    #[test]
    fn test_mixed_list_maps_only_models() {
        let reply = Reply::list([
            Item::model(cat("Tom", 12)),
            Item::json(json!("plain")),
            Item::json(json!([1, 2])),
        ])
        .with_status(StatusCode::ACCEPTED);

        let normalized = reply.normalize().unwrap();
        assert_eq!(normalized.status, Some(StatusCode::ACCEPTED));
        assert_eq!(
            json_body(normalized),
            json!([{"name": "Tom", "age": 12}, "plain", [1, 2]])
        );
    }

    #[test]
    fn test_text_passes_through() {
        let reply: Reply = "hello".into();
        assert_eq!(
            reply.normalize().unwrap().body,
            Rendered::Text("hello".to_string())
        );
    }

    #[test]
    fn test_non_mapping_model_is_error() {
        let err = Reply::model(Meters(1.5)).normalize().unwrap_err();
        assert!(matches!(err, FrestError::NotAMapping(ref name) if name == "Meters"));
    }

    #[tokio::test]
    async fn test_into_response_applies_status_and_headers() {
        let reply = Reply::json(json!({"name": "x"}))
            .with_status(StatusCode::CREATED)
            .with_header(LOCATION, HeaderValue::from_static("/person/1"));

        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[LOCATION], "/person/1");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"name":"x"}"#);
    }
}
