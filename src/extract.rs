//! Request body decoding.
//!
//! [`Valid<T>`] is the input half of the marshaling layer. A handler names
//! its body schema by taking a `Valid<T>` argument; handlers without one
//! receive their arguments untouched.

use std::ops::Deref;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};

use crate::error::FrestError;
use crate::schema::{self, Schema};

/// Extractor that decodes and validates the JSON body as `T`.
///
/// On failure the request is answered with `400` and the list of error
/// records; the handler is never called.
///
/// ```rust,ignore
/// async fn create_person(Valid(person): Valid<Person>) -> Reply {
///     Reply::model(person)
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Valid<T>(pub T);

impl<T> Valid<T> {
    /// Consumes the wrapper and returns the decoded instance.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Valid<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for Valid<T>
where
    T: Schema,
    S: Send + Sync,
{
    type Rejection = FrestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        let payload = Bytes::from_request(req, state).await?;

        match schema::decode::<T>(&payload) {
            Ok(value) => Ok(Valid(value)),
            Err(FrestError::Validation(errors)) => {
                let schema = T::name();
                tracing::debug!(
                    path = %path,
                    schema = %schema,
                    errors = %errors,
                    "Request body rejected"
                );
                Err(FrestError::Validation(errors))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, PartialEq, Serialize, Deserialize, ToSchema)]
    struct Person {
        name: String,
        age: i32,
    }

    fn post(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/person")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extracts_valid_body() {
        let Valid(person) = Valid::<Person>::from_request(post(r#"{"name":"a","age":3}"#), &())
            .await
            .unwrap();
        assert_eq!(person.name, "a");
        assert_eq!(person.age, 3);
    }

    #[tokio::test]
    async fn test_rejects_with_bad_request() {
        crate::logging::init_test();

        let err = Valid::<Person>::from_request(post(r#"{"name":"a"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, FrestError::Validation(ref e) if e.len() == 1));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
