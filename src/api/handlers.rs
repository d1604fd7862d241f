//! HTTP request handlers.

use axum::{extract::Path, http::StatusCode};
use frest::{exclude, include, FrestResult, Reply, Valid};
use serde_json::json;

use crate::api::types::*;

/// Echo a validated person.
///
/// POST /person
pub async fn create_person(Valid(person): Valid<Person>) -> Reply {
    tracing::info!(name = %person.name, "Person received");
    Reply::model(person)
}

/// Show a person with only the public fields.
///
/// GET /person
pub async fn show_person() -> FrestResult<Reply> {
    let person = Person {
        name: "xx".to_string(),
        age: 12,
        height: Some(50.1),
    };
    // age is a secret
    Ok(include(&person, ["name", "height"])?.into())
}

/// Show a dog without its age.
///
/// GET /dog
pub async fn show_dog() -> FrestResult<Reply> {
    let dog = Dog {
        name: "puppy".to_string(),
        age: 12,
        weight: 12.44,
    };
    Ok(exclude(&dog, ["age"])?.into())
}

/// List all cats.
///
/// GET /cats
pub async fn list_cats() -> Reply {
    vec![
        Cat {
            name: "Tom".to_string(),
            age: 12,
        },
        Cat {
            name: "Jerry".to_string(),
            age: 2,
        },
    ]
    .into()
}

/// Adopt a cat.
///
/// POST /cats
pub async fn adopt_cat(Valid(cat): Valid<Cat>) -> Reply {
    (Reply::model(cat), StatusCode::CREATED).into()
}

/// Fetch a cat by index.
///
/// GET /cats/<int:id>
pub async fn get_cat(Path(id): Path<u32>) -> Reply {
    match id {
        0 => Reply::model(Cat {
            name: "Tom".to_string(),
            age: 12,
        }),
        _ => (json!({"error": format!("no cat {id}")}), StatusCode::NOT_FOUND).into(),
    }
}

/// Create an untyped record.
///
/// POST /records
pub async fn create_record() -> Reply {
    (json!({"id": 1, "kind": "record"}), StatusCode::CREATED).into()
}

/// Plain text liveness check.
///
/// GET /ping
pub async fn ping() -> Reply {
    "pong".into()
}

/// Health check.
///
/// GET /v1/health
pub async fn health_check() -> Reply {
    Reply::model(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
