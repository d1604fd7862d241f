//! Route definitions for the API.

use axum::{
    http::{Method, StatusCode},
    Router,
};
use frest::config::DocsConfig;
use frest::{RouteDoc, Swagger};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::types::{Cat, HealthResponse, Person};

/// Build the API router, mounting documentation when enabled.
pub fn build_router(docs: &DocsConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Swagger::from(docs)
        .init_app(Router::new())
        // People
        .route_with(
            "/person",
            &[Method::POST],
            handlers::create_person,
            RouteDoc::new()
                .summary("Echo a validated person")
                .tag("people")
                .body::<Person>()
                .response_body::<Person>(StatusCode::OK, "The person"),
        )
        .route_with(
            "/person",
            &[Method::GET],
            handlers::show_person,
            RouteDoc::new()
                .summary("Show a person with only the public fields")
                .tag("people")
                .response(StatusCode::OK, "Name and height"),
        )
        // Pets
        .route_with(
            "/dog",
            &[Method::GET],
            handlers::show_dog,
            RouteDoc::new()
                .summary("Show a dog without its age")
                .tag("pets")
                .response(StatusCode::OK, "Name and weight"),
        )
        .route_with(
            "/cats",
            &[Method::GET],
            handlers::list_cats,
            RouteDoc::new()
                .summary("List all cats")
                .tag("pets")
                .response_list::<Cat>(StatusCode::OK, "All cats"),
        )
        .route_with(
            "/cats",
            &[Method::POST],
            handlers::adopt_cat,
            RouteDoc::new()
                .summary("Adopt a cat")
                .tag("pets")
                .body::<Cat>()
                .response_body::<Cat>(StatusCode::CREATED, "Adopted cat"),
        )
        .route_with(
            "/cats/<int:id>",
            &[Method::GET],
            handlers::get_cat,
            RouteDoc::new()
                .summary("Fetch a cat by index")
                .tag("pets")
                .response_body::<Cat>(StatusCode::OK, "The cat")
                .response(StatusCode::NOT_FOUND, "No such cat"),
        )
        // Misc
        .route("/records", &[Method::POST], handlers::create_record)
        .route("/ping", &[], handlers::ping)
        .route_with(
            "/v1/health",
            &[Method::GET],
            handlers::health_check,
            RouteDoc::new()
                .summary("Service health")
                .tag("health")
                .response_body::<HealthResponse>(StatusCode::OK, "Service is up"),
        );

    let router = if docs.enabled {
        api.finish()
    } else {
        api.finish_without_docs()
    };

    router.layer(TraceLayer::new_for_http()).layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(&DocsConfig::default())
    }

    async fn send(request: Request<Body>) -> Response {
        app().oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_round_trips() {
        let response = send(post_json("/person", json!({"name": "test", "age": 12}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"name": "test", "age": 12}));
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let response = send(post_json("/person", json!({"name": "test"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let errors = body_json(response).await;
        let errors = errors.as_array().expect("error list");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["loc"], json!(["age"]));
        assert_eq!(errors[0]["type"], "missing");
    }

    #[tokio::test]
    async fn test_schema_rules_are_enforced() {
        let response = send(post_json("/person", json!({"name": "", "age": -1}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let errors = body_json(response).await;
        assert_eq!(errors.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_include_projection() {
        let response = send(get("/person")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"name": "xx", "height": 50.1}));
    }

    #[tokio::test]
    async fn test_exclude_projection() {
        let response = send(get("/dog")).await;
        assert_eq!(body_json(response).await, json!({"name": "puppy", "weight": 12.44}));
    }

    #[tokio::test]
    async fn test_list_of_models() {
        let response = send(get("/cats")).await;
        assert_eq!(
            body_json(response).await,
            json!([{"name": "Tom", "age": 12}, {"name": "Jerry", "age": 2}])
        );
    }

    #[tokio::test]
    async fn test_model_with_status() {
        let response = send(post_json("/cats", json!({"name": "Kit", "age": 1}))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await, json!({"name": "Kit", "age": 1}));
    }

    #[tokio::test]
    async fn test_plain_mapping_with_status_passes_through() {
        let response = send(Request::post("/records").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_bytes(response).await, br#"{"id":1,"kind":"record"}"#);
    }

    #[tokio::test]
    async fn test_path_params_reach_handler_unmodified() {
        let response = send(get("/cats/0")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(get("/cats/9")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "no cat 9"}));
    }

    #[tokio::test]
    async fn test_text_passes_through() {
        let response = send(get("/ping")).await;
        assert_eq!(body_bytes(response).await, b"pong");
    }

    #[tokio::test]
    async fn test_openapi_is_served() {
        let doc = body_json(send(get("/api-docs/openapi.json")).await).await;
        assert_eq!(doc["paths"]["/person"]["post"]["operationId"], "create_person");
        assert_eq!(doc["paths"]["/person"]["get"]["operationId"], "show_person");
        assert!(doc["paths"]["/cats/{id}"]["get"].is_object());
        assert!(doc["components"]["schemas"]["Cat"].is_object());
        assert!(doc["components"]["schemas"]["HealthResponse"].is_object());
    }

    #[tokio::test]
    async fn test_docs_can_be_disabled() {
        let docs = DocsConfig {
            enabled: false,
            ..DocsConfig::default()
        };
        let response = build_router(&docs)
            .oneshot(get("/api-docs/openapi.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
