// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::auth_gate,
    models::{CredentialsRequest, DeleteResponse, RecordContent, TokenResponse, WriteResponse},
    pipeline::WriteChunk,
    state::AppState,
    storage::RecordSummary,
};

pub mod health;
pub mod ndjson;
pub mod records;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route(
            "/records",
            get(records::list_records).post(records::write_record),
        )
        .route(
            "/records/{id}",
            get(records::read_record).delete(records::delete_record),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(state.clone(), auth_gate))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::register,
        users::login,
        records::list_records,
        records::read_record,
        records::write_record,
        records::delete_record
    ),
    components(
        schemas(
            CredentialsRequest,
            TokenResponse,
            RecordSummary,
            RecordContent,
            WriteChunk,
            WriteResponse,
            DeleteResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Users", description = "Registration and login"),
        (name = "Records", description = "Encrypted record storage"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::api::ndjson::{encode_frame, CONTENT_TYPE};
    use crate::crypto::MasterKey;
    use crate::storage::MemoryStore;

    pub(crate) fn test_state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            MasterKey::new(b"0123456789abcdef".to_vec()).unwrap(),
            b"router-test-secret",
        )
    }

    pub(crate) fn upload_body(chunks: &[WriteChunk]) -> Body {
        let bytes: Vec<u8> = chunks
            .iter()
            .flat_map(|chunk| encode_frame(chunk).unwrap())
            .collect();
        Body::from(bytes)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed(method: &str, uri: &str, token: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body)
            .unwrap()
    }

    async fn register(app: &Router, login: &str) -> String {
        let (status, body) = call(
            app,
            post_json(
                "/v1/users/register",
                serde_json::json!({ "login": login, "password": "pw1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["ok"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn storage_routes_require_token() {
        let app = router(test_state());

        let request = Request::get("/v1/records").body(Body::empty()).unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_auth_header");

        let request = authed("GET", "/v1/records", "not-a-token", Body::empty());
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "malformed_token");
    }

    #[tokio::test]
    async fn token_from_other_secret_is_rejected() {
        let app = router(test_state());
        let foreign = crate::auth::TokenKeys::new(b"someone-else")
            .issue(1, "alice")
            .unwrap();

        let (status, body) = call(&app, authed("GET", "/v1/records", &foreign, Body::empty())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_signature");
    }

    #[tokio::test]
    async fn identity_routes_bypass_gate() {
        let app = router(test_state());
        let token = register(&app, "alice").await;
        assert!(!token.is_empty());

        let (status, body) = call(
            &app,
            post_json(
                "/v1/users/login",
                serde_json::json!({ "login": "alice", "password": "wrong" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "login or password incorrect");
    }

    #[tokio::test]
    async fn malformed_credentials_body_is_bad_request() {
        let app = router(test_state());
        let request = Request::post("/v1/users/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"login\":"))
            .unwrap();

        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn record_lifecycle_over_http() {
        let app = router(test_state());
        let token = register(&app, "alice").await;

        let upload = upload_body(&[
            WriteChunk::new("n", "text", "abc"),
            WriteChunk::new("", "", "def"),
        ]);
        let (status, body) = call(&app, authed("POST", "/v1/records", &token, upload)).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["ok"]["id"].as_u64().unwrap();

        let (_, body) = call(&app, authed("GET", "/v1/records", &token, Body::empty())).await;
        let listed = body["ok"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], id);
        assert_eq!(listed[0]["name"], "n");
        assert_eq!(listed[0]["kind"], "text");
        assert!(listed[0].get("cipher_value").is_none());

        let uri = format!("/v1/records/{id}");
        let (_, body) = call(&app, authed("GET", &uri, &token, Body::empty())).await;
        assert_eq!(body["ok"]["data"], "YWJjZGVm");

        let (_, body) = call(&app, authed("DELETE", &uri, &token, Body::empty())).await;
        assert_eq!(body["ok"]["deleted"], 1);

        let (status, body) = call(&app, authed("GET", &uri, &token, Body::empty())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "record not found");
    }

    #[tokio::test]
    async fn other_users_records_look_missing() {
        let app = router(test_state());
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let upload = upload_body(&[WriteChunk::new("secret", "text", "alice-only")]);
        let (_, body) = call(&app, authed("POST", "/v1/records", &alice, upload)).await;
        let id = body["ok"]["id"].as_u64().unwrap();

        let uri = format!("/v1/records/{id}");
        let (_, foreign) = call(&app, authed("GET", &uri, &bob, Body::empty())).await;
        let (_, missing) = call(&app, authed("GET", "/v1/records/9999", &bob, Body::empty())).await;
        assert_eq!(foreign, missing);
        assert_eq!(foreign["error"], "record not found");

        let (_, listed) = call(&app, authed("GET", "/v1/records", &bob, Body::empty())).await;
        assert_eq!(listed["ok"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn undecodable_upload_is_a_business_error() {
        let app = router(test_state());
        let token = register(&app, "alice").await;

        let body = Body::from("{\"chunk\":\"YWJj\"}\nnot json\n");
        let (status, reply) = call(&app, authed("POST", "/v1/records", &token, body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["error"], "failed receive chunk");

        let (_, listed) = call(&app, authed("GET", "/v1/records", &token, Body::empty())).await;
        assert_eq!(listed["ok"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn health_and_docs_are_public() {
        let app = router(test_state());

        let (status, body) = call(&app, Request::get("/health/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, doc) = call(
            &app,
            Request::get("/api-doc/openapi.json").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/v1/records/{id}"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
