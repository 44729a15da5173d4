use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use userdir_api::{build_router, AppState};
use userdir_users::{MockUserRepository, UserService};

type TestResult<T = ()> = anyhow::Result<T>;

struct TestContext {
    repository: MockUserRepository,
    state: AppState,
}

impl TestContext {
    fn new() -> Self {
        Self::with_repository(MockUserRepository::new())
    }

    fn with_repository(repository: MockUserRepository) -> Self {
        let service = UserService::with_repository(Arc::new(repository.clone()));
        Self {
            repository,
            state: AppState::new(Arc::new(service)),
        }
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> TestResult<(StatusCode, Value)> {
        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    async fn post_user(&self, body: Value) -> TestResult<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    async fn get_user(&self, id: &str) -> TestResult<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("/api/users/{id}"))
            .body(Body::empty())?;
        self.send(request).await
    }
}

fn alice() -> Value {
    json!({
        "username": "Alice",
        "email": "A@X.com",
        "fullName": "Alice A",
        "password": "s3cr3t"
    })
}

#[tokio::test]
async fn create_user_returns_created_envelope() -> TestResult {
    let ctx = TestContext::new();

    let (status, body) = ctx.post_user(alice()).await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["fullName"], "Alice A");
    assert!(body["data"]["createdAt"].is_string());
    assert!(body["data"].get("password").is_none());
    assert!(!body.to_string().contains("s3cr3t"));
    Ok(())
}

#[tokio::test]
async fn create_user_rejects_missing_or_blank_fields() -> TestResult {
    let ctx = TestContext::new();

    for field in ["username", "email", "fullName", "password"] {
        let mut missing = alice();
        if let Some(body) = missing.as_object_mut() {
            body.remove(field);
        }
        let (status, body) = ctx.post_user(missing).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {field}");
        assert_eq!(body["message"], "All fields are required");
        assert_eq!(body["errors"], json!([format!("{field} is required")]));

        let mut blank = alice();
        blank[field] = json!("   ");
        let (status, body) = ctx.post_user(blank).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "blank {field}");
        assert_eq!(body["errors"], json!([format!("{field} is required")]));
    }

    assert_eq!(ctx.repository.create_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn create_user_lists_every_missing_field() -> TestResult {
    let ctx = TestContext::new();

    let (status, body) = ctx.post_user(json!({ "email": "a@x.com" })).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"],
        json!([
            "username is required",
            "fullName is required",
            "password is required"
        ])
    );
    assert_eq!(body["data"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn create_user_conflict_uses_error_envelope() -> TestResult {
    let ctx = TestContext::new();
    ctx.post_user(alice()).await?;

    let mut clash = alice();
    clash["email"] = json!("other@x.com");
    let (status, body) = ctx.post_user(clash).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({
            "statusCode": 409,
            "data": null,
            "message": "User with email or username already exists",
            "success": false,
            "errors": []
        })
    );
    assert_eq!(ctx.repository.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn create_user_internal_failure_hides_cause() -> TestResult {
    let ctx = TestContext::with_repository(MockUserRepository::new().with_storage_down());

    let (status, body) = ctx.post_user(alice()).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Something went wrong while creating the user");
    assert!(!body.to_string().contains("connection refused"));
    Ok(())
}

#[tokio::test]
async fn create_user_rejects_malformed_json() -> TestResult {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;

    let (status, body) = ctx.send(request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn get_user_round_trips_created_user() -> TestResult {
    let ctx = TestContext::new();
    let (_, created) = ctx.post_user(alice()).await?;
    let id = created["data"]["id"].to_string();

    let (status, body) = ctx.get_user(&id).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User fetched successfully");
    assert_eq!(body["data"], created["data"]);
    Ok(())
}

#[tokio::test]
async fn get_user_absent_is_not_found() -> TestResult {
    let ctx = TestContext::new();

    let (status, body) = ctx.get_user("999").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    assert_eq!(body["data"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn health_reports_ok() -> TestResult {
    let ctx = TestContext::new();
    let request = Request::builder().uri("/health").body(Body::empty())?;

    let (status, body) = ctx.send(request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn openapi_document_lists_user_routes() -> TestResult {
    let ctx = TestContext::new();
    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())?;

    let (status, body) = ctx.send(request).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/users"]["post"].is_object());
    assert!(body["paths"]["/api/users/{user_id}"]["get"].is_object());
    Ok(())
}
