use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::users::create_user,
        crate::routes::users::get_user
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::response::UserEnvelope,
            crate::routes::health::HealthResponse,
            crate::routes::users::CreateUserBody,
            crate::routes::users::UserResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Users", description = "User directory")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
