//! User handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{ChangePassword, CreateUser, UpdateUser, UserListResponse, UserResponse};

use crate::http::extractors::{QueryParams, UserId, ValidatedJson};
use crate::http::state::AppState;

// Length caps mirror the column sizes and domain::constants.

/// User registration request
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(max = 255, message = "Email is too long"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(max = 100, message = "Name is too long"))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// At least 8 characters
    #[validate(length(max = 128, message = "Password is too long"))]
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Profile update request; both fields are replaced
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(max = 100, message = "Name is too long"))]
    #[schema(example = "Jane Roe")]
    pub name: String,
    #[validate(length(max = 255, message = "Email is too long"))]
    #[schema(example = "jane.roe@example.com")]
    pub email: String,
}

/// Password change request
#[derive(Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(max = 128, message = "Password is too long"))]
    pub old_password: String,
    /// At least 8 characters
    #[validate(length(max = 128, message = "Password is too long"))]
    pub new_password: String,
}

/// Paging parameters; out-of-range values are clamped, not rejected
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Page size, default 10, max 100
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    /// Rows to skip, default 0
    #[serde(default, deserialize_with = "lenient_int")]
    pub offset: Option<i64>,
}

/// Empty or non-numeric paging values count as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// Generic confirmation body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Password changed successfully")]
    pub message: String,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/password", post(change_password))
        .route("/users/:id/activate", post(activate_user))
        .route("/users/:id/deactivate", post(deactivate_user))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid body, email or password"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .create_user(CreateUser {
            email: payload.email,
            name: payload.name,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// List active users, newest first
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users", body = UserListResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> AppResult<Json<UserListResponse>> {
    let page = state
        .user_service
        .list_users(query.limit.unwrap_or(0), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(page))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(user))
}

/// Update name and email
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid ID, body or email"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email belongs to another user")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update_user(
            id,
            UpdateUser {
                name: payload.name,
                email: payload.email,
            },
        )
        .await?;
    Ok(Json(user))
}

/// Soft delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid user ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<StatusCode> {
    state.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change password after verifying the current one
#[utoipa::path(
    post,
    path = "/users/{id}/password",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid ID, body or weak new password"),
        (status = 401, description = "Current password is wrong"),
        (status = 404, description = "User not found")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    UserId(id): UserId,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .user_service
        .change_password(
            id,
            ChangePassword {
                old_password: payload.old_password,
                new_password: payload.new_password,
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Reactivate a user, including a deleted one
#[utoipa::path(
    post,
    path = "/users/{id}/activate",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email was taken while the user was inactive")
    )
)]
pub async fn activate_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.activate_user(id).await?;
    Ok(Json(user))
}

/// Deactivate an active user
#[utoipa::path(
    post,
    path = "/users/{id}/deactivate",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deactivated", body = UserResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.deactivate_user(id).await?;
    Ok(Json(user))
}
