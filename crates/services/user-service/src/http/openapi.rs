//! OpenAPI documentation.

use utoipa::OpenApi;

use domain::{UserListResponse, UserResponse};

use crate::http::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::http::handlers::user_handler::{
    ChangePasswordRequest, CreateUserRequest, MessageResponse, UpdateUserRequest,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::http::handlers::health_handler::health_check,
        crate::http::handlers::user_handler::create_user,
        crate::http::handlers::user_handler::list_users,
        crate::http::handlers::user_handler::get_user,
        crate::http::handlers::user_handler::update_user,
        crate::http::handlers::user_handler::delete_user,
        crate::http::handlers::user_handler::change_password,
        crate::http::handlers::user_handler::activate_user,
        crate::http::handlers::user_handler::deactivate_user,
    ),
    components(
        schemas(
            CreateUserRequest,
            UpdateUserRequest,
            ChangePasswordRequest,
            MessageResponse,
            UserResponse,
            UserListResponse,
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
        )
    ),
    tags(
        (name = "Users", description = "User account management"),
        (name = "Health", description = "Liveness and dependency checks"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_every_user_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/health",
            "/users",
            "/users/{id}",
            "/users/{id}/password",
            "/users/{id}/activate",
            "/users/{id}/deactivate",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
