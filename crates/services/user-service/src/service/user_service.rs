//! User service - Handles user-related business logic.
//!
//! Enforces the business rules (required fields, password strength, email
//! uniqueness among active users) and maps entities to response DTOs.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{AppError, AppResult, FieldErrors, ResultExt};
use domain::{
    validate_password_strength, ChangePassword, CreateUser, Email, PasswordHasher, UpdateUser,
    User, UserListResponse, UserResponse, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};

use crate::infra::UnitOfWork;
use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a new active user
    async fn create_user(&self, input: CreateUser) -> AppResult<UserResponse>;

    /// Get active user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<UserResponse>;

    /// Get active user by email (any casing)
    async fn get_user_by_email(&self, email: &str) -> AppResult<UserResponse>;

    /// Replace name and email of an active user
    async fn update_user(&self, id: Uuid, input: UpdateUser) -> AppResult<UserResponse>;

    /// Soft delete; the email becomes available again
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;

    /// Reactivate a user, including soft-deleted ones
    async fn activate_user(&self, id: Uuid) -> AppResult<UserResponse>;

    async fn deactivate_user(&self, id: Uuid) -> AppResult<UserResponse>;

    /// Verify the old password and store a hash of the new one
    async fn change_password(&self, id: Uuid, input: ChangePassword) -> AppResult<()>;

    /// One page of active users, newest first. Out-of-range paging is clamped.
    async fn list_users(&self, limit: i64, offset: i64) -> AppResult<UserListResponse>;

    /// True when an active user with this email exists and the password matches
    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<bool>;
}

/// Concrete implementation of UserService using the unit of work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { uow, hasher }
    }

    fn users(&self) -> Arc<dyn UserRepository> {
        self.uow.users()
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn create_user(&self, input: CreateUser) -> AppResult<UserResponse> {
        require_fields(&[
            ("email", input.email.as_str()),
            ("name", input.name.as_str()),
            ("password", input.password.as_str()),
        ])?;
        validate_password_strength(&input.password)?;
        let email = Email::parse(&input.email)?;

        let users = self.users();
        match users.find_by_email(&email).await {
            Ok(_) => return Err(AppError::EmailAlreadyExists),
            Err(AppError::UserNotFound) => {}
            Err(e) => return Err(e.with_context("check email availability")),
        }

        let hash = hash_password(self.hasher.clone(), input.password).await?;
        let user = User::new(email, &input.name, hash)?;

        // A concurrent registration can still win the race; the unique index
        // reports it and the repository maps it to EmailAlreadyExists.
        users.save(&user).await.context("save user")?;

        tracing::info!(user_id = %user.id(), "User created");
        Ok(UserResponse::from(user))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<UserResponse> {
        let user = self.users().find_by_id(id).await.context("load user")?;
        Ok(UserResponse::from(user))
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<UserResponse> {
        let email = Email::parse(email)?;
        let user = self
            .users()
            .find_by_email(&email)
            .await
            .context("load user by email")?;
        Ok(UserResponse::from(user))
    }

    async fn update_user(&self, id: Uuid, input: UpdateUser) -> AppResult<UserResponse> {
        let user = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let users = ctx.users();
                    let mut user = users.find_by_id(id).await.context("load user")?;

                    require_fields(&[("name", input.name.as_str())])?;
                    let email = Email::parse(&input.email)?;

                    if &email != user.email() {
                        match users.find_by_email(&email).await {
                            Ok(owner) if owner.id() != id => {
                                return Err(AppError::EmailAlreadyExists)
                            }
                            Ok(_) | Err(AppError::UserNotFound) => {}
                            Err(e) => return Err(e.with_context("check email availability")),
                        }
                    }

                    user.update_profile(&input.name, email)?;
                    users.update(&user).await.context("update user")?;
                    Ok(user)
                })
            })
            .await?;

        tracing::info!(user_id = %id, "User updated");
        Ok(UserResponse::from(user))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.users().delete(id).await.context("delete user")?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn activate_user(&self, id: Uuid) -> AppResult<UserResponse> {
        let user = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let users = ctx.users();
                    let mut user = users
                        .find_by_id_with_deleted(id)
                        .await
                        .context("load user")?;
                    user.activate();
                    users.update(&user).await.context("activate user")?;
                    Ok(user)
                })
            })
            .await?;

        tracing::info!(user_id = %id, "User activated");
        Ok(UserResponse::from(user))
    }

    async fn deactivate_user(&self, id: Uuid) -> AppResult<UserResponse> {
        let user = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let users = ctx.users();
                    let mut user = users.find_by_id(id).await.context("load user")?;
                    user.deactivate();
                    users.update(&user).await.context("deactivate user")?;
                    Ok(user)
                })
            })
            .await?;

        tracing::info!(user_id = %id, "User deactivated");
        Ok(UserResponse::from(user))
    }

    async fn change_password(&self, id: Uuid, input: ChangePassword) -> AppResult<()> {
        let hasher = self.hasher.clone();

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let users = ctx.users();
                    let mut user = users.find_by_id(id).await.context("load user")?;

                    let matches = verify_password(
                        hasher.clone(),
                        input.old_password,
                        user.password_hash().to_string(),
                    )
                    .await?;
                    if !matches {
                        return Err(AppError::InvalidPassword);
                    }

                    validate_password_strength(&input.new_password)?;
                    let new_hash = hash_password(hasher, input.new_password).await?;

                    user.change_password(new_hash)?;
                    users.update(&user).await.context("update password")?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> AppResult<UserListResponse> {
        let (limit, offset) = clamp_page(limit, offset);
        let users = self.users();

        let page = users
            .list(limit as u64, offset as u64)
            .await
            .context("list users")?;
        let total = users.count().await.context("count users")?;

        Ok(UserListResponse {
            users: page.into_iter().map(UserResponse::from).collect(),
            total,
            limit,
            offset,
            has_more: (offset.saturating_add(limit) as u64) < total,
        })
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<bool> {
        let Ok(email) = Email::parse(email) else {
            return Ok(false);
        };

        let user = match self.users().find_by_email(&email).await {
            Ok(user) => user,
            Err(AppError::UserNotFound) => return Ok(false),
            Err(e) => return Err(e.with_context("load user by email")),
        };

        verify_password(
            self.hasher.clone(),
            password.to_string(),
            user.password_hash().to_string(),
        )
        .await
    }
}

/// Clamp paging input: non-positive limits fall back to the default,
/// oversized ones to the maximum, negative offsets to zero.
fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    let limit = if limit <= 0 {
        DEFAULT_PAGE_LIMIT
    } else {
        limit.min(MAX_PAGE_LIMIT)
    };
    (limit, offset.max(0))
}

fn require_fields(fields: &[(&str, &str)]) -> AppResult<()> {
    let missing: FieldErrors = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| (field.to_string(), "is required".to_string()))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let names: Vec<&str> = missing.keys().map(String::as_str).collect();
    Err(AppError::Validation {
        message: format!("Missing required fields: {}", names.join(", ")),
        fields: Some(missing),
    })
}

// Argon2 is CPU bound; keep it off the async workers.
async fn hash_password(hasher: Arc<dyn PasswordHasher>, plain_text: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&plain_text))
        .await
        .map_err(|e| AppError::internal(format!("password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn verify_password(
    hasher: Arc<dyn PasswordHasher>,
    plain_text: String,
    hash: String,
) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&plain_text, &hash))
        .await
        .map_err(|e| AppError::internal(format!("password verification task failed: {}", e)))?
        .map_err(AppError::from)
}
