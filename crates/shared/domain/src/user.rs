//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::email::Email;
use crate::error::{DomainError, DomainResult};

/// User domain entity.
///
/// Fields are private so every mutation goes through a method that keeps
/// `updated_at` fresh and never lets it fall behind `created_at`.
#[derive(Clone)]
pub struct User {
    id: Uuid,
    email: Email,
    name: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Don't expose hash in debug output
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Create a new, active user with a fresh id.
    ///
    /// # Errors
    /// Returns a validation error if the name is blank or the hash is empty.
    pub fn new(email: Email, name: &str, password_hash: String) -> DomainResult<Self> {
        let name = validate_name(name)?;
        if password_hash.is_empty() {
            return Err(DomainError::validation("Password hash is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a user from persisted state. Only the storage adapter calls this.
    pub fn rehydrate(
        id: Uuid,
        email: Email,
        name: String,
        password_hash: String,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            password_hash,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace name and email together.
    pub fn update_profile(&mut self, name: &str, email: Email) -> DomainResult<()> {
        self.name = validate_name(name)?;
        self.email = email;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    /// Soft delete: the row stays, the user stops being visible.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Swap in an already hashed password.
    pub fn change_password(&mut self, new_hash: String) -> DomainResult<()> {
        if new_hash.is_empty() {
            return Err(DomainError::validation("Password hash is required"));
        }
        self.password_hash = new_hash;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("Name is required"));
    }
    Ok(trimmed.to_string())
}

/// User creation input
#[derive(Clone, Deserialize)]
pub struct CreateUser {
    /// User email address
    pub email: String,
    /// User display name
    pub name: String,
    /// User password (minimum 8 characters)
    pub password: String,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Profile update input. Both fields are replaced.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
}

/// Password change input
#[derive(Clone, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

impl std::fmt::Debug for ChangePassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangePassword { .. }")
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    /// Unique user identifier
    pub id: Uuid,
    /// Normalized email address
    #[cfg_attr(feature = "openapi", schema(example = "jane@example.com"))]
    pub email: String,
    /// User display name
    #[cfg_attr(feature = "openapi", schema(example = "Jane Doe"))]
    pub name: String,
    /// False once the account has been deleted
    pub is_active: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_string(),
            name: user.name.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into_string(),
            name: user.name,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// One page of users
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    /// Number of active users overall
    pub total: u64,
    /// Effective page size after clamping
    pub limit: i64,
    /// Effective offset after clamping
    pub offset: i64,
    /// Whether another page follows this one
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    #[test]
    fn test_new_user_defaults() {
        let user = User::new(email("a@x.com"), "Alice", "hash".into()).unwrap();

        assert!(user.is_active());
        assert_eq!(user.name(), "Alice");
        assert_eq!(user.email().as_str(), "a@x.com");
        assert_eq!(user.created_at(), user.updated_at());
        assert_ne!(user.id(), Uuid::nil());
    }

    #[test]
    fn test_new_user_rejects_blank_name_and_hash() {
        assert!(matches!(
            User::new(email("a@x.com"), "   ", "hash".into()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            User::new(email("a@x.com"), "Alice", String::new()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_update_profile_refreshes_timestamp() {
        let mut user = User::new(email("a@x.com"), "Alice", "hash".into()).unwrap();
        let created = user.created_at();

        user.update_profile("Alicia", email("alicia@x.com")).unwrap();

        assert_eq!(user.name(), "Alicia");
        assert_eq!(user.email().as_str(), "alicia@x.com");
        assert!(user.updated_at() >= created);
        assert_eq!(user.created_at(), created);
    }

    #[test]
    fn test_update_profile_rejects_empty_name_without_mutating() {
        let mut user = User::new(email("a@x.com"), "Alice", "hash".into()).unwrap();

        let result = user.update_profile("", email("b@x.com"));

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(user.email().as_str(), "a@x.com");
    }

    #[test]
    fn test_activate_and_deactivate_are_idempotent() {
        let mut user = User::new(email("a@x.com"), "Alice", "hash".into()).unwrap();

        user.deactivate();
        user.deactivate();
        assert!(!user.is_active());

        user.activate();
        user.activate();
        assert!(user.is_active());
        assert!(user.updated_at() >= user.created_at());
    }

    #[test]
    fn test_change_password() {
        let mut user = User::new(email("a@x.com"), "Alice", "old".into()).unwrap();

        assert!(user.change_password(String::new()).is_err());
        assert_eq!(user.password_hash(), "old");

        user.change_password("new".into()).unwrap();
        assert_eq!(user.password_hash(), "new");
    }

    #[test]
    fn test_debug_redacts_hash() {
        let user = User::new(email("a@x.com"), "Alice", "secret-hash".into()).unwrap();
        let rendered = format!("{:?}", user);
        assert!(!rendered.contains("secret-hash"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_response_omits_hash() {
        let user = User::new(email("a@x.com"), "Alice", "secret-hash".into()).unwrap();
        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"is_active\":true"));
    }
}
