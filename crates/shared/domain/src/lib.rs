//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the `Email` value object, the `User` entity, password hashing and the
//! data transfer objects the service exchanges with its callers.

pub mod constants;
pub mod email;
pub mod error;
pub mod password;
pub mod user;

pub use constants::*;
pub use email::Email;
pub use error::{DomainError, DomainResult};
pub use password::{validate_password_strength, Argon2Hasher, PasswordHasher};
pub use user::{ChangePassword, CreateUser, UpdateUser, User, UserListResponse, UserResponse};
