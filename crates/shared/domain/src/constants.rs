//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Upper bound accepted for a plain-text password at the HTTP boundary
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum display name length (matches the `users.name` column)
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum email length (matches the `users.email` column)
pub const MAX_EMAIL_LENGTH: usize = 255;

// =============================================================================
// Pagination
// =============================================================================

/// Page size used when the caller asks for zero or a negative limit
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a caller can request
pub const MAX_PAGE_LIMIT: i64 = 100;
