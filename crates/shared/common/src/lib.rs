//! Common utilities shared across services.
//!
//! This crate provides:
//! - Unified error handling and its HTTP mapping
//! - Configuration structures loaded from the environment

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, FieldErrors, OptionExt, ResultExt};
