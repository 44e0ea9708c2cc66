//! Application state for dependency injection.

use std::sync::Arc;

use crate::infra::HealthProbe;
use crate::service::UserService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub db: Arc<dyn HealthProbe>,
}

impl AppState {
    /// Create new app state.
    pub fn new(user_service: Arc<dyn UserService>, db: Arc<dyn HealthProbe>) -> Self {
        Self { user_service, db }
    }
}
