//! In-memory fakes shared by the integration tests.
//!
//! The store enforces the same rules as the PostgreSQL schema: unique email
//! among active users, active-only lookups and newest-first listing.

#![allow(dead_code)]

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use futures::future::{BoxFuture, FutureExt};
use sea_orm::DbErr;
use uuid::Uuid;

use common::{AppError, AppResult, ServiceConfig};
use domain::{Argon2Hasher, Email, PasswordHasher, User};
use user_service_lib::http::{create_router, AppState};
use user_service_lib::infra::{HealthProbe, TransactionContext, UnitOfWork};
use user_service_lib::repository::UserRepository;
use user_service_lib::service::UserManager;

/// User table kept in a `Vec`, in insertion order.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<User>>,
    failing: AtomicBool,
}

impl InMemoryUserRepository {
    /// Make every subsequent call fail like a dropped connection.
    pub fn fail_all(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<User> {
        self.rows.lock().unwrap().clone()
    }

    pub fn restore(&self, rows: Vec<User>) {
        *self.rows.lock().unwrap() = rows;
    }

    /// Raw row, ignoring the active filter.
    pub fn row(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.id() == id).cloned()
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database(DbErr::Custom(
                "connection reset by peer".into(),
            )));
        }
        Ok(())
    }

    fn email_taken(rows: &[User], email: &Email, except: Uuid) -> bool {
        rows.iter()
            .any(|u| u.is_active() && u.email() == email && u.id() != except)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: &User) -> AppResult<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if user.is_active() && Self::email_taken(&rows, user.email(), user.id()) {
            return Err(AppError::EmailAlreadyExists);
        }
        rows.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<User> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|u| u.id() == id && u.is_active())
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<User> {
        self.check()?;
        self.row(id).ok_or(AppError::UserNotFound)
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<User> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|u| u.email() == email && u.is_active())
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if user.is_active() && Self::email_taken(&rows, user.email(), user.id()) {
            return Err(AppError::EmailAlreadyExists);
        }
        let slot = rows
            .iter_mut()
            .find(|u| u.id() == user.id())
            .ok_or(AppError::UserNotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id() == id && u.is_active())
            .ok_or(AppError::UserNotFound)?;
        user.deactivate();
        Ok(())
    }

    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        // Insertion order is creation order, so reversing gives newest first
        Ok(rows
            .iter()
            .rev()
            .filter(|u| u.is_active())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<u64> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|u| u.is_active()).count() as u64)
    }
}

/// Unit of work that snapshots the table and restores it on failure.
///
/// Transactions are serialized, which is stricter than READ COMMITTED but
/// keeps the rollback snapshot consistent.
pub struct InMemoryUnitOfWork {
    pub repo: Arc<InMemoryUserRepository>,
    tx_lock: tokio::sync::Mutex<()>,
}

impl InMemoryUnitOfWork {
    pub fn new(repo: Arc<InMemoryUserRepository>) -> Self {
        Self {
            repo,
            tx_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> BoxFuture<'a, AppResult<T>> + Send,
        T: Send,
    {
        let _guard = self.tx_lock.lock().await;
        let before = self.repo.snapshot();

        let outcome = AssertUnwindSafe(f(TransactionContext::new(self.repo.as_ref())))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                self.repo.restore(before);
                Err(e)
            }
            Err(panic) => {
                self.repo.restore(before);
                std::panic::resume_unwind(panic)
            }
        }
    }
}

/// Health probe with a switchable outcome.
#[derive(Default)]
pub struct StubProbe {
    pub down: AtomicBool,
}

#[async_trait]
impl HealthProbe for StubProbe {
    async fn ping(&self) -> Result<(), DbErr> {
        if self.down.load(Ordering::SeqCst) {
            Err(DbErr::Custom("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

/// Cheap Argon2 parameters; production costs make the suite crawl.
pub fn fast_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::with_params(8, 1, 1).unwrap())
}

pub struct TestContext {
    pub repo: Arc<InMemoryUserRepository>,
    pub uow: Arc<InMemoryUnitOfWork>,
    pub service: Arc<UserManager<InMemoryUnitOfWork>>,
    pub probe: Arc<StubProbe>,
}

impl TestContext {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryUserRepository::default());
        let uow = Arc::new(InMemoryUnitOfWork::new(repo.clone()));
        let service = Arc::new(UserManager::new(uow.clone(), fast_hasher()));
        Self {
            repo,
            uow,
            service,
            probe: Arc::new(StubProbe::default()),
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState::new(self.service.clone(), self.probe.clone());
        create_router(state, &ServiceConfig::default())
    }
}
