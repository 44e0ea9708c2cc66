//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and owns the transaction boundary:
//! begin, run the caller's closure, then commit or roll back. Units of work
//! are flat; a closure must not open another one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};

use crate::repository::{TxUserRepository, UserRepository, UserStore};
use common::{AppError, AppResult, ResultExt};

/// Unit of Work trait for dependency injection.
///
/// Not object safe because of the generic `transaction`; services are
/// generic over it instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    /// Repository outside any transaction
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Commits when the closure returns `Ok`, rolls back and returns the
    /// original error otherwise. A panic inside the closure rolls back and
    /// then resumes unwinding.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> BoxFuture<'a, AppResult<T>> + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
pub struct TransactionContext<'a> {
    users: &'a (dyn UserRepository + 'a),
}

impl<'a> TransactionContext<'a> {
    pub fn new(users: &'a (dyn UserRepository + 'a)) -> Self {
        Self { users }
    }

    /// User repository bound to this transaction
    pub fn users(&self) -> &'a (dyn UserRepository + 'a) {
        self.users
    }
}

/// Concrete implementation of UnitOfWork
#[derive(Clone)]
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        Self { db, user_repo }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> BoxFuture<'a, AppResult<T>> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)
            .context("begin transaction")?;

        let repo = TxUserRepository::new(&txn);
        let outcome = AssertUnwindSafe(f(TransactionContext::new(&repo)))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                txn.commit()
                    .await
                    .map_err(AppError::from)
                    .context("commit transaction")?;
                Ok(result)
            }
            Ok(Err(e)) => {
                rollback(txn).await;
                Err(e)
            }
            Err(panic) => {
                tracing::error!("Transaction closure panicked, rolling back");
                rollback(txn).await;
                std::panic::resume_unwind(panic)
            }
        }
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(rollback_err) = txn.rollback().await {
        tracing::error!("Transaction rollback failed: {}", rollback_err);
    }
}
