//! User repository implementation with soft delete support.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult, OptionExt};
use domain::{Email, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Lookups only see active users unless the method name says otherwise.
/// Absent rows surface as `AppError::UserNotFound`, uniqueness violations
/// as `AppError::EmailAlreadyExists`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user
    async fn save(&self, user: &User) -> AppResult<()>;

    /// Find active user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<User>;

    /// Find user by ID including soft-deleted
    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<User>;

    /// Find active user by (normalized) email
    async fn find_by_email(&self, email: &Email) -> AppResult<User>;

    /// Overwrite every mutable column of an existing row
    async fn update(&self, user: &User) -> AppResult<()>;

    /// Soft delete an active user
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Active users, newest first
    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>>;

    /// Number of active users
    async fn count(&self) -> AppResult<u64>;
}

/// Concrete implementation of UserRepository backed by the connection pool
#[derive(Clone)]
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Transaction-bound repository; every call runs inside the borrowed transaction.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn save(&self, user: &User) -> AppResult<()> {
        queries::save(&self.db, user).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<User> {
        queries::find_by_id(&self.db, id, true).await
    }

    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<User> {
        queries::find_by_id(&self.db, id, false).await
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<User> {
        queries::find_by_email(&self.db, email).await
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        queries::update(&self.db, user).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        queries::soft_delete(&self.db, id).await
    }

    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>> {
        queries::list(&self.db, limit, offset).await
    }

    async fn count(&self) -> AppResult<u64> {
        queries::count(&self.db).await
    }
}

#[async_trait]
impl UserRepository for TxUserRepository<'_> {
    async fn save(&self, user: &User) -> AppResult<()> {
        queries::save(self.txn, user).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<User> {
        queries::find_by_id(self.txn, id, true).await
    }

    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<User> {
        queries::find_by_id(self.txn, id, false).await
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<User> {
        queries::find_by_email(self.txn, email).await
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        queries::update(self.txn, user).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        queries::soft_delete(self.txn, id).await
    }

    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>> {
        queries::list(self.txn, limit, offset).await
    }

    async fn count(&self) -> AppResult<u64> {
        queries::count(self.txn).await
    }
}

/// Map a failed write, turning the unique index violation into a conflict.
fn map_write_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailAlreadyExists,
        _ => AppError::Database(err),
    }
}

/// Statements shared by the pooled and the transactional repository.
mod queries {
    use super::*;

    pub(super) async fn save<C: ConnectionTrait>(db: &C, user: &User) -> AppResult<()> {
        UserEntity::insert(ActiveModel::from(user))
            .exec_without_returning(db)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    pub(super) async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        active_only: bool,
    ) -> AppResult<User> {
        let mut query = UserEntity::find_by_id(id);
        if active_only {
            query = query.filter(user::Column::IsActive.eq(true));
        }

        query.one(db).await?.ok_or_not_found()?.try_into()
    }

    pub(super) async fn find_by_email<C: ConnectionTrait>(db: &C, email: &Email) -> AppResult<User> {
        UserEntity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_not_found()?
            .try_into()
    }

    pub(super) async fn update<C: ConnectionTrait>(db: &C, user: &User) -> AppResult<()> {
        let result = UserEntity::update_many()
            .set(ActiveModel::from(user))
            .filter(user::Column::Id.eq(user.id()))
            .exec(db)
            .await
            .map_err(map_write_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub(super) async fn soft_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<()> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::IsActive, Expr::value(false))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::IsActive.eq(true))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub(super) async fn list<C: ConnectionTrait>(
        db: &C,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<User>> {
        UserEntity::find()
            .filter(user::Column::IsActive.eq(true))
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub(super) async fn count<C: ConnectionTrait>(db: &C) -> AppResult<u64> {
        Ok(UserEntity::find()
            .filter(user::Column::IsActive.eq(true))
            .count(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn row(email: &str, minutes_ago: i64) -> user::Model {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        user::Model {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test User".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_maps_row() {
        let model = row("a@x.com", 0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model.clone()]])
            .into_connection();

        let user = UserStore::new(db).find_by_id(model.id).await.unwrap();

        assert_eq!(user.id(), model.id);
        assert_eq!(user.email().as_str(), "a@x.com");
        assert!(user.is_active());
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = UserStore::new(db).find_by_id(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_find_by_email_filters_active_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let store = UserStore::new(db.clone());

        let email = Email::parse("A@X.com").unwrap();
        let _ = store.find_by_email(&email).await;

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("is_active"));
        assert!(log.contains("a@x.com"));
    }

    #[tokio::test]
    async fn test_malformed_stored_email_is_internal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("not-an-email", 0)]])
            .into_connection();

        let result = UserStore::new(db).find_by_id(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_delete_without_match_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = UserStore::new(db).delete(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_update_touches_one_row() {
        let model = row("a@x.com", 5);
        let user = User::try_from(model).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let store = UserStore::new(db);

        assert!(store.update(&user).await.is_ok());
        assert!(matches!(
            store.update(&user).await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_preserves_query_order() {
        let newer = row("b@x.com", 1);
        let older = row("a@x.com", 10);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![newer.clone(), older.clone()]])
            .into_connection();

        let users = UserStore::new(db.clone()).list(10, 0).await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id(), newer.id);
        assert_eq!(users[1].id(), older.id);
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("ORDER BY"));
        assert!(log.contains("DESC"));
    }

    #[test]
    fn test_non_constraint_write_errors_stay_database_errors() {
        let err = map_write_err(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, AppError::Database(_)));
    }
}
