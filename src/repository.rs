use crate::error::RepoError;
use crate::models::{CreateItemRequest, Item, UpdateUserRequest, User};
use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc};
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract used by handlers and by the identity provider. Handlers only
/// see this trait, so tests can swap the SQLite implementation for a stub.
///
/// **Send + Sync + async_trait** are required to make `Arc<dyn Repository>` shareable
/// across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Item Store ---
    /// Inserts a record and returns it with its newly allocated id.
    async fn create_item(&self, req: CreateItemRequest) -> Result<Item, RepoError>;
    async fn get_item(&self, id: i64) -> Result<Option<Item>, RepoError>;
    /// All items in insertion order. Empty when the table is empty.
    async fn list_items(&self) -> Result<Vec<Item>, RepoError>;
    /// Idempotent: returns the number of rows removed, which is 0 for an unknown id.
    async fn delete_item(&self, id: i64) -> Result<u64, RepoError>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    /// Fails with `RepoError::Conflict` when the email is already registered.
    async fn create_user(&self, user: User) -> Result<User, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    async fn update_user_flags(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepoError>;
    /// Replaces the email and/or password hash. `None` keeps the stored value. A taken
    /// email fails with `RepoError::Conflict`.
    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: Option<String>,
        hashed_password: Option<String>,
    ) -> Result<Option<User>, RepoError>;
    /// Returns the number of rows removed, which is 0 for an unknown id.
    async fn delete_user(&self, id: Uuid) -> Result<u64, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// connect_pool
///
/// Opens the shared SQLite pool. `mode=rwc` in the URL creates the file if missing.
/// Foreign keys are on and the WAL journal lets readers proceed during writes.
pub async fn connect_pool(db_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// run_migrations
///
/// Applies the embedded `migrations/` directory. Safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// SqliteRepository
///
/// The concrete implementation of `Repository`, backed by SQLite through an `SqlitePool`.
/// Each method runs exactly one statement on a pooled connection.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    /// create_item
    ///
    /// Single `INSERT ... RETURNING`, so the id and the stored row come back in one round trip.
    async fn create_item(&self, req: CreateItemRequest) -> Result<Item, RepoError> {
        sqlx::query_as::<_, Item>(
            "INSERT INTO items (item_name, price, phone) VALUES (?, ?, ?) \
             RETURNING id, item_name, price, phone",
        )
        .bind(req.item_name)
        .bind(req.price)
        .bind(req.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("create_item error: {:?}", e);
            RepoError::Database(e)
        })
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>, RepoError> {
        sqlx::query_as::<_, Item>("SELECT id, item_name, price, phone FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("get_item error: {:?}", e);
                RepoError::Database(e)
            })
    }

    async fn list_items(&self) -> Result<Vec<Item>, RepoError> {
        sqlx::query_as::<_, Item>("SELECT id, item_name, price, phone FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("list_items error: {:?}", e);
                RepoError::Database(e)
            })
    }

    /// delete_item
    ///
    /// No existence check: a missing id simply affects zero rows.
    async fn delete_item(&self, id: i64) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("delete_item error: {:?}", e);
                RepoError::Database(e)
            })?;
        Ok(result.rows_affected())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, is_active, is_verified, is_superuser \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::Database)
    }

    /// get_user_by_email
    ///
    /// Emails are stored lower-cased, so the lookup lower-cases its argument as well.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, is_active, is_verified, is_superuser \
             FROM users WHERE email = ?",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::Database)
    }

    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, hashed_password, is_active, is_verified, is_superuser) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, email, hashed_password, is_active, is_verified, is_superuser",
        )
        .bind(user.id)
        .bind(user.email.to_lowercase())
        .bind(user.hashed_password)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, is_active, is_verified, is_superuser \
             FROM users ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::Database)
    }

    /// update_user_flags
    ///
    /// Uses COALESCE so absent flags keep their stored value. Returns `None` for an unknown id.
    async fn update_user_flags(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET \
                is_active = COALESCE(?, is_active), \
                is_verified = COALESCE(?, is_verified), \
                is_superuser = COALESCE(?, is_superuser) \
             WHERE id = ? \
             RETURNING id, email, hashed_password, is_active, is_verified, is_superuser",
        )
        .bind(req.is_active)
        .bind(req.is_verified)
        .bind(req.is_superuser)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::Database)
    }

    /// update_user_credentials
    ///
    /// Same COALESCE pattern as the flag update. Emails are lower-cased like on insert.
    async fn update_user_credentials(
        &self,
        id: Uuid,
        email: Option<String>,
        hashed_password: Option<String>,
    ) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET \
                email = COALESCE(?, email), \
                hashed_password = COALESCE(?, hashed_password) \
             WHERE id = ? \
             RETURNING id, email, hashed_password, is_active, is_verified, is_superuser",
        )
        .bind(email.map(|e| e.to_lowercase()))
        .bind(hashed_password)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    async fn delete_user(&self, id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("delete_user error: {:?}", e);
                RepoError::Database(e)
            })?;
        Ok(result.rows_affected())
    }
}
