#![allow(dead_code)]

use item_vault::{
    AppConfig, AppState,
    auth::{IdentityState, JwtCookieProvider},
    models::User,
    repository::{RepositoryState, SqliteRepository, run_migrations},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;
use uuid::Uuid;

// Stand-in for a PHC string; users created with it can never log in.
pub const UNUSABLE_HASH: &str = "not-a-real-hash";

/// In-memory database with the schema applied. A single never-recycled connection
/// keeps the same database alive for the whole test.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations.");
    pool
}

pub struct TestContext {
    pub state: AppState,
    pub pool: SqlitePool,
}

pub async fn test_context() -> TestContext {
    test_context_with(AppConfig::default()).await
}

pub async fn test_context_with(config: AppConfig) -> TestContext {
    let pool = memory_pool().await;
    let repo = Arc::new(SqliteRepository::new(pool.clone())) as RepositoryState;
    let identity = Arc::new(JwtCookieProvider::new(
        repo.clone(),
        &config.session_secret,
        config.session_lifetime_secs,
    )) as IdentityState;

    TestContext {
        state: AppState {
            repo,
            identity,
            config,
        },
        pool,
    }
}

impl TestContext {
    /// Inserts a user straight through the repository, skipping password hashing.
    pub async fn seed_user(&self, email: &str, active: bool, verified: bool, superuser: bool) -> User {
        self.state
            .repo
            .create_user(User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                hashed_password: UNUSABLE_HASH.to_string(),
                is_active: active,
                is_verified: verified,
                is_superuser: superuser,
            })
            .await
            .expect("Failed to create test user")
    }

    /// `Cookie` header value carrying a freshly issued session for `user_id`.
    pub fn cookie_for(&self, user_id: Uuid) -> String {
        let token = self
            .state
            .identity
            .issue(user_id)
            .expect("Failed to issue token");
        format!("{}={}", self.state.config.cookie_name, token)
    }

    pub async fn item_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .expect("count query failed")
    }
}
