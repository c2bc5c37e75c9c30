use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use super::{post_repo, user_repo, FeedStore, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::{Post, User, UserSummary};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and apply the embedded migrations.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            max_connections = config.max_connections,
            "Connected to database and applied migrations"
        );

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(post_repo::find_all_posts(&self.pool).await?)
    }

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        Ok(post_repo::insert_post(&self.pool, post).await?)
    }

    async fn save_post(&self, post: &Post) -> StoreResult<()> {
        Ok(post_repo::update_post(&self.pool, post).await?)
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<bool> {
        Ok(post_repo::delete_post(&self.pool, post_id).await?)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(user_repo::find_user_by_id(&self.pool, user_id).await?)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        Ok(user_repo::upsert_user(&self.pool, user).await?)
    }

    async fn find_user_summaries(
        &self,
        user_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, UserSummary>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let summaries = user_repo::find_summaries(&self.pool, user_ids).await?;
        Ok(summaries.into_iter().map(|s| (s.id, s)).collect())
    }
}
