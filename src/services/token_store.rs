use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tokio::sync::RwLock;

use crate::database::DbPool;
use crate::entities::refresh_token_entity as refresh_tokens;
use crate::error::AppResult;

/// Server-side registry of live refresh tokens.
///
/// A refresh token is only honoured while the store still maps it to its
/// owner, so revoking an entry ends that session even though the JWT itself
/// is still validly signed.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn issue(&self, user_id: i64, token: &str, expires_at: DateTime<Utc>) -> AppResult<()>;

    /// Owner of a live token. Expired entries count as absent.
    async fn owner_of(&self, token: &str) -> AppResult<Option<i64>>;

    async fn revoke(&self, token: &str) -> AppResult<()>;

    /// Ends every session of `user_id`, returning how many were dropped.
    async fn revoke_all(&self, user_id: i64) -> AppResult<u64>;
}

pub type SharedTokenStore = Arc<dyn TokenStore>;

/// Tokens are stored as an MD5 digest, never in clear.
pub fn token_digest(token: &str) -> String {
    format!("{:x}", md5::compute(token.as_bytes()))
}

#[derive(Clone)]
pub struct DbTokenStore {
    pool: DbPool,
}

impl DbTokenStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for DbTokenStore {
    async fn issue(&self, user_id: i64, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        refresh_tokens::ActiveModel {
            user_id: Set(user_id),
            token_digest: Set(token_digest(token)),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn owner_of(&self, token: &str) -> AppResult<Option<i64>> {
        let row = refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::TokenDigest.eq(token_digest(token)))
            .one(self.pool.as_ref())
            .await?;

        Ok(row
            .filter(|r| !r.is_expired(Utc::now()))
            .map(|r| r.user_id))
    }

    async fn revoke(&self, token: &str) -> AppResult<()> {
        refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::TokenDigest.eq(token_digest(token)))
            .exec(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn revoke_all(&self, user_id: i64) -> AppResult<u64> {
        let res = refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected > 0 {
            log::info!(
                "Revoked {} refresh token(s) for user {}",
                res.rows_affected,
                user_id
            );
        }
        Ok(res.rows_affected)
    }
}

/// In-process store keyed by token digest.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<RwLock<HashMap<String, (i64, DateTime<Utc>)>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn issue(&self, user_id: i64, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(token_digest(token), (user_id, expires_at));
        Ok(())
    }

    async fn owner_of(&self, token: &str) -> AppResult<Option<i64>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&token_digest(token))
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| *user_id))
    }

    async fn revoke(&self, token: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&token_digest(token));
        Ok(())
    }

    async fn revoke_all(&self, user_id: i64) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (owner, _)| *owner != user_id);
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_digest_is_stable_hex() {
        let d = token_digest("abc");
        assert_eq!(d, "900150983cd24fb0d6963f7d28e17f72");
        assert_ne!(d, token_digest("abd"));
    }

    #[tokio::test]
    async fn test_memory_store_issue_and_revoke() {
        let store = MemoryTokenStore::new();
        let later = Utc::now() + Duration::hours(1);

        store.issue(1, "t1", later).await.unwrap();
        store.issue(1, "t2", later).await.unwrap();
        store.issue(2, "t3", later).await.unwrap();

        assert_eq!(store.owner_of("t1").await.unwrap(), Some(1));
        assert_eq!(store.owner_of("nope").await.unwrap(), None);

        store.revoke("t1").await.unwrap();
        assert_eq!(store.owner_of("t1").await.unwrap(), None);
        // revoking twice is fine
        store.revoke("t1").await.unwrap();

        assert_eq!(store.revoke_all(1).await.unwrap(), 1);
        assert_eq!(store.owner_of("t2").await.unwrap(), None);
        assert_eq!(store.owner_of("t3").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_memory_store_ignores_expired_tokens() {
        let store = MemoryTokenStore::new();
        store
            .issue(5, "old", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(store.owner_of("old").await.unwrap(), None);
    }
}
