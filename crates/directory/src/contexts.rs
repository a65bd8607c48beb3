//! Per-chat flow context store.
//!
//! A chat has at most one pending flow context at a time, stored as an
//! opaque JSON document keyed by chat id. `set` is last-write-wins with no
//! merge; `reset` is idempotent. Interpretation of the document belongs to
//! the flow layer.

use courier_common::Result;

use crate::now_ms;

/// SQLite-backed context store.
pub struct ContextStore {
    pool: sqlx::SqlitePool,
}

impl ContextStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace any existing context for the chat.
    pub async fn set(&self, chat_id: i64, value: &str) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO contexts (chat_id, value, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(chat_id) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at"#,
        )
        .bind(chat_id)
        .bind(value)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the chat's context, if any.
    pub async fn get(&self, chat_id: i64) -> Result<Option<String>> {
        let value =
            sqlx::query_scalar::<_, String>("SELECT value FROM contexts WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Delete the chat's context. Returns false if there was none.
    pub async fn reset(&self, chat_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contexts WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::test_pool};

    #[tokio::test]
    async fn set_and_get() {
        let store = ContextStore::new(test_pool().await);

        store.set(42, r#"{"flow":"create_domain"}"#).await.unwrap();
        let value = store.get(42).await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"flow":"create_domain"}"#));
    }

    #[tokio::test]
    async fn get_missing_is_absent() {
        let store = ContextStore::new(test_pool().await);

        assert!(store.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites_without_merge() {
        let store = ContextStore::new(test_pool().await);

        store.set(42, "a").await.unwrap();
        store.set(42, "b").await.unwrap();
        assert_eq!(store.get(42).await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let store = ContextStore::new(test_pool().await);

        store.set(42, "a").await.unwrap();
        assert!(store.reset(42).await.unwrap());
        assert!(!store.reset(42).await.unwrap());
        assert!(store.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn contexts_are_scoped_per_chat() {
        let store = ContextStore::new(test_pool().await);

        store.set(1, "a").await.unwrap();
        store.set(2, "b").await.unwrap();
        store.reset(1).await.unwrap();

        assert!(store.get(1).await.unwrap().is_none());
        assert_eq!(store.get(2).await.unwrap().as_deref(), Some("b"));
    }
}
