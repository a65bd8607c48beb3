//! Relay group records.
//!
//! A group binds a domain to a destination chat. The display name is
//! nullable: it is resolved lazily from the platform and written back here
//! so later relays skip the metadata call.

use courier_common::Result;

use crate::now_ms;

/// A relay destination: a domain bound to a chat.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub handle: String,
    pub domain: String,
    pub chat_id: i64,
    pub name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    handle: String,
    domain: String,
    chat_id: i64,
    name: Option<String>,
}

impl From<GroupRow> for GroupRecord {
    fn from(r: GroupRow) -> Self {
        Self {
            handle: r.handle,
            domain: r.domain,
            chat_id: r.chat_id,
            name: r.name,
        }
    }
}

/// SQLite-backed group store.
pub struct GroupStore {
    pool: sqlx::SqlitePool,
}

impl GroupStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a group. Returns false if the handle is already taken (the
    /// existing record is left untouched).
    pub async fn create(
        &self,
        handle: &str,
        domain: &str,
        chat_id: i64,
        name: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"INSERT INTO groups (handle, domain, chat_id, name, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(handle) DO NOTHING"#,
        )
        .bind(handle)
        .bind(domain)
        .bind(chat_id)
        .bind(name)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, handle: &str) -> Result<Option<GroupRecord>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT handle, domain, chat_id, name FROM groups WHERE handle = ?",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Groups belonging to any of the given domains, ordered by handle.
    pub async fn in_domains(&self, domains: &[String]) -> Result<Vec<GroupRecord>> {
        if domains.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; domains.len()].join(", ");
        let sql = format!(
            "SELECT handle, domain, chat_id, name FROM groups \
             WHERE domain IN ({placeholders}) ORDER BY handle"
        );
        let mut query = sqlx::query_as::<_, GroupRow>(&sql);
        for domain in domains {
            query = query.bind(domain);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Look up a group by its destination chat.
    pub async fn by_chat(&self, chat_id: i64) -> Result<Option<GroupRecord>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT handle, domain, chat_id, name FROM groups WHERE chat_id = ? LIMIT 1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Persist a lazily-resolved display name.
    pub async fn set_name(&self, handle: &str, name: &str) -> Result<()> {
        sqlx::query("UPDATE groups SET name = ? WHERE handle = ?")
            .bind(name)
            .bind(handle)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
