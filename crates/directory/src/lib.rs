//! SQLite-backed directory for courier.
//!
//! Holds the three persisted collections: per-chat flow contexts, domains
//! with their id-keyed memberships, and relay groups. Membership mutations
//! run inside single transactions so concurrent join/approve/deny on the
//! same domain cannot lose an update.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod contexts;
pub mod domains;
pub mod groups;

pub use {
    contexts::ContextStore,
    domains::{ApproveOutcome, DenyOutcome, DomainRecord, DomainStore, JoinOutcome},
    groups::{GroupRecord, GroupStore},
};

use courier_common::Result;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Initialize the directory schema.
///
/// Should be called at application startup before constructing the stores.
/// Safe to call repeatedly.
pub async fn init_schema(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS contexts (
            chat_id    INTEGER PRIMARY KEY,
            value      TEXT    NOT NULL,
            updated_at INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS domains (
            handle           TEXT    PRIMARY KEY,
            admin_id         INTEGER NOT NULL,
            admin_first_name TEXT    NOT NULL,
            admin_last_name  TEXT,
            admin_username   TEXT,
            created_at       INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS domain_members (
            domain     TEXT    NOT NULL REFERENCES domains(handle),
            user_id    INTEGER NOT NULL,
            first_name TEXT    NOT NULL,
            last_name  TEXT,
            username   TEXT,
            status     TEXT    NOT NULL CHECK (status IN ('member', 'pending')),
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (domain, user_id)
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS groups (
            handle     TEXT    PRIMARY KEY,
            domain     TEXT    NOT NULL REFERENCES domains(handle),
            chat_id    INTEGER NOT NULL,
            name       TEXT,
            created_at INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_domains_admin_id ON domains(admin_id)")
        .execute(pool)
        .await
        .ok();
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_domain_members_user ON domain_members(user_id)")
        .execute(pool)
        .await
        .ok();
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_groups_domain ON groups(domain)")
        .execute(pool)
        .await
        .ok();
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_groups_chat_id ON groups(chat_id)")
        .execute(pool)
        .await
        .ok();

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    init_schema(&pool).await.expect("init schema");
    pool
}
