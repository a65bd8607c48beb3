//! Domain records and id-keyed membership.
//!
//! A domain has exactly one admin and a membership table keyed by
//! `(domain, user_id)` with a `status` of `member` or `pending`, so a user
//! id can never be both a member and waitlisted. Display fields on a
//! membership row are just the latest cached values from the platform.
//!
//! Join, approve, and deny each run inside one transaction; SQLite's
//! single-writer model serializes concurrent mutations on the same domain,
//! so read-then-write interleavings cannot lose an update.

use courier_common::{Result, UserIdentity};

use crate::now_ms;

const STATUS_MEMBER: &str = "member";
const STATUS_PENDING: &str = "pending";

/// A domain: an access-control boundary with one admin.
#[derive(Debug, Clone)]
pub struct DomainRecord {
    pub handle: String,
    pub admin: UserIdentity,
}

#[derive(sqlx::FromRow)]
struct DomainRow {
    handle: String,
    admin_id: i64,
    admin_first_name: String,
    admin_last_name: Option<String>,
    admin_username: Option<String>,
}

impl From<DomainRow> for DomainRecord {
    fn from(r: DomainRow) -> Self {
        Self {
            handle: r.handle,
            admin: UserIdentity {
                id: r.admin_id,
                first_name: r.admin_first_name,
                last_name: r.admin_last_name,
                username: r.admin_username,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: i64,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    status: String,
}

impl MemberRow {
    fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
        }
    }
}

/// Outcome of a join request.
#[derive(Debug)]
pub enum JoinOutcome {
    /// The requester is waitlisted; carries the admin to notify.
    Requested { admin: UserIdentity },
    /// The requester is already a member; no mutation.
    AlreadyMember,
    /// No domain with that handle exists.
    NotFound,
}

/// Outcome of an approve action.
#[derive(Debug)]
pub enum ApproveOutcome {
    /// Moved from the waitlist to the members.
    Approved(UserIdentity),
    /// Already a member; no mutation.
    AlreadyMember(UserIdentity),
    /// Not on the waitlist (already denied, or the notification is stale).
    NotPending,
    /// The domain does not exist or the caller is not its admin.
    NotAdmin,
}

/// Outcome of a deny action.
#[derive(Debug)]
pub enum DenyOutcome {
    /// Removed from the members.
    Kicked(UserIdentity),
    /// Removed from the waitlist.
    Denied(UserIdentity),
    /// The user was in neither set; no mutation.
    Stale,
    /// The domain does not exist or the caller is not its admin.
    NotAdmin,
}

/// SQLite-backed domain store.
pub struct DomainStore {
    pool: sqlx::SqlitePool,
}

impl DomainStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a domain with the given admin. Returns false if the handle is
    /// already taken (the existing record is left untouched).
    pub async fn create(&self, handle: &str, admin: &UserIdentity) -> Result<bool> {
        let result = sqlx::query(
            r#"INSERT INTO domains
                 (handle, admin_id, admin_first_name, admin_last_name, admin_username, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(handle) DO NOTHING"#,
        )
        .bind(handle)
        .bind(admin.id)
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(&admin.username)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, handle: &str) -> Result<Option<DomainRecord>> {
        let row = sqlx::query_as::<_, DomainRow>(
            "SELECT handle, admin_id, admin_first_name, admin_last_name, admin_username \
             FROM domains WHERE handle = ?",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Domains administered by the given user, ordered by handle.
    pub async fn admined_by(&self, user_id: i64) -> Result<Vec<DomainRecord>> {
        let rows = sqlx::query_as::<_, DomainRow>(
            "SELECT handle, admin_id, admin_first_name, admin_last_name, admin_username \
             FROM domains WHERE admin_id = ? ORDER BY handle",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Handles of the domains the given user is a member of, ordered.
    pub async fn member_domains(&self, user_id: i64) -> Result<Vec<String>> {
        let handles = sqlx::query_scalar::<_, String>(
            "SELECT domain FROM domain_members WHERE user_id = ? AND status = ? ORDER BY domain",
        )
        .bind(user_id)
        .bind(STATUS_MEMBER)
        .fetch_all(&self.pool)
        .await?;
        Ok(handles)
    }

    /// Membership ids of a domain (the `member` rows only).
    pub async fn member_ids(&self, handle: &str) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM domain_members WHERE domain = ? AND status = ? ORDER BY user_id",
        )
        .bind(handle)
        .bind(STATUS_MEMBER)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Waitlisted ids of a domain (the `pending` rows only).
    pub async fn waitlist_ids(&self, handle: &str) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM domain_members WHERE domain = ? AND status = ? ORDER BY user_id",
        )
        .bind(handle)
        .bind(STATUS_PENDING)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Put `user` on the domain's waitlist.
    ///
    /// A repeated request while already waitlisted keeps the pending status
    /// and only refreshes the cached display fields.
    pub async fn request_join(&self, handle: &str, user: &UserIdentity) -> Result<JoinOutcome> {
        let mut tx = self.pool.begin().await?;

        let domain = sqlx::query_as::<_, DomainRow>(
            "SELECT handle, admin_id, admin_first_name, admin_last_name, admin_username \
             FROM domains WHERE handle = ?",
        )
        .bind(handle)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(domain) = domain else {
            return Ok(JoinOutcome::NotFound);
        };

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM domain_members WHERE domain = ? AND user_id = ?",
        )
        .bind(handle)
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await?;
        if status.as_deref() == Some(STATUS_MEMBER) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        sqlx::query(
            r#"INSERT INTO domain_members
                 (domain, user_id, first_name, last_name, username, status, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(domain, user_id) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name  = excluded.last_name,
                 username   = excluded.username,
                 updated_at = excluded.updated_at"#,
        )
        .bind(handle)
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(STATUS_PENDING)
        .bind(now_ms())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(JoinOutcome::Requested {
            admin: DomainRecord::from(domain).admin,
        })
    }

    /// Move `user_id` from the waitlist to the members. Caller must be the
    /// domain admin.
    pub async fn approve(
        &self,
        handle: &str,
        admin_id: i64,
        user_id: i64,
    ) -> Result<ApproveOutcome> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query_scalar::<_, i64>("SELECT admin_id FROM domains WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&mut *tx)
            .await?;
        if owner != Some(admin_id) {
            return Ok(ApproveOutcome::NotAdmin);
        }

        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT user_id, first_name, last_name, username, status \
             FROM domain_members WHERE domain = ? AND user_id = ?",
        )
        .bind(handle)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(ApproveOutcome::NotPending);
        };
        if row.status == STATUS_MEMBER {
            return Ok(ApproveOutcome::AlreadyMember(row.identity()));
        }

        sqlx::query(
            "UPDATE domain_members SET status = ?, updated_at = ? \
             WHERE domain = ? AND user_id = ?",
        )
        .bind(STATUS_MEMBER)
        .bind(now_ms())
        .bind(handle)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(ApproveOutcome::Approved(row.identity()))
    }

    /// Remove `user_id` from the domain, whichever set it was in. Caller
    /// must be the domain admin.
    pub async fn deny(&self, handle: &str, admin_id: i64, user_id: i64) -> Result<DenyOutcome> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query_scalar::<_, i64>("SELECT admin_id FROM domains WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&mut *tx)
            .await?;
        if owner != Some(admin_id) {
            return Ok(DenyOutcome::NotAdmin);
        }

        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT user_id, first_name, last_name, username, status \
             FROM domain_members WHERE domain = ? AND user_id = ?",
        )
        .bind(handle)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(DenyOutcome::Stale);
        };

        sqlx::query("DELETE FROM domain_members WHERE domain = ? AND user_id = ?")
            .bind(handle)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if row.status == STATUS_MEMBER {
            Ok(DenyOutcome::Kicked(row.identity()))
        } else {
            Ok(DenyOutcome::Denied(row.identity()))
        }
    }
}
