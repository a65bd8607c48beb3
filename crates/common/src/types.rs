use serde::{Deserialize, Serialize};

/// A platform user: numeric id plus cached display fields.
///
/// Identity comparisons are always by `id`; the display fields are just the
/// last value the platform reported and may go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl UserIdentity {
    /// Human-readable descriptor: `First Last (@username)`, omitting the
    /// parts that are absent.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let mut out = self.first_name.clone();
        if let Some(last) = &self.last_name {
            out.push(' ');
            out.push_str(last);
        }
        if let Some(username) = &self.username {
            out.push_str(&format!(" (@{username})"));
        }
        out
    }
}

/// Coarse chat classification, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// One-to-one chat with a user.
    Private,
    /// Group or supergroup.
    Group,
    /// Broadcast channel (no individual sender identity).
    Channel,
}
