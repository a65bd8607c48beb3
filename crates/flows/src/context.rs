//! Per-chat flow state.
//!
//! A chat's position in a multi-step flow is a tagged variant, one case per
//! flow, carrying only what that flow needs to resume. The serialized form
//! is what the context store persists; absence means "no pending flow".

use serde::{Deserialize, Serialize};

/// Where a chat currently is in a guided flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum ChatContext {
    /// Waiting for a handle for a new domain.
    CreateDomain,
    /// Creating a group; see [`CreateGroupStep`].
    CreateGroup { step: CreateGroupStep },
    /// Waiting for the handle of a domain to join.
    JoinDomain,
}

/// Steps of the create-group flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CreateGroupStep {
    /// The requester admins several domains and must pick one.
    AwaitingDomainChoice,
    /// Waiting for a group handle, domain already selected.
    AwaitingGroupHandle { domain: String },
}
