//! Conversation core for courier.
//!
//! The [`Dispatcher`] classifies each inbound event, routes commands and
//! flow continuations to the owning handler (create-domain, create-group,
//! join-domain), and falls through to the relay router for free text from
//! chats with no pending flow. All cross-event state lives in the directory
//! stores; outbound platform calls go through the [`Transport`] capability,
//! so the whole core runs against a mock in tests.

pub mod context;
mod create_domain;
mod create_group;
pub mod dispatch;
pub mod event;
mod join_domain;
mod relay;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use {
    context::{ChatContext, CreateGroupStep},
    dispatch::Dispatcher,
    event::{Action, Command, InboundAction, InboundMessage, parse_command},
    transport::{InlineChoice, Transport},
};
