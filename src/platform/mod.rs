//! Messaging platform collaborator.
//!
//! [`ChatPlatform`] is everything the moderation core needs from the outside
//! world: the role lookup used for authorization and the handful of
//! mutations commands perform. [`TelegramApi`] implements it over the Bot
//! API; tests substitute a recording fake.

mod poller;
mod telegram;
#[cfg(test)]
pub mod testing;

pub use poller::{Poller, UpdateHandler};
pub use telegram::TelegramApi;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use warden_proto::{ChatMember, ChatPermissions, MemberStatus, ProtoError};

/// Failures of any platform call. The core treats them as one class and
/// shows the display text to the issuer.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{description}")]
    Api { code: i64, description: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<ProtoError> for PlatformError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Api { code, description } => Self::Api { code, description },
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Issuer role as reported by the platform, fetched fresh per check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerRole {
    pub status: MemberStatus,
    pub can_restrict_members: bool,
    pub can_delete_messages: bool,
}

impl IssuerRole {
    pub fn new(status: MemberStatus) -> Self {
        Self {
            status,
            can_restrict_members: false,
            can_delete_messages: false,
        }
    }

    #[cfg(test)]
    pub fn with_restrict(mut self) -> Self {
        self.can_restrict_members = true;
        self
    }

    #[cfg(test)]
    pub fn with_delete(mut self) -> Self {
        self.can_delete_messages = true;
        self
    }
}

impl From<ChatMember> for IssuerRole {
    fn from(member: ChatMember) -> Self {
        Self {
            status: member.status,
            can_restrict_members: member.can_restrict_members,
            can_delete_messages: member.can_delete_messages,
        }
    }
}

/// Options for an outgoing message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Send with `parse_mode = "HTML"`.
    pub html: bool,
    /// Message to reply to.
    pub reply_to: Option<i64>,
}

impl SendOptions {
    pub fn reply_to(message_id: i64) -> Self {
        Self {
            html: false,
            reply_to: Some(message_id),
        }
    }

    #[cfg(test)]
    pub fn html() -> Self {
        Self {
            html: true,
            reply_to: None,
        }
    }
}

/// Role lookup and mutations against the messaging platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Look up a member's role and capability flags.
    async fn get_member(&self, chat_id: i64, user_id: i64) -> Result<IssuerRole, PlatformError>;

    /// Ban a member, until `until` or permanently.
    async fn ban(
        &self,
        chat_id: i64,
        user_id: i64,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError>;

    /// Lift a ban. Never removes a member who is not banned.
    async fn unban(&self, chat_id: i64, user_id: i64) -> Result<(), PlatformError>;

    /// Replace a member's permission set, until `until` or indefinitely.
    async fn restrict(
        &self,
        chat_id: i64,
        user_id: i64,
        permissions: &ChatPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError>;

    /// Delete a message.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError>;

    /// Send a message, returning its id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: SendOptions,
    ) -> Result<i64, PlatformError>;
}
