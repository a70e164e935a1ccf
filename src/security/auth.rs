//! Authorization engine.
//!
//! Decides whether an issuer may perform an action in a chat from the role
//! the platform reports for them. Nothing is cached: roles change and a
//! stale "administrator" is worse than one extra lookup.

use crate::platform::{ChatPlatform, IssuerRole};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use warden_proto::MemberStatus;

/// Capability a command needs from its issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Ban,
    Kick,
    Mute,
    Delete,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Kick => "kick",
            Self::Mute => "mute",
            Self::Delete => "delete",
        }
    }
}

/// Why an issuer was turned away. The display text is the reply they see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("Failed to fetch your chat permissions.")]
    LookupFailed,

    /// Not an administrator; the payload completes "You must be a chat admin to ...".
    #[error("You must be a chat admin to {0}.")]
    AdminRequired(&'static str),

    #[error("You don't have permission to restrict/ban members (can_restrict_members).")]
    MissingRestrict,

    #[error("You don't have permission to delete messages (can_delete_messages).")]
    MissingDelete,

    #[error("You are not authorized to use this command.")]
    NotOwner,
}

impl Denial {
    /// Static label for metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LookupFailed => "role_lookup_failed",
            Self::AdminRequired(_) => "not_admin",
            Self::MissingRestrict => "missing_can_restrict_members",
            Self::MissingDelete => "missing_can_delete_messages",
            Self::NotOwner => "not_owner",
        }
    }
}

/// Pure decision over an already-fetched role.
///
/// Creators pass unconditionally. Anyone else must be an administrator
/// holding the flag the capability maps to.
pub fn decide(role: &IssuerRole, needed: Capability) -> Result<(), Denial> {
    match role.status {
        MemberStatus::Creator => return Ok(()),
        MemberStatus::Administrator => {}
        _ => return Err(Denial::AdminRequired("use this command")),
    }

    match needed {
        Capability::Ban | Capability::Kick | Capability::Mute if !role.can_restrict_members => {
            Err(Denial::MissingRestrict)
        }
        Capability::Delete if !role.can_delete_messages => Err(Denial::MissingDelete),
        _ => Ok(()),
    }
}

/// Role-lookup backed authorization.
pub struct Authorizer {
    platform: Arc<dyn ChatPlatform>,
}

impl Authorizer {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Check that `issuer_id` may exercise `needed` in `chat_id`.
    pub async fn check_permission(
        &self,
        chat_id: i64,
        issuer_id: i64,
        needed: Capability,
    ) -> Result<(), Denial> {
        let role = self
            .platform
            .get_member(chat_id, issuer_id)
            .await
            .map_err(|e| {
                warn!(chat_id, issuer_id, error = %e, "Role lookup failed");
                Denial::LookupFailed
            })?;

        let decision = decide(&role, needed);
        debug!(
            chat_id,
            issuer_id,
            capability = needed.name(),
            status = role.status.as_str(),
            allowed = decision.is_ok(),
            "Authorization decided"
        );
        decision
    }

    /// Administrator or creator, ignoring capability flags.
    ///
    /// A failed lookup counts as "no".
    pub async fn is_admin_or_creator(&self, chat_id: i64, user_id: i64) -> bool {
        match self.platform.get_member(chat_id, user_id).await {
            Ok(role) => matches!(
                role.status,
                MemberStatus::Administrator | MemberStatus::Creator
            ),
            Err(e) => {
                warn!(chat_id, user_id, error = %e, "Role lookup failed");
                false
            }
        }
    }
}
