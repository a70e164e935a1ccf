//! Moderation action executor: kick, ban, unban, mute, unmute, warn.
//!
//! Each command runs in three steps:
//!
//! 1. [`ModerationAction::prepare`] resolves the target and validates the
//!    arguments. Usage errors stop here, before any platform call.
//! 2. The issuer is authorized against a fresh role lookup.
//! 3. The platform mutation (or warn counter update) is performed and the
//!    outcome becomes the reply. Nothing is retried.

use super::context::{CommandContext, parse_user_id};
use super::duration::parse_duration;
use super::permissions::{PermissionSchema, full_mute, full_unmute};
use crate::db::StoreHandle;
use crate::error::{HandlerError, HandlerResult};
use crate::platform::ChatPlatform;
use crate::security::{Authorizer, Capability};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const MUTE_AMBIGUOUS: &str =
    "Reply to a user's message and use /mute <duration>, or use /mute <user_id> <duration>.";
const MUTE_BAD_ID: &str = "Provide a numeric user id or reply.";
const MUTE_USAGE: &str = "Usage: /mute <duration> (reply) OR /mute <user_id> <duration>\nExamples: 10m, 2h";
const INVALID_DURATION: &str = "Invalid duration. Examples: 10m, 2h";

/// Kind of moderation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Kick,
    Ban,
    Unban,
    Mute,
    Unmute,
    Warn,
}

impl ActionKind {
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "kick" => Some(Self::Kick),
            "ban" => Some(Self::Ban),
            "unban" => Some(Self::Unban),
            "mute" => Some(Self::Mute),
            "unmute" => Some(Self::Unmute),
            "warn" => Some(Self::Warn),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Warn => "warn",
        }
    }

    /// Capability the issuer must hold. Warn shares kick's.
    pub fn capability(self) -> Capability {
        match self {
            Self::Kick | Self::Warn => Capability::Kick,
            Self::Ban | Self::Unban => Capability::Ban,
            Self::Mute | Self::Unmute => Capability::Mute,
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Self::Kick => "Usage: /kick <user_id or reply>",
            Self::Ban => "Usage: /ban <user_id or reply> [duration]",
            Self::Unban => "Usage: /unban <user_id or reply>",
            Self::Mute => MUTE_USAGE,
            Self::Unmute => "Usage: /unmute <user_id or reply>",
            Self::Warn => "Usage: /warn <user_id or reply>",
        }
    }
}

/// One validated moderation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationAction {
    pub kind: ActionKind,
    pub chat_id: i64,
    pub issuer_id: i64,
    pub target_id: i64,
    /// Expiry for bans and mutes; `None` is permanent.
    pub until: Option<DateTime<Utc>>,
    /// Duration as typed, echoed back in the mute reply.
    pub duration_arg: Option<String>,
}

/// `now + span`, or `None` for an empty span or one past chrono's range.
fn expiry(now: DateTime<Utc>, span: Duration) -> Option<DateTime<Utc>> {
    if span.is_zero() {
        return None;
    }
    let span = chrono::Duration::from_std(span).ok()?;
    now.checked_add_signed(span)
}

impl ModerationAction {
    /// Resolve the target and validate arguments without touching the platform.
    pub fn prepare(
        kind: ActionKind,
        ctx: &CommandContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Self, HandlerError> {
        let (target_id, until, duration_arg) = match kind {
            ActionKind::Mute => {
                let (target, arg) = Self::mute_target(ctx)?;
                let until = arg
                    .and_then(parse_duration)
                    .and_then(|span| expiry(now, span))
                    .ok_or_else(|| HandlerError::usage(INVALID_DURATION))?;
                (target, Some(until), arg.map(str::to_string))
            }
            ActionKind::Ban => {
                let target = ctx.resolve_target(kind.usage())?;
                // The duration is always the second argument, even for replies.
                // Anything unparseable means a permanent ban.
                let arg = ctx.args.get(1).map(String::as_str);
                let until = arg
                    .and_then(parse_duration)
                    .and_then(|span| expiry(now, span));
                (target, until, arg.map(str::to_string))
            }
            _ => (ctx.resolve_target(kind.usage())?, None, None),
        };

        Ok(Self {
            kind,
            chat_id: ctx.chat_id,
            issuer_id: ctx.issuer_id,
            target_id,
            until,
            duration_arg,
        })
    }

    /// `(reply, [duration])` or `(id, duration)`; a lone argument without a
    /// reply is ambiguous.
    fn mute_target<'a>(ctx: &CommandContext<'a>) -> Result<(i64, Option<&'a str>), HandlerError> {
        if let Some(author) = ctx.reply_author() {
            return Ok((author.id, ctx.args.first().map(String::as_str)));
        }
        match ctx.args {
            [] => Err(HandlerError::usage(MUTE_USAGE)),
            [_] => Err(HandlerError::usage(MUTE_AMBIGUOUS)),
            [id, duration, ..] => Ok((parse_user_id(id, MUTE_BAD_ID)?, Some(duration.as_str()))),
        }
    }
}

/// Runs moderation commands against the platform and the store.
pub struct ModerationExecutor {
    platform: Arc<dyn ChatPlatform>,
    authorizer: Arc<Authorizer>,
    store: StoreHandle,
    schema: PermissionSchema,
}

impl ModerationExecutor {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        authorizer: Arc<Authorizer>,
        store: StoreHandle,
        schema: PermissionSchema,
    ) -> Self {
        Self {
            platform,
            authorizer,
            store,
            schema,
        }
    }

    /// Validate, authorize and execute one moderation command.
    pub async fn run(&self, kind: ActionKind, ctx: &CommandContext<'_>) -> HandlerResult {
        let action = ModerationAction::prepare(kind, ctx, Utc::now())?;
        self.authorizer
            .check_permission(action.chat_id, action.issuer_id, kind.capability())
            .await?;
        self.execute(&action).await.map(Some)
    }

    /// Perform an already-authorized action.
    pub async fn execute(&self, action: &ModerationAction) -> Result<String, HandlerError> {
        let chat = action.chat_id;
        let target = action.target_id;

        let reply = match action.kind {
            ActionKind::Kick => {
                // No native kick: ban, then lift the ban right away. A failed
                // unban leaves the target banned and reports a plain failure.
                self.platform
                    .ban(chat, target, None)
                    .await
                    .map_err(|e| self.failed(action, e))?;
                self.platform
                    .unban(chat, target)
                    .await
                    .map_err(|e| self.failed(action, e))?;
                format!("Kicked {target}.")
            }
            ActionKind::Ban => {
                self.platform
                    .ban(chat, target, action.until)
                    .await
                    .map_err(|e| self.failed(action, e))?;
                format!("Banned {target}.")
            }
            ActionKind::Unban => {
                self.platform
                    .unban(chat, target)
                    .await
                    .map_err(|e| self.failed(action, e))?;
                format!("Unbanned {target}.")
            }
            ActionKind::Mute => {
                self.platform
                    .restrict(chat, target, &full_mute(&self.schema), action.until)
                    .await
                    .map_err(|e| self.failed(action, e))?;
                format!(
                    "Muted {target} for {}.",
                    action.duration_arg.as_deref().unwrap_or_default()
                )
            }
            ActionKind::Unmute => {
                self.platform
                    .restrict(chat, target, &full_unmute(&self.schema), None)
                    .await
                    .map_err(|e| self.failed(action, e))?;
                format!("Unmuted {target}.")
            }
            ActionKind::Warn => {
                let count = self.store.warn(chat, target).await?;
                format!("Warned {target} ({count} total).")
            }
        };

        info!(
            action = action.kind.name(),
            chat_id = chat,
            issuer = action.issuer_id,
            target,
            until = ?action.until,
            "Moderation action applied"
        );
        Ok(reply)
    }

    fn failed(&self, action: &ModerationAction, e: crate::platform::PlatformError) -> HandlerError {
        error!(
            action = action.kind.name(),
            chat_id = action.chat_id,
            target = action.target_id,
            error = %e,
            "Moderation action failed"
        );
        HandlerError::platform(action.kind.name(), e)
    }
}
