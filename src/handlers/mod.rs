//! Update handlers.
//!
//! Routes each incoming message to one of three paths:
//! - join service messages go to the welcome lifecycle,
//! - `/commands` are dispatched by name,
//! - plain text passes through the IP-query interceptor.
//!
//! Command results become a single reply to the triggering message.

mod blacklist;
mod events;
mod general;

use crate::error::{HandlerError, HandlerResult};
use crate::platform::{SendOptions, UpdateHandler};
use crate::services::{ActionKind, CommandContext};
use crate::state::Warden;
use crate::telemetry::{CommandTimer, spans};
use async_trait::async_trait;
use tracing::{Instrument, debug, error, warn};
use warden_proto::{BotCommand, Message, Update};

/// Every command the bot answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Start,
    Help,
    Search,
    Blacklist,
    Unblacklist,
    ListBlacklist,
    SetWelcome,
    ClearWelcome,
    Moderation(ActionKind),
}

impl Route {
    fn from_command(name: &str) -> Option<Self> {
        let route = match name {
            "start" => Self::Start,
            "help" => Self::Help,
            "search" => Self::Search,
            "blacklist" => Self::Blacklist,
            "unblacklist" => Self::Unblacklist,
            "list_blacklist" => Self::ListBlacklist,
            "setwelcome" => Self::SetWelcome,
            "clearwelcome" => Self::ClearWelcome,
            other => Self::Moderation(ActionKind::from_command(other)?),
        };
        Some(route)
    }
}

#[async_trait]
impl UpdateHandler for Warden {
    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "Ignoring update without message");
            return;
        };
        let span = spans::update(update.update_id, Some(message.chat.id));
        self.handle_message(&message).instrument(span).await;
    }
}

impl Warden {
    /// Handle one incoming message.
    pub async fn handle_message(&self, message: &Message) {
        if !message.new_chat_members.is_empty() {
            self.on_members_joined(message).await;
            return;
        }

        let Some(text) = message.text.as_deref() else {
            return;
        };

        if text.starts_with('/') {
            // Commands addressed to other bots parse to None and are dropped.
            if let Some(command) = BotCommand::parse(text, self.bot_username.as_deref()) {
                self.handle_command(message, &command).await;
            }
        } else {
            self.intercept_text(message, text).await;
        }
    }

    async fn handle_command(&self, message: &Message, command: &BotCommand) {
        let name = command.name.as_str();
        let Some(route) = Route::from_command(name) else {
            debug!(command = %name, "Ignoring unknown command");
            return;
        };
        let Some(ctx) = CommandContext::new(message, command) else {
            debug!(command = %name, "Ignoring command without sender");
            return;
        };

        let span = spans::command(name, Some(ctx.issuer_id));
        let _timer = CommandTimer::new(name);

        let result = self.dispatch(route, &ctx).instrument(span).await;
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                crate::metrics::record_command_error(name, e.error_code());
                match &e {
                    HandlerError::Internal(_) => {
                        error!(command = %name, chat_id = ctx.chat_id, error = %e, "Command failed")
                    }
                    _ => debug!(command = %name, chat_id = ctx.chat_id, error = %e, "Command refused"),
                }
                e.reply_text()
            }
        };

        if let Some(text) = reply {
            self.reply(&ctx, &text).await;
        }
    }

    async fn dispatch(&self, route: Route, ctx: &CommandContext<'_>) -> HandlerResult {
        match route {
            Route::Start => Ok(Some(general::start())),
            Route::Help => Ok(Some(general::help())),
            Route::Search => self.search(ctx).await,
            Route::Blacklist => self.blacklist_add(ctx),
            Route::Unblacklist => self.blacklist_remove(ctx),
            Route::ListBlacklist => self.blacklist_list(ctx),
            Route::SetWelcome => self.welcome.configure(ctx).await,
            Route::ClearWelcome => self.welcome.clear(ctx).await,
            Route::Moderation(kind) => self.moderation.run(kind, ctx).await,
        }
    }

    /// Reply to the command message. Failures are logged only.
    async fn reply(&self, ctx: &CommandContext<'_>, text: &str) {
        if let Err(e) = self
            .platform
            .send_message(ctx.chat_id, text, SendOptions::reply_to(ctx.message_id))
            .await
        {
            warn!(chat_id = ctx.chat_id, error = %e, "Failed to send reply");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::StoreHandle;
    use crate::platform::IssuerRole;
    use crate::platform::testing::{Call, RecordingPlatform};
    use crate::services::context::fixtures::*;
    use std::sync::Arc;
    use warden_proto::MemberStatus;

    pub const OWNER: i64 = 4242;
    pub const ADMIN: i64 = 1;

    pub struct Harness {
        pub platform: Arc<RecordingPlatform>,
        pub warden: Warden,
        _dir: tempfile::TempDir,
    }

    pub async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.bot.owners = vec![OWNER];
        config.bot.username = Some("WardenBot".into());
        // Nothing listens here; lookups fail fast.
        config.search.api_url = "http://127.0.0.1:9/".into();
        config.search.max_retries = 0;

        let platform = Arc::new(RecordingPlatform::new().with_role(
            ADMIN,
            IssuerRole::new(MemberStatus::Administrator).with_restrict(),
        ));
        let store = StoreHandle::open(dir.path().join("store.json")).await;
        let warden = Warden::new(&config, platform.clone(), store);
        Harness {
            platform,
            warden,
            _dir: dir,
        }
    }

    /// Replies sent in answer to the fixture message.
    pub fn replies(h: &Harness) -> Vec<String> {
        h.platform
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, options, .. } if options.reply_to == Some(10) => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_routes() {
        assert_eq!(Route::from_command("list_blacklist"), Some(Route::ListBlacklist));
        assert_eq!(
            Route::from_command("warn"),
            Some(Route::Moderation(ActionKind::Warn))
        );
        assert_eq!(Route::from_command("frobnicate"), None);
    }

    #[tokio::test]
    async fn test_moderation_command_end_to_end() {
        let h = harness().await;
        h.warden.handle_message(&message(ADMIN, "/ban@WardenBot 55 1h")).await;
        assert_eq!(replies(&h), vec!["Banned 55."]);
    }

    #[tokio::test]
    async fn test_commands_for_other_bots_and_unknown_commands_ignored() {
        let h = harness().await;
        h.warden.handle_message(&message(ADMIN, "/ban@OtherBot 55")).await;
        h.warden.handle_message(&message(ADMIN, "/frobnicate")).await;
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_usage_error_is_replied() {
        let h = harness().await;
        h.warden.handle_message(&message(ADMIN, "/unban")).await;
        assert_eq!(replies(&h), vec!["Usage: /unban <user_id or reply>"]);
        assert_eq!(h.platform.lookups(), 0);
    }

    #[tokio::test]
    async fn test_join_message_triggers_welcome() {
        let h = harness().await;
        h.warden
            .handle_message(&message(ADMIN, "/setwelcome Hello {user_mention}"))
            .await;

        let mut join = message(99, "");
        join.text = None;
        join.new_chat_members = vec![user(99, "Neo")];
        h.warden.handle_message(&join).await;

        let texts = h.platform.sent_texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1], "Hello <a href=\"tg://user?id=99\">Neo</a>");
    }

    #[tokio::test]
    async fn test_update_without_message_is_ignored() {
        let h = harness().await;
        h.warden
            .handle_update(Update {
                update_id: 1,
                message: None,
            })
            .await;
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_handler_replies_with_help() {
        let h = harness().await;
        h.warden.handle_message(&message(ADMIN, "/help")).await;
        let replies = replies(&h);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("Commands:\n/search <query>\n"));
    }
}
