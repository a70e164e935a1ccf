//! Welcome lifecycle: configure, clear, and post on join.
//!
//! A chat is either unconfigured or has a [`WelcomeConfig`]. On every join
//! the previous welcome is deleted (best effort), a fresh one is posted, and
//! its id is stored so the next join can delete it in turn.

use super::context::CommandContext;
use crate::db::{StoreHandle, WelcomeConfig};
use crate::error::{HandlerError, HandlerResult};
use crate::platform::{ChatPlatform, SendOptions};
use crate::security::{Authorizer, Denial};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use warden_proto::{User, mention_html, plain_name};

/// Placeholder replaced by the new member's mention.
pub const MENTION_PLACEHOLDER: &str = "{user_mention}";

const CHANNEL_FLAG: &str = "--channel";
const SETWELCOME_USAGE: &str =
    "Usage: /setwelcome <text> [--channel <link>]. Use {user_mention} in text.";

/// Render the welcome for one member. Returns the text and whether it must
/// be sent as HTML.
///
/// Members without a displayable name get their plain name (falling back to
/// `@username` or the id) and a plain-text message.
pub fn render_welcome(config: &WelcomeConfig, member: &User) -> (String, bool) {
    let (mention, html) = match mention_html(member) {
        Some(mention) => (mention, true),
        None => (plain_name(member), false),
    };

    let mut text = config.message_template.replace(MENTION_PLACEHOLDER, &mention);
    if let Some(link) = config.channel_link.as_deref().filter(|l| !l.is_empty()) {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str("\nChannel: ");
        text.push_str(link);
    }
    (text, html)
}

/// Split `/setwelcome` arguments into template text and channel link.
///
/// `--channel` takes the following argument; a trailing `--channel` with no
/// value stays part of the text.
fn parse_setwelcome_args(args: &[String]) -> (String, Option<String>) {
    let mut args = args.to_vec();
    let mut channel_link = None;
    if let Some(i) = args.iter().position(|a| a == CHANNEL_FLAG)
        && i + 1 < args.len()
    {
        channel_link = Some(args[i + 1].clone());
        args.drain(i..i + 2);
    }
    (args.join(" ").trim().to_string(), channel_link)
}

/// Owns the welcome state machine for every chat.
///
/// Updates are handled concurrently, so every transition of a chat's welcome
/// holds that chat's lock from reading the pointer to recording the new one.
pub struct WelcomeManager {
    platform: Arc<dyn ChatPlatform>,
    authorizer: Arc<Authorizer>,
    store: StoreHandle,
    chat_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl WelcomeManager {
    pub fn new(platform: Arc<dyn ChatPlatform>, authorizer: Arc<Authorizer>, store: StoreHandle) -> Self {
        Self {
            platform,
            authorizer,
            store,
            chat_locks: DashMap::new(),
        }
    }

    fn chat_lock(&self, chat_id: i64) -> Arc<Mutex<()>> {
        Arc::clone(self.chat_locks.entry(chat_id).or_default().value())
    }

    /// `/setwelcome <text> [--channel <link>]`, or as a reply to reuse the
    /// replied-to text. Resets the live-welcome pointer.
    pub async fn configure(&self, ctx: &CommandContext<'_>) -> HandlerResult {
        if ctx.args.is_empty() && ctx.reply_to.is_none() {
            return Err(HandlerError::usage(SETWELCOME_USAGE));
        }

        let (mut text, channel_link) = parse_setwelcome_args(ctx.args);
        if text.is_empty()
            && let Some(replied) = ctx.reply_text()
        {
            text = replied.trim().to_string();
        }
        if text.is_empty() {
            return Err(HandlerError::usage("No welcome text provided."));
        }

        if !self
            .authorizer
            .is_admin_or_creator(ctx.chat_id, ctx.issuer_id)
            .await
        {
            return Err(Denial::AdminRequired("set welcome message").into());
        }

        let lock = self.chat_lock(ctx.chat_id);
        let _guard = lock.lock().await;
        self.store
            .set_welcome(ctx.chat_id, WelcomeConfig::new(text, channel_link))
            .await?;
        info!(chat_id = ctx.chat_id, issuer = ctx.issuer_id, "Welcome configured");
        Ok(Some("Welcome message saved for this chat.".to_string()))
    }

    /// `/clearwelcome`. Clearing an unconfigured chat is a no-op with a notice.
    pub async fn clear(&self, ctx: &CommandContext<'_>) -> HandlerResult {
        if !self
            .authorizer
            .is_admin_or_creator(ctx.chat_id, ctx.issuer_id)
            .await
        {
            return Err(Denial::AdminRequired("clear welcome").into());
        }

        let lock = self.chat_lock(ctx.chat_id);
        let _guard = lock.lock().await;
        let reply = if self.store.clear_welcome(ctx.chat_id).await? {
            info!(chat_id = ctx.chat_id, issuer = ctx.issuer_id, "Welcome cleared");
            "Welcome cleared."
        } else {
            "No welcome configured."
        };
        Ok(Some(reply.to_string()))
    }

    /// Post a welcome for each new member. Returns how many were sent.
    ///
    /// Failures are logged, never surfaced: a failed delete does not stop
    /// the send, and a failed send leaves the stored pointer untouched.
    pub async fn on_join(&self, chat_id: i64, members: &[User]) -> usize {
        let lock = self.chat_lock(chat_id);
        let _guard = lock.lock().await;

        let config = match self.store.welcome(chat_id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(chat_id, "No welcome configured for chat");
                return 0;
            }
            Err(e) => {
                error!(chat_id, error = %e, "Failed to read welcome configuration");
                return 0;
            }
        };

        let mut last = config.last_welcome_message_id;
        let mut sent = 0;

        for member in members {
            let (text, html) = render_welcome(&config, member);

            if let Some(previous) = last
                && let Err(e) = self.platform.delete_message(chat_id, previous).await
            {
                debug!(chat_id, message_id = previous, error = %e, "Failed to delete previous welcome");
            }

            let options = SendOptions {
                html,
                reply_to: None,
            };
            let message_id = match self.platform.send_message(chat_id, &text, options).await {
                Ok(id) => id,
                Err(e) => {
                    error!(chat_id, user_id = member.id, error = %e, "Failed to send welcome message");
                    continue;
                }
            };

            info!(chat_id, user_id = member.id, message_id, "Welcome message sent");
            crate::metrics::record_welcome_sent();
            sent += 1;
            last = Some(message_id);

            match self.store.set_last_welcome(chat_id, message_id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(chat_id, "Welcome cleared while posting, stopping");
                    break;
                }
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to record welcome message id");
                }
            }
        }
        sent
    }
}
