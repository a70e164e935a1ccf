//! Greeting, help, and `/search`.

use crate::error::{HandlerError, HandlerResult};
use crate::services::{CommandContext, is_ip_query, search::IP_REFUSAL};
use crate::state::Warden;
use tracing::{debug, info};

const GREETING: &str = "Hi! I am a DuckDuckGo web search and group moderation bot.";

const HELP: &str = "Commands:\n\
/search <query>\n\
/kick <user_id or reply>\n\
/ban <user_id or reply> [duration]\n\
/unban <user_id or reply>\n\
/mute <duration> (reply) OR /mute <user_id> <duration>\n\
/unmute <user_id or reply>\n\
/warn <user_id or reply>\n\
/setwelcome <text> [--channel <link>] (use {user_mention})\n\
/clearwelcome\n";

pub(super) fn start() -> String {
    GREETING.to_string()
}

pub(super) fn help() -> String {
    HELP.to_string()
}

impl Warden {
    /// `/search <query>`. Blacklisted users get no reply at all.
    pub(super) async fn search(&self, ctx: &CommandContext<'_>) -> HandlerResult {
        if self.blacklist.contains(ctx.issuer_id) {
            debug!(user_id = ctx.issuer_id, "Ignoring search from blacklisted user");
            return Ok(None);
        }
        if ctx.args.is_empty() {
            return Err(HandlerError::usage("Usage: /search <query>"));
        }

        let query = ctx.args.join(" ");
        if is_ip_query(&query) {
            info!(chat_id = ctx.chat_id, user_id = ctx.issuer_id, "Refused IP query");
            crate::metrics::record_search("refused");
            return Ok(Some(IP_REFUSAL.to_string()));
        }

        Ok(Some(self.search.query(&query).await))
    }
}
