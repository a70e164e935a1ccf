//! Owner-gated blacklist administration.

use crate::error::{HandlerError, HandlerResult};
use crate::services::CommandContext;
use crate::state::Warden;
use tracing::info;

fn parse_uid(ctx: &CommandContext<'_>, usage: &str) -> Result<i64, HandlerError> {
    let arg = ctx.args.first().ok_or_else(|| HandlerError::usage(usage))?;
    arg.parse()
        .map_err(|_| HandlerError::usage("User id must be integer."))
}

impl Warden {
    pub(super) fn blacklist_add(&self, ctx: &CommandContext<'_>) -> HandlerResult {
        self.owners.check(ctx.issuer_id)?;
        let uid = parse_uid(ctx, "Usage: /blacklist <user_id>")?;
        if self.blacklist.add(uid) {
            info!(user_id = uid, owner = ctx.issuer_id, "User blacklisted");
        }
        Ok(Some(format!("User {uid} blacklisted.")))
    }

    /// Removing an absent id still reports success.
    pub(super) fn blacklist_remove(&self, ctx: &CommandContext<'_>) -> HandlerResult {
        self.owners.check(ctx.issuer_id)?;
        let uid = parse_uid(ctx, "Usage: /unblacklist <user_id>")?;
        if self.blacklist.remove(uid) {
            info!(user_id = uid, owner = ctx.issuer_id, "User removed from blacklist");
        }
        Ok(Some(format!("User {uid} removed from blacklist.")))
    }

    pub(super) fn blacklist_list(&self, ctx: &CommandContext<'_>) -> HandlerResult {
        self.owners.check(ctx.issuer_id)?;
        let ids = self.blacklist.list();
        if ids.is_empty() {
            return Ok(Some("Blacklist empty.".to_string()));
        }
        let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
        Ok(Some(format!("Blacklist: {}", ids.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{ADMIN, OWNER, harness, replies};
    use crate::services::context::fixtures::message;

    #[tokio::test]
    async fn test_non_owner_refused() {
        let h = harness().await;
        for text in ["/blacklist 5", "/unblacklist 5", "/list_blacklist"] {
            h.warden.handle_message(&message(ADMIN, text)).await;
        }
        assert_eq!(
            replies(&h),
            vec!["You are not authorized to use this command."; 3]
        );
        assert!(h.warden.blacklist.list().is_empty());
    }

    #[tokio::test]
    async fn test_owner_manages_blacklist() {
        let h = harness().await;
        for text in [
            "/list_blacklist",
            "/blacklist 9",
            "/blacklist 3",
            "/list_blacklist",
            "/unblacklist 9",
            "/unblacklist 9",
            "/list_blacklist",
        ] {
            h.warden.handle_message(&message(OWNER, text)).await;
        }
        assert_eq!(
            replies(&h),
            vec![
                "Blacklist empty.",
                "User 9 blacklisted.",
                "User 3 blacklisted.",
                "Blacklist: 3, 9",
                "User 9 removed from blacklist.",
                "User 9 removed from blacklist.",
                "Blacklist: 3",
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let h = harness().await;
        h.warden.handle_message(&message(OWNER, "/blacklist")).await;
        h.warden.handle_message(&message(OWNER, "/unblacklist abc")).await;
        assert_eq!(
            replies(&h),
            vec!["Usage: /blacklist <user_id>", "User id must be integer."]
        );
    }
}
