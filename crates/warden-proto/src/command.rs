//! Bot command parsing.
//!
//! A command is a message whose text starts with `/`. The first token may
//! carry an `@botname` suffix when several bots share a group:
//!
//! ```text
//! /ban@WardenBot 123456 2h
//! ^^^ ^^^^^^^^^^ ^^^^^^^^^
//! name  address    args
//! ```

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommand {
    /// Command name, lower-cased, without the leading `/`.
    pub name: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
}

impl BotCommand {
    /// Parse a command from message text.
    ///
    /// Returns `None` for non-command text and for commands explicitly
    /// addressed to another bot. `bot_username` is compared
    /// case-insensitively; when it is `None` every address is accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_proto::BotCommand;
    ///
    /// let cmd = BotCommand::parse("/Warn 42", None).unwrap();
    /// assert_eq!(cmd.name, "warn");
    ///
    /// assert!(BotCommand::parse("hello", None).is_none());
    /// assert!(BotCommand::parse("/kick@OtherBot 1", Some("WardenBot")).is_none());
    /// ```
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;

        let (name, address) = match head.split_once('@') {
            Some((name, address)) => (name, Some(address)),
            None => (head, None),
        };

        if name.is_empty() {
            return None;
        }

        let addressed_elsewhere = match (address, bot_username) {
            (Some(address), Some(ours)) => {
                !address.eq_ignore_ascii_case(ours.trim_start_matches('@'))
            }
            _ => false,
        };
        if addressed_elsewhere {
            return None;
        }

        Some(Self {
            name: name.to_ascii_lowercase(),
            args: tokens.map(str::to_string).collect(),
        })
    }
}
