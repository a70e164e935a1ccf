//! Per-command context and target resolution.

use crate::error::HandlerError;
use warden_proto::{BotCommand, Message, User};

/// Usage error shared by the id-or-reply commands.
pub const NUMERIC_ID_OR_REPLY: &str = "Provide numeric user id or reply.";

/// The parts of an incoming command message that handlers read.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub chat_id: i64,
    pub issuer_id: i64,
    pub message_id: i64,
    pub args: &'a [String],
    /// The replied-to message, if the command was sent as a reply.
    pub reply_to: Option<&'a Message>,
}

impl<'a> CommandContext<'a> {
    /// Build a context; `None` for messages without a sender.
    pub fn new(message: &'a Message, command: &'a BotCommand) -> Option<Self> {
        let issuer = message.from.as_ref()?;
        Some(Self {
            chat_id: message.chat.id,
            issuer_id: issuer.id,
            message_id: message.message_id,
            args: &command.args,
            reply_to: message.reply_to_message.as_deref(),
        })
    }

    /// Author of the replied-to message. Replies to anonymous posts have none.
    pub fn reply_author(&self) -> Option<&'a User> {
        self.reply_to.and_then(|m| m.from.as_ref())
    }

    /// Text of the replied-to message.
    pub fn reply_text(&self) -> Option<&'a str> {
        self.reply_to.and_then(|m| m.text.as_deref())
    }

    /// Target of an id-or-reply command: the replied-to author, else the
    /// first argument as a user id. `usage` is the reply when neither is given.
    pub fn resolve_target(&self, usage: &str) -> Result<i64, HandlerError> {
        if let Some(author) = self.reply_author() {
            return Ok(author.id);
        }
        match self.args.first() {
            Some(arg) => parse_user_id(arg, NUMERIC_ID_OR_REPLY),
            None => Err(HandlerError::usage(usage)),
        }
    }
}

/// Parse a user id argument, replying with `error` when it is not an integer.
pub fn parse_user_id(arg: &str, error: &str) -> Result<i64, HandlerError> {
    arg.trim()
        .parse()
        .map_err(|_| HandlerError::usage(error))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use warden_proto::{BotCommand, Chat, Message, User};

    pub const CHAT: i64 = -100_500;

    pub fn user(id: i64, name: &str) -> User {
        User {
            id,
            is_bot: false,
            first_name: name.to_string(),
            last_name: None,
            username: None,
        }
    }

    pub fn message(from: i64, text: &str) -> Message {
        Message {
            message_id: 10,
            from: Some(user(from, "Issuer")),
            chat: Chat {
                id: CHAT,
                kind: "supergroup".into(),
                title: None,
            },
            date: 0,
            text: Some(text.to_string()),
            reply_to_message: None,
            new_chat_members: Vec::new(),
        }
    }

    /// `text` sent by `from` as a reply to a message by `author`.
    pub fn reply(from: i64, text: &str, author: i64, replied_text: &str) -> Message {
        let mut msg = message(from, text);
        msg.reply_to_message = Some(Box::new(Message {
            message_id: 9,
            from: Some(user(author, "Target")),
            ..message(author, replied_text)
        }));
        msg
    }

    pub fn command(msg: &Message) -> BotCommand {
        BotCommand::parse(msg.text.as_deref().unwrap_or(""), None).expect("fixture is a command")
    }
}
