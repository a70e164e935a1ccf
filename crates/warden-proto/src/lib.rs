//! # warden-proto
//!
//! Wire types for the subset of the Telegram Bot API that chatwarden speaks,
//! plus the small amount of text handling that sits next to the wire format:
//!
//! - Update, message, member and permission types (serde)
//! - Bot command parsing (`/ban@MyBot 123 1h`)
//! - HTML escaping and `tg://user` mentions
//!
//! Nothing in this crate performs I/O.
//!
//! ## Quick Start
//!
//! ```rust
//! use warden_proto::BotCommand;
//!
//! let cmd = BotCommand::parse("/mute@WardenBot 42 10m", Some("WardenBot")).unwrap();
//! assert_eq!(cmd.name, "mute");
//! assert_eq!(cmd.args, vec!["42", "10m"]);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod mention;
pub mod types;

pub use command::BotCommand;
pub use error::{ProtoError, Result};
pub use mention::{escape_html, mention_html, plain_name};
pub use types::{
    ApiResponse, Chat, ChatMember, ChatPermissions, MemberStatus, Message, PermissionField,
    Update, User,
};
