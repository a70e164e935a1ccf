//! Bot services.
//!
//! - **Moderation**: kick, ban, unban, mute, unmute, warn
//! - **Welcome**: per-chat welcome messages posted on join
//! - **Search**: instant-answer lookups
//!
//! plus the pure helpers they share (duration parsing, permission mapping,
//! target resolution).

pub mod context;
pub mod duration;
pub mod moderation;
pub mod permissions;
pub mod search;
pub mod welcome;

pub use context::CommandContext;
pub use moderation::{ActionKind, ModerationExecutor};
pub use permissions::PermissionSchema;
pub use search::{SearchClient, is_ip_query};
pub use welcome::WelcomeManager;
