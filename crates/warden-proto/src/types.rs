//! Bot API object types.
//!
//! Only the fields chatwarden reads are modelled. Unknown fields are ignored
//! on deserialization so newer API versions keep parsing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Payload, present when `ok` is true.
    pub result: Option<T>,
    /// Human-readable error, present when `ok` is false.
    pub description: Option<String>,
    /// Numeric error code, present when `ok` is false.
    pub error_code: Option<i64>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Parse an envelope from raw JSON and unwrap its result.
    pub fn from_slice(body: &[u8]) -> Result<T> {
        let envelope: ApiResponse<T> = serde_json::from_slice(body)?;
        envelope.into_result()
    }
}

impl<T> ApiResponse<T> {
    /// Convert the envelope into its payload or an [`ProtoError::Api`].
    pub fn into_result(self) -> Result<T> {
        if !self.ok {
            return Err(ProtoError::Api {
                code: self.error_code.unwrap_or(0),
                description: self
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        self.result.ok_or(ProtoError::MissingResult)
    }
}

/// One incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    /// New incoming message of any kind, if this update carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// True for bots.
    #[serde(default)]
    pub is_bot: bool,
    /// First name (may be empty for deleted accounts).
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Username without the leading `@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl User {
    /// First and last name joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last)
                .trim()
                .to_string(),
            _ => self.first_name.trim().to_string(),
        }
    }
}

/// A chat (group, supergroup, private or channel).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Chat {
    /// Unique identifier.
    pub id: i64,
    /// `private`, `group`, `supergroup` or `channel`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Title for groups and channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    /// Identifier inside the chat.
    pub message_id: i64,
    /// Sender; absent for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Unix time the message was sent.
    #[serde(default)]
    pub date: i64,
    /// UTF-8 text for text messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    /// Members added to the group (service message).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_chat_members: Vec<User>,
}

/// Membership status as reported by `getChatMember`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Chat owner.
    Creator,
    /// Administrator with some capability flags.
    Administrator,
    /// Regular member.
    Member,
    /// Member under restrictions.
    Restricted,
    /// Not a member anymore.
    Left,
    /// Banned.
    Kicked,
    /// Status added by a newer API version.
    #[serde(other)]
    Unknown,
}

impl MemberStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Kicked => "kicked",
            Self::Unknown => "unknown",
        }
    }
}

/// A chat member with the administrative flags chatwarden cares about.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatMember {
    /// The member.
    pub user: User,
    /// Membership status.
    pub status: MemberStatus,
    /// Administrator may ban, restrict and unban.
    #[serde(default)]
    pub can_restrict_members: bool,
    /// Administrator may delete other users' messages.
    #[serde(default)]
    pub can_delete_messages: bool,
}

/// Individual permission fields of [`ChatPermissions`].
///
/// `SendMediaMessages` only exists in the legacy schema; newer API versions
/// split it into per-media fields and reject the old name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionField {
    /// `can_send_messages`
    SendMessages,
    /// `can_send_media_messages`
    SendMediaMessages,
    /// `can_send_polls`
    SendPolls,
    /// `can_send_other_messages`
    SendOtherMessages,
    /// `can_add_web_page_previews`
    AddWebPagePreviews,
    /// `can_change_info`
    ChangeInfo,
    /// `can_invite_users`
    InviteUsers,
    /// `can_pin_messages`
    PinMessages,
}

impl PermissionField {
    /// Every field, in wire order.
    pub const ALL: [PermissionField; 8] = [
        Self::SendMessages,
        Self::SendMediaMessages,
        Self::SendPolls,
        Self::SendOtherMessages,
        Self::AddWebPagePreviews,
        Self::ChangeInfo,
        Self::InviteUsers,
        Self::PinMessages,
    ];

    /// JSON field name.
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::SendMessages => "can_send_messages",
            Self::SendMediaMessages => "can_send_media_messages",
            Self::SendPolls => "can_send_polls",
            Self::SendOtherMessages => "can_send_other_messages",
            Self::AddWebPagePreviews => "can_add_web_page_previews",
            Self::ChangeInfo => "can_change_info",
            Self::InviteUsers => "can_invite_users",
            Self::PinMessages => "can_pin_messages",
        }
    }
}

/// Permission set passed to `restrictChatMember`.
///
/// Unset fields are omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_send_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_send_media_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_send_polls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_send_other_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_add_web_page_previews: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_change_info: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_invite_users: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_pin_messages: Option<bool>,
}

impl ChatPermissions {
    fn slot(&mut self, field: PermissionField) -> &mut Option<bool> {
        match field {
            PermissionField::SendMessages => &mut self.can_send_messages,
            PermissionField::SendMediaMessages => &mut self.can_send_media_messages,
            PermissionField::SendPolls => &mut self.can_send_polls,
            PermissionField::SendOtherMessages => &mut self.can_send_other_messages,
            PermissionField::AddWebPagePreviews => &mut self.can_add_web_page_previews,
            PermissionField::ChangeInfo => &mut self.can_change_info,
            PermissionField::InviteUsers => &mut self.can_invite_users,
            PermissionField::PinMessages => &mut self.can_pin_messages,
        }
    }

    /// Set one field.
    pub fn set(&mut self, field: PermissionField, value: bool) {
        *self.slot(field) = Some(value);
    }

    /// Read one field; `None` when unset.
    pub fn get(&self, field: PermissionField) -> Option<bool> {
        match field {
            PermissionField::SendMessages => self.can_send_messages,
            PermissionField::SendMediaMessages => self.can_send_media_messages,
            PermissionField::SendPolls => self.can_send_polls,
            PermissionField::SendOtherMessages => self.can_send_other_messages,
            PermissionField::AddWebPagePreviews => self.can_add_web_page_previews,
            PermissionField::ChangeInfo => self.can_change_info,
            PermissionField::InviteUsers => self.can_invite_users,
            PermissionField::PinMessages => self.can_pin_messages,
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        PermissionField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}
