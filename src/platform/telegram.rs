//! Bot API client.
//!
//! Every method is a JSON POST to `{api_url}/bot{token}/{method}`. The API
//! reports failures inside the envelope (`ok: false`) with a 4xx status, so
//! bodies are decoded regardless of HTTP status.

use super::{ChatPlatform, IssuerRole, PlatformError, SendOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};
use warden_proto::{ApiResponse, ChatMember, ChatPermissions, Message, Update, User};

/// Slack added on top of the long-poll timeout before the HTTP client gives up.
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Bot API client.
pub struct TelegramApi {
    http_client: reqwest::Client,
    /// `{api_url}/bot{token}`; never logged.
    base: String,
}

impl TelegramApi {
    /// Create a client. `poll_timeout` bounds `getUpdates` long polls.
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(poll_timeout + POLL_SLACK)
            .user_agent(concat!("chatwarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        info!(api_url = %api_url, "Bot API client initialized");

        Self {
            http_client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, PlatformError> {
        let url = format!("{}/{}", self.base, method);

        // Strip the URL from transport errors: it embeds the token and the
        // error text is shown to chat users.
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PlatformError::Http(e.without_url()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlatformError::Http(e.without_url()))?;

        let result = ApiResponse::<T>::from_slice(&bytes)?;
        debug!(method, "Bot API call succeeded");
        Ok(result)
    }

    /// Fetch pending updates starting at `offset`, waiting up to `timeout`.
    ///
    /// Updates are decoded one by one. An update that does not decode is kept
    /// as an empty `Update` with its id, so the offset still moves past it.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, PlatformError> {
        let raw: Vec<Value> = self
            .call(
                "getUpdates",
                &json!({
                    "offset": offset,
                    "timeout": timeout.as_secs(),
                    "allowed_updates": ["message"],
                }),
            )
            .await?;
        Ok(raw.into_iter().filter_map(decode_update).collect())
    }

    /// Identity of the bot itself.
    pub async fn get_me(&self) -> Result<User, PlatformError> {
        self.call("getMe", &json!({})).await
    }
}

fn decode_update(raw: Value) -> Option<Update> {
    let update_id = raw.get("update_id").and_then(Value::as_i64);
    match serde_json::from_value::<Update>(raw) {
        Ok(update) => Some(update),
        Err(e) => {
            warn!(update_id, error = %e, "Skipping undecodable update");
            update_id.map(|update_id| Update {
                update_id,
                message: None,
            })
        }
    }
}

fn with_until(mut body: Value, until: Option<DateTime<Utc>>) -> Value {
    if let (Some(until), Some(map)) = (until, body.as_object_mut()) {
        map.insert("until_date".to_string(), json!(until.timestamp()));
    }
    body
}

#[async_trait]
impl ChatPlatform for TelegramApi {
    async fn get_member(&self, chat_id: i64, user_id: i64) -> Result<IssuerRole, PlatformError> {
        let member: ChatMember = self
            .call("getChatMember", &json!({ "chat_id": chat_id, "user_id": user_id }))
            .await?;
        Ok(member.into())
    }

    async fn ban(
        &self,
        chat_id: i64,
        user_id: i64,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        let body = with_until(json!({ "chat_id": chat_id, "user_id": user_id }), until);
        let _: bool = self.call("banChatMember", &body).await?;
        Ok(())
    }

    async fn unban(&self, chat_id: i64, user_id: i64) -> Result<(), PlatformError> {
        let _: bool = self
            .call(
                "unbanChatMember",
                &json!({ "chat_id": chat_id, "user_id": user_id, "only_if_banned": true }),
            )
            .await?;
        Ok(())
    }

    async fn restrict(
        &self,
        chat_id: i64,
        user_id: i64,
        permissions: &ChatPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        let body = with_until(
            json!({ "chat_id": chat_id, "user_id": user_id, "permissions": permissions }),
            until,
        );
        let _: bool = self.call("restrictChatMember", &body).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError> {
        let _: bool = self
            .call(
                "deleteMessage",
                &json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: SendOptions,
    ) -> Result<i64, PlatformError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(map) = body.as_object_mut() {
            if options.html {
                map.insert("parse_mode".to_string(), json!("HTML"));
            }
            if let Some(reply_to) = options.reply_to {
                map.insert("reply_to_message_id".to_string(), json!(reply_to));
                map.insert("allow_sending_without_reply".to_string(), json!(true));
            }
        }
        let sent: Message = self.call("sendMessage", &body).await?;
        Ok(sent.message_id)
    }
}
