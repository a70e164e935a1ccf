//! Recording [`ChatPlatform`] fake for unit tests.

use super::{ChatPlatform, IssuerRole, PlatformError, SendOptions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use warden_proto::{ChatPermissions, MemberStatus};

/// One call made against the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetMember {
        chat_id: i64,
        user_id: i64,
    },
    Ban {
        chat_id: i64,
        user_id: i64,
        until: Option<DateTime<Utc>>,
    },
    Unban {
        chat_id: i64,
        user_id: i64,
    },
    Restrict {
        chat_id: i64,
        user_id: i64,
        permissions: ChatPermissions,
        until: Option<DateTime<Utc>>,
    },
    Delete {
        chat_id: i64,
        message_id: i64,
    },
    Send {
        chat_id: i64,
        text: String,
        options: SendOptions,
    },
}

impl Call {
    fn method(&self) -> &'static str {
        match self {
            Self::GetMember { .. } => "get_member",
            Self::Ban { .. } => "ban",
            Self::Unban { .. } => "unban",
            Self::Restrict { .. } => "restrict",
            Self::Delete { .. } => "delete_message",
            Self::Send { .. } => "send_message",
        }
    }
}

/// Records every call, answers role lookups from a table and fails the
/// methods it is told to fail. Unknown users are plain members.
pub struct RecordingPlatform {
    calls: Mutex<Vec<Call>>,
    roles: Mutex<HashMap<i64, IssuerRole>>,
    failing: Mutex<HashSet<&'static str>>,
    next_message_id: AtomicI64,
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            roles: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            next_message_id: AtomicI64::new(1000),
        }
    }

    pub fn with_role(self, user_id: i64, role: IssuerRole) -> Self {
        self.set_role(user_id, role);
        self
    }

    pub fn set_role(&self, user_id: i64, role: IssuerRole) {
        self.roles.lock().unwrap().insert(user_id, role);
    }

    /// Make every later call to `method` fail with an API error.
    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than role lookups and sends.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::GetMember { .. } | Call::Send { .. }))
            .collect()
    }

    /// Texts of sent messages, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn lookups(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::GetMember { .. }))
            .count()
    }

    fn record(&self, call: Call) -> Result<(), PlatformError> {
        let method = call.method();
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(method) {
            return Err(PlatformError::Api {
                code: 400,
                description: format!("Bad Request: {method} refused"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn get_member(&self, chat_id: i64, user_id: i64) -> Result<IssuerRole, PlatformError> {
        self.record(Call::GetMember { chat_id, user_id })?;
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&user_id)
            .copied()
            .unwrap_or_else(|| IssuerRole::new(MemberStatus::Member)))
    }

    async fn ban(
        &self,
        chat_id: i64,
        user_id: i64,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        self.record(Call::Ban {
            chat_id,
            user_id,
            until,
        })
    }

    async fn unban(&self, chat_id: i64, user_id: i64) -> Result<(), PlatformError> {
        self.record(Call::Unban { chat_id, user_id })
    }

    async fn restrict(
        &self,
        chat_id: i64,
        user_id: i64,
        permissions: &ChatPermissions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), PlatformError> {
        self.record(Call::Restrict {
            chat_id,
            user_id,
            permissions: permissions.clone(),
            until,
        })
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError> {
        self.record(Call::Delete {
            chat_id,
            message_id,
        })
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: SendOptions,
    ) -> Result<i64, PlatformError> {
        self.record(Call::Send {
            chat_id,
            text: text.to_string(),
            options,
        })?;
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }
}
