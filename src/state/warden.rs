//! The Warden - shared state for every update task.
//!
//! Built once in `main` and shared as `Arc<Warden>`. Tests build their own
//! with a recording platform and a temp-dir store, so no two tests share
//! a blacklist or a document.

use crate::config::Config;
use crate::db::StoreHandle;
use crate::platform::ChatPlatform;
use crate::security::{Authorizer, Blacklist, OwnerGate};
use crate::services::{ModerationExecutor, PermissionSchema, SearchClient, WelcomeManager};
use std::sync::Arc;
use tracing::info;

/// Shared bot state.
pub struct Warden {
    /// Username used to accept `/command@username`.
    pub bot_username: Option<String>,
    pub platform: Arc<dyn ChatPlatform>,
    pub owners: OwnerGate,
    /// Volatile; empty on every start.
    pub blacklist: Blacklist,
    pub search: SearchClient,
    pub moderation: ModerationExecutor,
    pub welcome: WelcomeManager,
}

impl Warden {
    pub fn new(config: &Config, platform: Arc<dyn ChatPlatform>, store: StoreHandle) -> Self {
        let schema = PermissionSchema::for_version(config.telegram.permission_schema);
        let authorizer = Arc::new(Authorizer::new(Arc::clone(&platform)));

        info!(
            owners = config.bot.owners.len(),
            permission_schema = schema.name,
            "Warden state initialized"
        );

        Self {
            bot_username: config.bot.username.clone(),
            moderation: ModerationExecutor::new(
                Arc::clone(&platform),
                Arc::clone(&authorizer),
                store.clone(),
                schema,
            ),
            welcome: WelcomeManager::new(Arc::clone(&platform), authorizer, store),
            platform,
            owners: OwnerGate::new(config.bot.owners.iter().copied()),
            blacklist: Blacklist::new(),
            search: SearchClient::new(&config.search),
        }
    }
}
