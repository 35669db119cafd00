use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use poise::serenity_prelude as serenity;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::helpers::sticky_channel::{PlatformError, StickyChannel, StickyPayload};
use crate::helpers::sticky_registry::{RegistryError, StickyRegistry};
use crate::helpers::sticky_store::StickyStore;
use crate::structs::sticky_message::{StickyContent, StickyRecord};

/// How far back the create command looks for old bot messages to clear.
pub const OWN_MESSAGE_SCAN: usize = 50;

#[derive(Debug, Error)]
pub enum StickyError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("sticky content is empty")]
    EmptyContent,
    #[error("no sticky named {name:?} in this channel")]
    NameMismatch { name: String },
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

#[derive(Debug, Clone)]
pub struct NewSticky {
    pub channel_id: serenity::ChannelId,
    pub name: String,
    pub content: StickyContent,
    pub cooldown_seconds: u64,
    pub guild_name: String,
}

pub struct StickyService {
    registry: Mutex<StickyRegistry>,
    store: StickyStore,
    persist_lock: Mutex<()>,
    channel_locks: Mutex<HashMap<serenity::ChannelId, Arc<Mutex<()>>>>,
}

impl StickyService {
    pub async fn load(store: StickyStore, enforce_cooldown: bool) -> Self {
        let registry = StickyRegistry::with_records(store.load().await, enforce_cooldown);
        info!(count = registry.len(), enforce_cooldown, "sticky service ready");
        Self {
            registry: Mutex::new(registry),
            store,
            persist_lock: Mutex::new(()),
            channel_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn channel_lock(&self, channel_id: serenity::ChannelId) -> Arc<Mutex<()>> {
        let mut locks = self.channel_locks.lock().await;
        locks.entry(channel_id).or_default().clone()
    }

    /// Writes the whole registry out. Failures are logged, never returned.
    ///
    /// The snapshot is taken under `persist_lock` so saves land in the order
    /// their snapshots were taken.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let records = self.registry.lock().await.records();
        if let Err(e) = self.store.save(&records).await {
            error!(path = %self.store.path().display(), error = %e, "failed to save sticky messages");
        }
    }

    pub async fn get(&self, channel_id: serenity::ChannelId) -> Option<StickyRecord> {
        self.registry.lock().await.get(channel_id).cloned()
    }

    #[cfg(test)]
    pub async fn state(&self, channel_id: serenity::ChannelId) -> crate::helpers::sticky_registry::StickyState {
        self.registry.lock().await.state(channel_id)
    }

    pub async fn list(&self) -> Vec<StickyRecord> {
        self.registry.lock().await.records()
    }

    pub async fn create_sticky(
        &self,
        channel: &dyn StickyChannel,
        request: NewSticky,
    ) -> Result<StickyRecord, StickyError> {
        let lock = self.channel_lock(request.channel_id).await;
        let _guard = lock.lock().await;

        if self.registry.lock().await.get(request.channel_id).is_some() {
            return Err(RegistryError::AlreadyExists(request.channel_id).into());
        }
        if request.content.body().trim().is_empty() {
            return Err(StickyError::EmptyContent);
        }

        match channel.purge_own_messages(request.channel_id, OWN_MESSAGE_SCAN).await {
            Ok(deleted) => debug!(channel_id = %request.channel_id, deleted, "cleared old bot messages"),
            Err(e) => warn!(channel_id = %request.channel_id, error = %e, "could not clear old bot messages"),
        }

        let payload = StickyPayload::new(&request.name, &request.content, &request.guild_name);
        let message_id = channel.send_sticky(request.channel_id, &payload).await?;

        let record = self.registry.lock().await.create(
            request.channel_id,
            message_id,
            request.name,
            request.content,
            request.cooldown_seconds,
            Utc::now(),
        )?;

        info!(channel_id = %record.channel_id, name = %record.name, "sticky message created");
        self.persist().await;
        Ok(record)
    }

    /// Removes the channel's sticky if its name matches exactly.
    pub async fn remove_sticky(
        &self,
        channel: &dyn StickyChannel,
        channel_id: serenity::ChannelId,
        name: &str,
    ) -> Result<StickyRecord, StickyError> {
        let lock = self.channel_lock(channel_id).await;
        let _guard = lock.lock().await;

        let message_id = match self.registry.lock().await.get(channel_id) {
            Some(record) if record.name == name => record.message_id,
            Some(_) => return Err(StickyError::NameMismatch { name: name.to_string() }),
            None => return Err(RegistryError::NotFound(channel_id).into()),
        };

        match channel.delete_message(channel_id, message_id).await {
            Ok(()) | Err(PlatformError::NotFound) => {}
            Err(e) => warn!(channel_id = %channel_id, message_id = %message_id, error = %e, "could not delete sticky message"),
        }

        let record = self.registry.lock().await.remove(channel_id)?;
        info!(channel_id = %channel_id, name = %record.name, "sticky message removed");
        self.persist().await;
        Ok(record)
    }

    /// Counts a non-bot message and reposts the sticky once enough have
    /// piled up. Returns the new message id when a repost happened.
    ///
    /// If sending fails the registry is left as it was, so the next message
    /// tries again.
    pub async fn handle_message(
        &self,
        channel: &dyn StickyChannel,
        channel_id: serenity::ChannelId,
        guild_name: &str,
    ) -> Result<Option<serenity::MessageId>, StickyError> {
        if self.registry.lock().await.get(channel_id).is_none() {
            return Ok(None);
        }

        let lock = self.channel_lock(channel_id).await;
        let _guard = lock.lock().await;

        let decision = match self.registry.lock().await.record_message(channel_id, Utc::now()) {
            Some(decision) if decision.should_repost => decision,
            _ => return Ok(None),
        };
        let old = decision.record;

        match channel.delete_message(channel_id, old.message_id).await {
            Ok(()) | Err(PlatformError::NotFound) => {}
            Err(e) => warn!(
                channel_id = %channel_id,
                message_id = %old.message_id,
                error = %e,
                "could not delete previous sticky, reposting anyway"
            ),
        }

        let payload = StickyPayload::for_record(&old, guild_name);
        let new_id = channel.send_sticky(channel_id, &payload).await?;

        self.registry
            .lock()
            .await
            .repost(channel_id, new_id, Utc::now())?;
        debug!(channel_id = %channel_id, message_id = %new_id, "sticky message reposted");

        self.persist().await;
        Ok(Some(new_id))
    }
}
