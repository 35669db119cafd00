use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use poise::serenity_prelude as serenity;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::structs::sticky_message::{StickyRecord, StoredSticky};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sticky file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sticky file json: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON file holding every sticky, keyed by channel id.
pub struct StickyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StickyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file. A missing or unreadable file yields no stickies.
    pub async fn load(&self) -> Vec<StickyRecord> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no sticky file found, starting fresh");
                return Vec::new();
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read sticky file");
                return Vec::new();
            }
        };

        let stored: BTreeMap<String, serde_json::Value> = match serde_json::from_slice(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "sticky file is malformed, ignoring it");
                return Vec::new();
            }
        };

        let loaded_at = Utc::now();
        let mut records = Vec::with_capacity(stored.len());
        for (key, entry) in stored {
            let channel_id = match key.parse::<u64>() {
                Ok(id) if id != 0 => serenity::ChannelId::new(id),
                _ => {
                    warn!(key = %key, "skipping sticky with invalid channel id");
                    continue;
                }
            };

            let entry: StoredSticky = match serde_json::from_value(entry) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(channel_id = %channel_id, error = %e, "skipping malformed sticky entry");
                    continue;
                }
            };

            if entry.is_embed != entry.content.is_embed() {
                warn!(channel_id = %channel_id, "is_embed flag disagrees with content, trusting content");
            }

            match entry.into_record(channel_id, loaded_at) {
                Some(record) => records.push(record),
                None => warn!(channel_id = %channel_id, "skipping sticky without a message id"),
            }
        }

        info!(count = records.len(), "sticky messages loaded");
        records
    }

    /// Overwrites the file with `records`, going through a temp file so a
    /// crash mid-write leaves the previous contents in place.
    pub async fn save(&self, records: &[StickyRecord]) -> Result<(), StoreError> {
        let stored: BTreeMap<String, StoredSticky> = records
            .iter()
            .map(|record| (record.channel_id.get().to_string(), StoredSticky::from(record)))
            .collect();
        let json = serde_json::to_vec_pretty(&stored)?;

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(count = records.len(), "sticky messages saved");
        Ok(())
    }
}
