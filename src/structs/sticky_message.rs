use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COOLDOWN_SECONDS: u64 = 1;
pub const DEFAULT_EMBED_TITLE: &str = "Sticky Message";
pub const DEFAULT_COLOUR: &str = "blue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedContent {
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    #[serde(default = "default_colour")]
    pub color: String,
}

/// Sticky body, either plain text or the pieces of an embed.
///
/// Serialises as a bare JSON string or an object, which is the on-disk shape
/// the store has always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StickyContent {
    Embed(EmbedContent),
    Plain(String),
}

impl StickyContent {
    pub fn is_embed(&self) -> bool {
        matches!(self, StickyContent::Embed(_))
    }

    /// Text that must be non-empty for a sticky to be worth posting.
    pub fn body(&self) -> &str {
        match self {
            StickyContent::Embed(embed) => &embed.description,
            StickyContent::Plain(text) => text,
        }
    }

    /// First 50 characters of the body, for listings.
    pub fn preview(&self) -> String {
        self.body().chars().take(50).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickyRecord {
    pub channel_id: serenity::ChannelId,
    pub message_id: serenity::MessageId,
    pub name: String,
    pub content: StickyContent,
    pub message_count: u32,
    pub cooldown_seconds: u64,
    pub last_sent_at: DateTime<Utc>,
}

impl StickyRecord {
    pub fn is_embed(&self) -> bool {
        self.content.is_embed()
    }
}

/// One entry of the sticky file, keyed by the channel id string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSticky {
    pub message_id: u64,
    pub content: StickyContent,
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default)]
    pub is_embed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u64>,
}

impl From<&StickyRecord> for StoredSticky {
    fn from(record: &StickyRecord) -> Self {
        Self {
            message_id: record.message_id.get(),
            content: record.content.clone(),
            name: record.name.clone(),
            is_embed: record.is_embed(),
            cooldown: Some(record.cooldown_seconds),
        }
    }
}

impl StoredSticky {
    /// Rebuilds the runtime record. Counters start over and the last send
    /// time is taken as `loaded_at`.
    pub fn into_record(self, channel_id: serenity::ChannelId, loaded_at: DateTime<Utc>) -> Option<StickyRecord> {
        if self.message_id == 0 {
            return None;
        }

        Some(StickyRecord {
            channel_id,
            message_id: serenity::MessageId::new(self.message_id),
            name: self.name,
            content: self.content,
            message_count: 0,
            cooldown_seconds: self.cooldown.unwrap_or(DEFAULT_COOLDOWN_SECONDS),
            last_sent_at: loaded_at,
        })
    }
}

fn default_colour() -> String {
    DEFAULT_COLOUR.to_string()
}

fn unnamed() -> String {
    "Unnamed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_content_reads_from_bare_string() {
        let stored: StoredSticky = serde_json::from_str(
            r#"{"message_id": 1200000000000000001, "content": "Be nice", "name": "Rules", "is_embed": false}"#,
        )
        .unwrap();

        assert_eq!(stored.content, StickyContent::Plain("Be nice".into()));
        assert_eq!(stored.cooldown, None);
    }

    #[test]
    fn embed_content_fills_missing_colour() {
        let stored: StoredSticky = serde_json::from_str(
            r#"{"message_id": 5, "content": {"title": null, "description": "Read the pins"}, "name": "Pins", "is_embed": true}"#,
        )
        .unwrap();

        match stored.content {
            StickyContent::Embed(embed) => {
                assert_eq!(embed.title, None);
                assert_eq!(embed.color, "blue");
            }
            other => panic!("expected embed, got {:?}", other),
        }
    }

    #[test]
    fn entry_without_name_is_unnamed() {
        let stored: StoredSticky =
            serde_json::from_str(r#"{"message_id": 7, "content": "hi"}"#).unwrap();
        assert_eq!(stored.name, "Unnamed");
        assert!(!stored.is_embed);
    }

    #[test]
    fn large_message_ids_survive() {
        let id = u64::MAX - 3;
        let json = format!(r#"{{"message_id": {}, "content": "x", "name": "n", "is_embed": false}}"#, id);
        let stored: StoredSticky = serde_json::from_str(&json).unwrap();
        assert_eq!(stored.message_id, id);
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let content = StickyContent::Plain("📌".repeat(60));
        assert_eq!(content.preview().chars().count(), 50);
    }

    #[test]
    fn loaded_record_starts_armed_with_default_cooldown() {
        let stored = StoredSticky {
            message_id: 99,
            content: StickyContent::Plain("hello".into()),
            name: "greeting".into(),
            is_embed: false,
            cooldown: None,
        };
        let now = Utc::now();
        let record = stored
            .into_record(serenity::ChannelId::new(10), now)
            .unwrap();

        assert_eq!(record.message_count, 0);
        assert_eq!(record.cooldown_seconds, DEFAULT_COOLDOWN_SECONDS);
        assert_eq!(record.last_sent_at, now);
    }
}
