use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use thiserror::Error;

use crate::helpers::purge::{purge_channel, PurgeTarget};
use crate::structs::sticky_message::{StickyContent, StickyRecord, DEFAULT_EMBED_TITLE};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("message or channel not found")]
    NotFound,
    #[error("missing permissions")]
    Forbidden,
    #[error("discord request failed: {0}")]
    Http(String),
}

impl From<serenity::Error> for PlatformError {
    fn from(e: serenity::Error) -> Self {
        if let serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) = &e {
            match response.status_code.as_u16() {
                404 => return PlatformError::NotFound,
                403 => return PlatformError::Forbidden,
                _ => {}
            }
        }
        PlatformError::Http(e.to_string())
    }
}

pub fn colour_value(name: &str) -> u32 {
    match name.to_ascii_lowercase().as_str() {
        "red" => 0xe74c3c,
        "green" => 0x2ecc71,
        "purple" => 0x9b59b6,
        "greyple" => 0x99aab5,
        _ => 0x3498db,
    }
}

/// What actually gets sent to the channel for a sticky.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StickyPayload {
    Text(String),
    Embed {
        title: String,
        description: String,
        colour: u32,
        footer: String,
    },
}

impl StickyPayload {
    pub fn new(name: &str, content: &StickyContent, guild_name: &str) -> Self {
        match content {
            StickyContent::Plain(text) => StickyPayload::Text(text.clone()),
            StickyContent::Embed(embed) => StickyPayload::Embed {
                title: embed
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_EMBED_TITLE.to_string()),
                description: embed.description.clone(),
                colour: colour_value(&embed.color),
                footer: format!("📌 {} • {}", name, guild_name),
            },
        }
    }

    pub fn for_record(record: &StickyRecord, guild_name: &str) -> Self {
        Self::new(&record.name, &record.content, guild_name)
    }

    pub fn to_message(&self) -> serenity::CreateMessage {
        match self {
            StickyPayload::Text(text) => serenity::CreateMessage::new().content(text),
            StickyPayload::Embed {
                title,
                description,
                colour,
                footer,
            } => {
                let embed = serenity::CreateEmbed::new()
                    .title(title)
                    .description(description)
                    .colour(*colour)
                    .footer(serenity::CreateEmbedFooter::new(footer))
                    .timestamp(serenity::Timestamp::now());
                serenity::CreateMessage::new().embed(embed)
            }
        }
    }
}

/// The channel operations the sticky subsystem needs from the platform.
#[async_trait]
pub trait StickyChannel: Send + Sync {
    async fn delete_message(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    ) -> Result<(), PlatformError>;

    async fn send_sticky(
        &self,
        channel_id: serenity::ChannelId,
        payload: &StickyPayload,
    ) -> Result<serenity::MessageId, PlatformError>;

    /// Deletes the bot's own messages among the `scan_limit` most recent.
    async fn purge_own_messages(
        &self,
        channel_id: serenity::ChannelId,
        scan_limit: usize,
    ) -> Result<usize, PlatformError>;
}

pub struct DiscordChannel {
    http: Arc<serenity::Http>,
    bot_id: serenity::UserId,
}

impl DiscordChannel {
    pub fn new(http: Arc<serenity::Http>, bot_id: serenity::UserId) -> Self {
        Self { http, bot_id }
    }
}

#[async_trait]
impl StickyChannel for DiscordChannel {
    async fn delete_message(
        &self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    ) -> Result<(), PlatformError> {
        channel_id.delete_message(&self.http, message_id).await?;
        Ok(())
    }

    async fn send_sticky(
        &self,
        channel_id: serenity::ChannelId,
        payload: &StickyPayload,
    ) -> Result<serenity::MessageId, PlatformError> {
        let message = channel_id
            .send_message(&*self.http, payload.to_message())
            .await?;
        Ok(message.id)
    }

    async fn purge_own_messages(
        &self,
        channel_id: serenity::ChannelId,
        scan_limit: usize,
    ) -> Result<usize, PlatformError> {
        let deleted = purge_channel(&self.http, channel_id, scan_limit, PurgeTarget::Bot(self.bot_id)).await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::sticky_message::EmbedContent;

    #[test]
    fn plain_payload_is_the_text() {
        let payload = StickyPayload::new("Rules", &StickyContent::Plain("Be nice".into()), "Guild");
        assert_eq!(payload, StickyPayload::Text("Be nice".into()));
    }

    #[test]
    fn embed_payload_has_pinned_footer() {
        let content = StickyContent::Embed(EmbedContent {
            title: Some("Welcome".into()),
            description: "Read the rules".into(),
            color: "red".into(),
        });

        let payload = StickyPayload::new("welcome", &content, "Rust Lounge");
        assert_eq!(
            payload,
            StickyPayload::Embed {
                title: "Welcome".into(),
                description: "Read the rules".into(),
                colour: 0xe74c3c,
                footer: "📌 welcome • Rust Lounge".into(),
            }
        );
    }

    #[test]
    fn embed_without_title_uses_default() {
        let content = StickyContent::Embed(EmbedContent {
            title: None,
            description: "x".into(),
            color: "blue".into(),
        });

        match StickyPayload::new("n", &content, "g") {
            StickyPayload::Embed { title, .. } => assert_eq!(title, "Sticky Message"),
            other => panic!("expected embed, got {:?}", other),
        }
    }

    #[test]
    fn unknown_colours_fall_back_to_blue() {
        assert_eq!(colour_value("green"), 0x2ecc71);
        assert_eq!(colour_value("Purple"), 0x9b59b6);
        assert_eq!(colour_value("chartreuse"), 0x3498db);
    }
}
