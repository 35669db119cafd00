use poise::serenity_prelude as serenity;
use poise::CreateReply;
use tracing::error;

pub(crate) use crate::types::{Context, Data, Error};
use crate::helpers::sticky_channel::{colour_value, DiscordChannel};
use crate::helpers::sticky_manager::{NewSticky, StickyError};
use crate::helpers::sticky_registry::RegistryError;
use crate::structs::sticky_message::{EmbedContent, StickyContent, StickyRecord, DEFAULT_COOLDOWN_SECONDS};

const ALREADY_EXISTS: &str = "❌ This channel already has a sticky message! Remove it first.";
const EMPTY_CONTENT: &str = "❌ Please provide a message!";

pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        sticky(),
        stickremove(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum StickyAction {
    #[name = "create"]
    Create,
    #[name = "create-embed"]
    CreateEmbed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum StickyColour {
    #[name = "blue"]
    Blue,
    #[name = "red"]
    Red,
    #[name = "green"]
    Green,
    #[name = "purple"]
    Purple,
}

impl StickyColour {
    pub fn as_str(self) -> &'static str {
        match self {
            StickyColour::Blue => "blue",
            StickyColour::Red => "red",
            StickyColour::Green => "green",
            StickyColour::Purple => "purple",
        }
    }
}

fn sticky_content(
    action: StickyAction,
    description: String,
    title: Option<String>,
    colour: Option<StickyColour>,
) -> StickyContent {
    match action {
        StickyAction::Create => StickyContent::Plain(description),
        StickyAction::CreateEmbed => StickyContent::Embed(EmbedContent {
            title,
            description,
            color: colour.unwrap_or(StickyColour::Blue).as_str().to_string(),
        }),
    }
}

/// Channel heading and preview for every sticky the guild can see.
fn listing_fields(
    records: &[StickyRecord],
    channel_name: impl Fn(serenity::ChannelId) -> Option<String>,
) -> Vec<(String, String)> {
    records
        .iter()
        .filter_map(|record| {
            let channel = channel_name(record.channel_id)?;
            Some((
                format!("#{} - {}", channel, record.name),
                format!("{}...", record.content.preview()),
            ))
        })
        .collect()
}

fn guild_name(ctx: &Context<'_>) -> String {
    ctx.guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "Unknown Guild".to_string())
}

fn discord_channel(ctx: &Context<'_>) -> DiscordChannel {
    DiscordChannel::new(ctx.serenity_context().http.clone(), ctx.framework().bot_id)
}

async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(CreateReply::default().content(text).ephemeral(true)).await?;
    Ok(())
}

/// Create a sticky message
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "MANAGE_MESSAGES",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn sticky(
    ctx: Context<'_>,
    #[description = "Name for the sticky message"]
    name: String,
    #[description = "Choose create or create-embed"]
    action: StickyAction,
    #[description = "Message content or embed description"]
    description: Option<String>,
    #[description = "Title for embed (only for create-embed)"]
    title: Option<String>,
    #[description = "Color for embed (optional)"]
    color: Option<StickyColour>,
    #[description = "Cooldown in seconds between sticky messages (default: 1)"]
    cooldown: Option<u64>,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id();
    let stickies = &ctx.data().stickies;

    if stickies.get(channel_id).await.is_some() {
        return reply_ephemeral(ctx, ALREADY_EXISTS).await;
    }

    let description = match description.filter(|d| !d.trim().is_empty()) {
        Some(description) => description,
        None => return reply_ephemeral(ctx, EMPTY_CONTENT).await,
    };

    ctx.defer_ephemeral().await?;

    let cooldown = cooldown.unwrap_or(DEFAULT_COOLDOWN_SECONDS);
    let request = NewSticky {
        channel_id,
        name: name.clone(),
        content: sticky_content(action, description, title, color),
        cooldown_seconds: cooldown,
        guild_name: guild_name(&ctx),
    };

    let channel = discord_channel(&ctx);
    match stickies.create_sticky(&channel, request).await {
        Ok(_) => {
            reply_ephemeral(ctx, format!("✅ Sticky message '{}' created with {}s cooldown!", name, cooldown)).await
        }
        Err(StickyError::Registry(RegistryError::AlreadyExists(_))) => reply_ephemeral(ctx, ALREADY_EXISTS).await,
        Err(StickyError::EmptyContent) => reply_ephemeral(ctx, EMPTY_CONTENT).await,
        Err(e) => {
            error!(channel_id = %channel_id, error = %e, "sticky command failed");
            reply_ephemeral(ctx, "❌ Failed to create sticky message!").await
        }
    }
}

/// Remove a sticky message by name
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "MANAGE_MESSAGES",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn stickremove(
    ctx: Context<'_>,
    #[description = "Name of the sticky message to remove"]
    name: String,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id();
    let stickies = &ctx.data().stickies;
    let records = stickies.list().await;

    let (fields, current_channel) = {
        let guild = ctx.guild();
        let channel_name = |id: serenity::ChannelId| {
            guild
                .as_ref()
                .and_then(|g| g.channels.get(&id))
                .map(|c| c.name.clone())
        };
        (listing_fields(&records, &channel_name), channel_name(channel_id))
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("Active Sticky Messages")
        .colour(colour_value("blue"))
        .timestamp(serenity::Timestamp::now());

    if records.is_empty() {
        embed = embed.description("No sticky messages are set in any channel");
    }
    for (heading, preview) in fields {
        embed = embed.field(heading, preview, false);
    }

    let channel = discord_channel(&ctx);
    let reply = match stickies.remove_sticky(&channel, channel_id, &name).await {
        Ok(_) => {
            let action = format!(
                "Removed sticky message '{}' from #{}",
                name,
                current_channel.unwrap_or_else(|| channel_id.to_string())
            );
            CreateReply::default().embed(embed.field("✅ Action Taken", action, false))
        }
        Err(StickyError::NameMismatch { .. }) | Err(StickyError::Registry(RegistryError::NotFound(_))) => {
            CreateReply::default()
                .content(format!("❌ No sticky message found with name '{}'!", name))
                .embed(embed)
        }
        Err(e) => {
            error!(channel_id = %channel_id, error = %e, "stickremove command failed");
            CreateReply::default().content("❌ Failed to remove sticky message!")
        }
    };

    ctx.send(reply.ephemeral(true)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(channel: u64, name: &str, content: StickyContent) -> StickyRecord {
        StickyRecord {
            channel_id: serenity::ChannelId::new(channel),
            message_id: serenity::MessageId::new(1),
            name: name.into(),
            content,
            message_count: 0,
            cooldown_seconds: 1,
            last_sent_at: Utc::now(),
        }
    }

    #[test]
    fn create_action_makes_plain_text() {
        let content = sticky_content(StickyAction::Create, "Be nice".into(), Some("ignored".into()), None);
        assert_eq!(content, StickyContent::Plain("Be nice".into()));
    }

    #[test]
    fn create_embed_defaults_to_blue() {
        let content = sticky_content(StickyAction::CreateEmbed, "Read the pins".into(), None, None);
        assert_eq!(
            content,
            StickyContent::Embed(EmbedContent {
                title: None,
                description: "Read the pins".into(),
                color: "blue".into(),
            })
        );

        let content = sticky_content(
            StickyAction::CreateEmbed,
            "x".into(),
            Some("Title".into()),
            Some(StickyColour::Purple),
        );
        assert!(matches!(content, StickyContent::Embed(EmbedContent { ref color, .. }) if color == "purple"));
    }

    #[test]
    fn listing_skips_channels_outside_the_guild() {
        let records = vec![
            record(1, "Rules", StickyContent::Plain("Be nice".into())),
            record(2, "Elsewhere", StickyContent::Plain("hidden".into())),
            record(
                3,
                "Pins",
                StickyContent::Embed(EmbedContent {
                    title: None,
                    description: "a".repeat(80),
                    color: "red".into(),
                }),
            ),
        ];

        let fields = listing_fields(&records, |id| match id.get() {
            1 => Some("general".to_string()),
            3 => Some("announcements".to_string()),
            _ => None,
        });

        assert_eq!(
            fields,
            vec![
                ("#general - Rules".to_string(), "Be nice...".to_string()),
                ("#announcements - Pins".to_string(), format!("{}...", "a".repeat(50))),
            ]
        );
    }
}
