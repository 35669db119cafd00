use poise::serenity_prelude as serenity;
use poise::CreateReply;
use tracing::{error, info};

pub(crate) use crate::types::{Context, Data, Error};
use crate::helpers::sticky_channel::colour_value;

pub const PRESENCE: &str = "Server Manager";

pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        ping(),
        about(),
        restart(),
        // add more here
    ]
}

/// Check bot's ping
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await.as_millis();
    ctx.say(format!("🏓 Pong! {}ms", latency)).await?;
    Ok(())
}

/// About the bot
#[poise::command(slash_command, prefix_command)]
pub async fn about(ctx: Context<'_>) -> Result<(), Error> {
    let author = ctx.author();
    let guild_icon = ctx.guild().and_then(|guild| guild.icon_url());

    let mut footer = serenity::CreateEmbedFooter::new(format!("Requested by {}", author.name));
    if let Some(icon) = guild_icon {
        footer = footer.icon_url(icon);
    }

    let embed = serenity::CreateEmbed::new()
        .title("Welcome to Server Manager!")
        .description("A powerful Discord bot for server management, and Creating Custom Message's")
        .colour(colour_value("purple"))
        .field(
            "🛠️ Features",
            "• Server Management\n• Custom Commands\n• Moderation Tools",
            false,
        )
        .author(serenity::CreateEmbedAuthor::new(author.display_name()).icon_url(author.face()))
        .footer(footer)
        .timestamp(serenity::Timestamp::now());

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Restart and reload the bot (Admin only)
#[poise::command(
    slash_command,
    prefix_command,
    default_member_permissions = "ADMINISTRATOR",
    required_permissions = "ADMINISTRATOR"
)]
pub async fn restart(ctx: Context<'_>) -> Result<(), Error> {
    let handle = ctx
        .send(CreateReply::default().content("🔄 Restarting bot...").ephemeral(true))
        .await?;

    let commands = &ctx.framework().options().commands;
    let synced = poise::builtins::register_globally(ctx.http(), commands).await;

    ctx.serenity_context().set_presence(
        Some(serenity::ActivityData::playing(PRESENCE)),
        serenity::OnlineStatus::Online,
    );

    let content = match synced {
        Ok(()) => {
            info!(count = commands.len(), "commands resynced");
            "✅ Bot restarted and commands resynced successfully!"
        }
        Err(e) => {
            error!(error = %e, "failed to resync commands");
            "❌ Failed to restart bot. Check console for errors."
        }
    };

    handle
        .edit(ctx, CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}
