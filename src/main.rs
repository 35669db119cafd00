use std::str::FromStr;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use serenity::all::FullEvent;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod helpers;
mod structs;
mod types;

use types::{Context, Data, Error};

use crate::commands::all_commands;
use crate::commands::general::PRESENCE;
use crate::config::Config;
use crate::helpers::mod_roles::init_guild_config_table;
use crate::helpers::sticky_channel::DiscordChannel;
use crate::helpers::sticky_manager::StickyService;
use crate::helpers::sticky_store::StickyStore;

async fn reply_failure(ctx: Context<'_>, text: &str) {
    let result = match ctx {
        poise::Context::Prefix(prefix_ctx) => prefix_ctx
            .msg
            .react(&prefix_ctx.serenity_context().http, '❌')
            .await
            .map(|_| ()),
        poise::Context::Application(_) => ctx
            .send(poise::CreateReply::default().content(text).ephemeral(true))
            .await
            .map(|_| ()),
    };

    if let Err(e) = result {
        warn!(command = %ctx.command().name, error = %e, "could not report command failure");
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => panic!("Failed to start bot: {}", error),
        poise::FrameworkError::Command { ctx, error, .. } => {
            error!(command = %ctx.command().name, error = %error, "command failed");
            reply_failure(ctx, "❌ An error occurred while executing this command!").await;
        }
        poise::FrameworkError::ArgumentParse { ctx, error, input, .. } => {
            warn!(command = %ctx.command().name, input = ?input, error = %error, "bad command arguments");
            reply_failure(ctx, "❌ Invalid command arguments!").await;
        }
        poise::FrameworkError::CooldownHit { remaining_cooldown, ctx, .. } => {
            let text = format!(
                "⏰ Command on cooldown. Try again in {:.2}s",
                remaining_cooldown.as_secs_f32()
            );
            reply_failure(ctx, &text).await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            reply_failure(ctx, "🔒 You don't have permission to use this command!").await;
        }
        poise::FrameworkError::CommandCheckFailed { ctx, error, .. } => {
            let guild_name = ctx
                .guild()
                .map(|guild| guild.name.clone())
                .unwrap_or_else(|| "Unknown Guild".to_string());

            match error {
                Some(error) => error!(command = %ctx.command().name, error = %error, "command check errored"),
                None => info!(
                    command = %ctx.command().name,
                    user = %ctx.author().name,
                    guild = %guild_name,
                    "command permissions failed"
                ),
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(event = event.snake_case_name(), error = %error, "event handler failed");
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = %e, "unknown error")
            }
        }
    }
}

async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    bot_id: serenity::UserId,
    data: &Data,
) {
    if message.author.bot {
        return;
    }

    let guild_name = message
        .guild_id
        .and_then(|guild_id| guild_id.name(&ctx.cache))
        .unwrap_or_else(|| "Unknown Guild".to_string());

    let channel = DiscordChannel::new(ctx.http.clone(), bot_id);
    if let Err(e) = data
        .stickies
        .handle_message(&channel, message.channel_id, &guild_name)
        .await
    {
        error!(channel_id = %message.channel_id, error = %e, "error updating sticky message");
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!(user = %data_about_bot.user.name, guilds = data_about_bot.guilds.len(), "connected");
        }
        FullEvent::Message { new_message } => {
            handle_message(ctx, new_message, framework.bot_id, data).await;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);
    info!(token = %config.masked_token(), "token found");

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    if let Some(parent) = connect_options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let pool = SqlitePool::connect_with(connect_options).await?;
    init_guild_config_table(&pool).await?;

    let stickies = Arc::new(
        StickyService::load(
            StickyStore::new(&config.sticky_file),
            config.enforce_sticky_cooldown,
        )
            .await,
    );

    let intents =
        serenity::GatewayIntents::GUILDS
            | serenity::GatewayIntents::GUILD_MESSAGES
            | serenity::GatewayIntents::MESSAGE_CONTENT;

    let setup_config = Arc::clone(&config);
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(command = %ctx.command().qualified_name, user = %ctx.author().name, "running command");
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(command = %ctx.command().qualified_name, "command ran");
                })
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!(count = framework.options().commands.len(), "commands synced");

                Ok(Data {
                    db: pool,
                    stickies,
                    config: setup_config,
                })
            })
        })
        .build();

    let mut client = serenity::Client::builder(&config.token, intents)
        .framework(framework)
        .activity(serenity::ActivityData::playing(PRESENCE))
        .status(serenity::OnlineStatus::Online)
        .await?;

    client.start().await?;

    Ok(())
}
