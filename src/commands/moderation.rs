use poise::serenity_prelude as serenity;
use poise::CreateReply;
use serenity::all::Mentionable;
use tracing::{error, info};

pub(crate) use crate::types::{Context, Data, Error};
use crate::helpers::mod_roles::{get_mod_role, has_mod_access, is_administrator, set_mod_role};
use crate::helpers::purge::{purge_channel, PurgeTarget, MAX_PURGE};
use crate::helpers::sticky_channel::PlatformError;


pub async fn is_moderator(ctx: &Context<'_>) -> Result<bool, Error> {
    let author_id = ctx.author().id;
    let is_owner = ctx.data().config.owner_id == Some(author_id);

    let guild_id = match ctx.guild_id() {
        Some(g) => g,
        None => return Ok(is_owner),
    };

    let (is_admin, roles) = match ctx.author_member().await {
        Some(member) => {
            let from_guild = ctx.guild().map(|guild| guild.member_permissions(&member));
            (
                is_administrator(member.permissions, from_guild),
                member.roles.clone(),
            )
        }
        None => (false, Vec::new()),
    };

    let mod_role = get_mod_role(&ctx.data().db, guild_id.get()).await?;
    Ok(has_mod_access(is_owner, is_admin, &roles, mod_role))
}

pub(crate) async fn mod_check(ctx: Context<'_>) -> Result<bool, Error> {
    if is_moderator(&ctx).await? {
        return Ok(true);
    }

    ctx.send(
        CreateReply::default()
            .content("🔒 You need moderator role to use this command!")
            .ephemeral(true),
    )
        .await?;

    Ok(false)
}

pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        kick(),
        deletemessage(),
        deleteusermessage(),
        deletebotmessage(),
        modrole(),
        // add more here
    ]
}

async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(CreateReply::default().content(text).ephemeral(true)).await?;
    Ok(())
}

fn valid_amount(amount: u16) -> bool {
    (1..=MAX_PURGE).contains(&amount)
}

async fn run_purge(ctx: Context<'_>, amount: u16, target: PurgeTarget, whose: &str) -> Result<(), Error> {
    if !valid_amount(amount) {
        return reply_ephemeral(ctx, format!("❌ Please specify a number between 1 and {}!", MAX_PURGE)).await;
    }

    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    match purge_channel(ctx.http(), channel_id, amount as usize, target).await {
        Ok(deleted) => {
            info!(channel_id = %channel_id, deleted, by = %ctx.author().id, "purged messages");
            reply_ephemeral(ctx, format!("🗑️ Successfully deleted {} messages{}!", deleted, whose)).await
        }
        Err(e) => match PlatformError::from(e) {
            PlatformError::Forbidden => {
                reply_ephemeral(ctx, "❌ I don't have permission to delete messages!").await
            }
            other => {
                error!(command = %ctx.command().name, channel_id = %channel_id, error = %other, "purge failed");
                reply_ephemeral(ctx, "❌ An error occurred!").await
            }
        },
    }
}

/// Delete a specified number of messages
#[poise::command(slash_command, prefix_command, guild_only, channel_cooldown = 5, check = "mod_check")]
pub async fn deletemessage(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-200)"]
    amount: u16,
) -> Result<(), Error> {
    run_purge(ctx, amount, PurgeTarget::Everyone, "").await
}

/// Delete messages from a specific user
#[poise::command(slash_command, prefix_command, guild_only, channel_cooldown = 5, check = "mod_check")]
pub async fn deleteusermessage(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-200)"]
    amount: u16,
    #[description = "The user whose messages to delete"]
    target: serenity::User,
) -> Result<(), Error> {
    if target.bot {
        return reply_ephemeral(ctx, "🤖 That's a bot! Use `/deletebotmessage` for bot messages!").await;
    }

    let whose = format!(" from {}", target.mention());
    run_purge(ctx, amount, PurgeTarget::User(target.id), &whose).await
}

/// Delete messages from a specific bot
#[poise::command(slash_command, prefix_command, guild_only, channel_cooldown = 5, check = "mod_check")]
pub async fn deletebotmessage(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-200)"]
    amount: u16,
    #[description = "The bot whose messages to delete"]
    target: serenity::User,
) -> Result<(), Error> {
    if !target.bot {
        return reply_ephemeral(ctx, "👤 That's a user! Use `/deleteusermessage` for user messages!").await;
    }

    let whose = format!(" from bot {}", target.mention());
    run_purge(ctx, amount, PurgeTarget::Bot(target.id), &whose).await
}

/// Kick a member from the server
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "KICK_MEMBERS",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "The member to kick"]
    member: serenity::Member,
    #[description = "Reason for kicking"]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("kick used outside a guild")?;
    let server_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "Unknown Guild".to_string());

    let result = match reason.as_deref() {
        Some(reason) => guild_id.kick_with_reason(ctx.http(), member.user.id, reason).await,
        None => guild_id.kick(ctx.http(), member.user.id).await,
    };

    if let Err(e) = result {
        error!(guild_id = %guild_id, user_id = %member.user.id, error = %e, "kick failed");
        return reply_ephemeral(ctx, "❌ Failed to kick member!").await;
    }

    info!(guild_id = %guild_id, user_id = %member.user.id, by = %ctx.author().id, "member kicked");
    reply_ephemeral(
        ctx,
        format!(
            "✅ Successfully kicked {} from {}\nReason: {}",
            member.mention(),
            server_name,
            reason.as_deref().unwrap_or("No reason provided")
        ),
    )
        .await
}

/// Set the moderator role for command access
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    required_permissions = "ADMINISTRATOR"
)]
pub async fn modrole(
    ctx: Context<'_>,
    #[description = "The role to set as moderator"]
    role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("modrole used outside a guild")?;

    set_mod_role(&ctx.data().db, guild_id.get(), role.id.get()).await?;
    info!(guild_id = %guild_id, role_id = %role.id, "moderator role set");

    reply_ephemeral(ctx, format!("✅ Successfully set {} as the moderator role!", role.mention())).await
}
