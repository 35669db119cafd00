use std::time::Duration;

use poise::serenity_prelude as serenity;
use poise::CreateReply;
use tracing::debug;

pub(crate) use crate::types::{Context, Data, Error};
use crate::helpers::sticky_channel::colour_value;

const MENU_TIMEOUT: Duration = Duration::from_secs(60);

pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![embed_creator()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorPage {
    MainMenu,
    Colors,
    Content,
    Images,
}

impl CreatorPage {
    pub const ALL: [CreatorPage; 4] = [
        CreatorPage::MainMenu,
        CreatorPage::Colors,
        CreatorPage::Content,
        CreatorPage::Images,
    ];

    fn key(self) -> &'static str {
        match self {
            CreatorPage::MainMenu => "main_menu",
            CreatorPage::Colors => "colors",
            CreatorPage::Content => "content",
            CreatorPage::Images => "images",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CreatorPage::MainMenu => "Main Menu",
            CreatorPage::Colors => "Colors",
            CreatorPage::Content => "Content",
            CreatorPage::Images => "Images",
        }
    }

    fn style(self) -> serenity::ButtonStyle {
        match self {
            CreatorPage::MainMenu => serenity::ButtonStyle::Primary,
            CreatorPage::Colors => serenity::ButtonStyle::Success,
            CreatorPage::Content => serenity::ButtonStyle::Secondary,
            CreatorPage::Images => serenity::ButtonStyle::Danger,
        }
    }

    pub fn custom_id(self, menu_id: u64) -> String {
        format!("{}:{}", menu_id, self.key())
    }

    /// Inverse of [`CreatorPage::custom_id`] for one particular menu.
    pub fn from_custom_id(custom_id: &str, menu_id: u64) -> Option<Self> {
        let (id, key) = custom_id.split_once(':')?;
        if id.parse::<u64>().ok()? != menu_id {
            return None;
        }
        Self::ALL.into_iter().find(|page| page.key() == key)
    }

    pub fn title(self) -> &'static str {
        match self {
            CreatorPage::MainMenu => "Embed Creator - Main Menu",
            CreatorPage::Colors => "Embed Creator - Colors",
            CreatorPage::Content => "Embed Creator - Content",
            CreatorPage::Images => "Embed Creator - Images",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CreatorPage::MainMenu => "Select an option below to customize your embed:",
            CreatorPage::Colors => {
                "Available colors:\n\n🔵 Blue\n🔴 Red\n🟢 Green\n🟣 Purple\n⚫ Black\n⚪ White"
            }
            CreatorPage::Content => {
                "Content options:\n\n📌 Title\n📄 Description\n📋 Fields\n👤 Author\n👣 Footer"
            }
            CreatorPage::Images => {
                "Image options:\n\n🖼️ Main Image\n🔳 Thumbnail\n🎴 Author Icon\n🏷️ Footer Icon"
            }
        }
    }

    pub fn colour(self) -> u32 {
        match self {
            CreatorPage::MainMenu => colour_value("blue"),
            CreatorPage::Colors => colour_value("green"),
            CreatorPage::Content => colour_value("greyple"),
            CreatorPage::Images => colour_value("red"),
        }
    }

    pub fn fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            CreatorPage::MainMenu => &[
                ("🎨 Colors", "Change embed color"),
                ("📝 Content", "Edit title and description"),
                ("🖼️ Images", "Add images or thumbnails"),
            ],
            _ => &[],
        }
    }

    fn embed(self) -> serenity::CreateEmbed {
        let embed = serenity::CreateEmbed::new()
            .title(self.title())
            .description(self.description())
            .colour(self.colour());

        self.fields()
            .iter()
            .fold(embed, |embed, (name, value)| embed.field(*name, *value, true))
    }
}

fn menu_buttons(menu_id: u64) -> Vec<serenity::CreateActionRow> {
    let buttons = CreatorPage::ALL
        .into_iter()
        .map(|page| {
            serenity::CreateButton::new(page.custom_id(menu_id))
                .label(page.label())
                .style(page.style())
        })
        .collect();

    vec![serenity::CreateActionRow::Buttons(buttons)]
}

/// Create a custom embed using an interactive menu
#[poise::command(
    slash_command,
    prefix_command,
    default_member_permissions = "MANAGE_MESSAGES",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn embed_creator(ctx: Context<'_>) -> Result<(), Error> {
    let menu_id = ctx.id();

    ctx.send(
        CreateReply::default()
            .embed(CreatorPage::MainMenu.embed())
            .components(menu_buttons(menu_id))
            .ephemeral(true),
    )
        .await?;

    while let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(MENU_TIMEOUT)
        .filter(move |press| CreatorPage::from_custom_id(&press.data.custom_id, menu_id).is_some())
        .await
    {
        let page = match CreatorPage::from_custom_id(&press.data.custom_id, menu_id) {
            Some(page) => page,
            None => continue,
        };
        debug!(menu_id, page = ?page, "embed creator page");

        let update = serenity::CreateInteractionResponseMessage::new()
            .embed(page.embed())
            .components(menu_buttons(menu_id));
        press
            .create_response(ctx, serenity::CreateInteractionResponse::UpdateMessage(update))
            .await?;
    }

    Ok(())
}
