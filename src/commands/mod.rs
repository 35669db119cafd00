pub mod embed_creator;
pub mod general;
pub mod moderation;
pub mod sticky;

use crate::types::{Data, Error};
use poise::Command;

pub fn all_commands() -> Vec<Command<Data, Error>> {
    let mut commands = Vec::new();

    commands.extend(sticky::all_commands());
    commands.extend(moderation::all_commands());
    commands.extend(general::all_commands());
    commands.extend(embed_creator::all_commands());

    commands
}
