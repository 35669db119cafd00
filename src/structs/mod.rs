pub mod guild_config;
pub mod sticky_message;
