use std::env;
use std::path::PathBuf;

use poise::serenity_prelude as serenity;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/bot.db";
const DEFAULT_STICKY_FILE: &str = "data/sticky_messages.json";
const DEFAULT_PREFIX: &str = "SM!";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0} (set DISCORD_TOKEN or TOKEN_SM)")]
    MissingToken(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub database_url: String,
    pub sticky_file: PathBuf,
    pub prefix: String,
    pub owner_id: Option<serenity::UserId>,
    pub enforce_sticky_cooldown: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN")
            .or_else(|| get("TOKEN_SM"))
            .ok_or(ConfigError::MissingToken("bot token"))?;

        let owner_id = match get("BOT_OWNER_ID") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(id) if id != 0 => Some(serenity::UserId::new(id)),
                _ => return Err(ConfigError::Invalid { key: "BOT_OWNER_ID", value: raw }),
            },
            None => None,
        };

        let enforce_sticky_cooldown = match get("STICKY_ENFORCE_COOLDOWN") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                key: "STICKY_ENFORCE_COOLDOWN",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            token,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            sticky_file: get("STICKY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STICKY_FILE)),
            prefix: get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            owner_id,
            enforce_sticky_cooldown,
        })
    }

    /// Token safe to print: first and last four characters only.
    pub fn masked_token(&self) -> String {
        mask_token(&self.token)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("DISCORD_TOKEN", "abc.def.ghi")]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.sticky_file, PathBuf::from(DEFAULT_STICKY_FILE));
        assert_eq!(config.prefix, "SM!");
        assert_eq!(config.owner_id, None);
        assert!(!config.enforce_sticky_cooldown);
    }

    #[test]
    fn legacy_token_name_is_accepted() {
        let config = config(&[("TOKEN_SM", "legacy-token")]).unwrap();
        assert_eq!(config.token, "legacy-token");
    }

    #[test]
    fn missing_token_is_an_error() {
        assert_eq!(config(&[("DISCORD_TOKEN", "  ")]).unwrap_err(), ConfigError::MissingToken("bot token"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config(&[("DISCORD_TOKEN", "t"), ("BOT_OWNER_ID", "me")]),
            Err(ConfigError::Invalid { key: "BOT_OWNER_ID", .. })
        ));
        assert!(matches!(
            config(&[("DISCORD_TOKEN", "t"), ("STICKY_ENFORCE_COOLDOWN", "maybe")]),
            Err(ConfigError::Invalid { key: "STICKY_ENFORCE_COOLDOWN", .. })
        ));
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("DISCORD_TOKEN", "t"),
            ("BOT_OWNER_ID", "1434739350993768630"),
            ("STICKY_ENFORCE_COOLDOWN", "yes"),
            ("STICKY_FILE", "/tmp/s.json"),
            ("COMMAND_PREFIX", "!"),
        ])
        .unwrap();
        assert_eq!(config.owner_id, Some(serenity::UserId::new(1_434_739_350_993_768_630)));
        assert!(config.enforce_sticky_cooldown);
        assert_eq!(config.sticky_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.prefix, "!");
    }

    #[test]
    fn token_is_masked() {
        assert_eq!(mask_token("abcdefghijkl"), "abcd****ijkl");
        assert_eq!(mask_token("short"), "*****");
    }
}
