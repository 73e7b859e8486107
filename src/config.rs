use std::path::PathBuf;

use serenity::model::prelude::*;

use crate::error::ConfigError;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_KEEPALIVE_PORT: u16 = 3000;

/// Settings for the ticket bot process.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub application_id: ApplicationId,
    pub guild_id: GuildId,
    pub support_role: Option<RoleId>,
    pub data_dir: PathBuf,
    pub keepalive_port: u16,
}

/// Settings for the one-off rules poster.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub token: String,
    pub channel_id: ChannelId,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keepalive_port = match optional(&lookup, "PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "PORT",
                value: port,
            })?,
            None => DEFAULT_KEEPALIVE_PORT,
        };

        Ok(Self {
            token: required(&lookup, "DISCORD_TOKEN")?,
            application_id: ApplicationId::new(snowflake(&lookup, "CLIENT_ID")?),
            guild_id: GuildId::new(snowflake(&lookup, "GUILD_ID")?),
            support_role: optional_snowflake(&lookup, "SUPPORT_ROLE_ID")?.map(RoleId::new),
            data_dir: optional(&lookup, "DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            keepalive_port,
        })
    }
}

impl RulesConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            token: required(&lookup, "DISCORD_TOKEN")?,
            channel_id: ChannelId::new(snowflake(&lookup, "CHANNEL_ID")?),
        })
    }
}

/// Blank values count as unset.
fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::MissingEnvVar(name))
}

fn parse_snowflake(name: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ConfigError::InvalidEnvVar { name, value }),
    }
}

fn snowflake<F>(lookup: &F, name: &'static str) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_snowflake(name, required(lookup, name)?)
}

fn optional_snowflake<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)
        .map(|value| parse_snowflake(name, value))
        .transpose()
}
