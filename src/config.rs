use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: Option<u64>,
    pub database_url: String,
    pub database_pool_size: u32,
    pub status_message: String,
    pub dev_guild_id: Option<u64>,
    pub register_commands: bool,

    // Filter command settings
    pub stopall_confirm_timeout_secs: u64,

    // Speed test settings
    pub speedtest_download_url: String,
    pub speedtest_upload_url: String,
    pub speedtest_upload_bytes: usize,
    pub speedtest_timeout_secs: u64,
}

const DEFAULT_DOWNLOAD_URL: &str = "https://speed.cloudflare.com/__down?bytes=25000000";
const DEFAULT_UPLOAD_URL: &str = "https://speed.cloudflare.com/__up";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            owner_id: env::var("OWNER_ID").ok().and_then(|id| id.parse().ok()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/blackpearl.db".to_string()),
            database_pool_size: env::var("DATABASE_POOL_SIZE")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Watching for filters".to_string()),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            register_commands: env::var("REGISTER_COMMANDS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            stopall_confirm_timeout_secs: env::var("STOPALL_CONFIRM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            speedtest_download_url: env::var("SPEEDTEST_DOWNLOAD_URL")
                .unwrap_or_else(|_| DEFAULT_DOWNLOAD_URL.to_string()),
            speedtest_upload_url: env::var("SPEEDTEST_UPLOAD_URL")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_URL.to_string()),
            speedtest_upload_bytes: env::var("SPEEDTEST_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .unwrap_or(10 * 1024 * 1024),
            speedtest_timeout_secs: env::var("SPEEDTEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("database_url", &self.database_url)
            .field("database_pool_size", &self.database_pool_size)
            .field("status_message", &self.status_message)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("register_commands", &self.register_commands)
            .field(
                "stopall_confirm_timeout_secs",
                &self.stopall_confirm_timeout_secs,
            )
            .field("speedtest_download_url", &self.speedtest_download_url)
            .field("speedtest_upload_url", &self.speedtest_upload_url)
            .field("speedtest_upload_bytes", &self.speedtest_upload_bytes)
            .field("speedtest_timeout_secs", &self.speedtest_timeout_secs)
            .finish()
    }
}

/// Discord message limit is 2000 characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
