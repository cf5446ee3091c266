pub mod commands;
pub mod config;
pub mod db;
pub mod handler;
pub mod services;
pub mod speedtest;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub http_client: reqwest::Client,
    pub db: db::Database,
    /// When the bot finished starting, for `/uptime`
    pub launched_at: chrono::DateTime<chrono::Utc>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
