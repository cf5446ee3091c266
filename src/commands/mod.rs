use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

pub mod filter;
pub mod status;

/// Every slash command the bot exposes.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        status::ping(),
        status::uptime(),
        status::speedtest(),
        status::sync(),
        filter::filter(),
    ]
}

/// Registers `commands` in the dev guild when one is configured, globally otherwise.
pub async fn register(
    http: &serenity::Http,
    commands: &[poise::Command<Data, Error>],
    dev_guild_id: Option<u64>,
) -> Result<(), serenity::Error> {
    match dev_guild_id {
        Some(guild_id) => {
            info!("Registering {} commands in guild {}", commands.len(), guild_id);
            poise::builtins::register_in_guild(http, commands, serenity::GuildId::new(guild_id))
                .await
        }
        None => {
            info!("Registering {} commands globally", commands.len());
            poise::builtins::register_globally(http, commands).await
        }
    }
}
