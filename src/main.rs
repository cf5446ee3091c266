use blackpearl::{commands, config::Config, db::Database, handler, Data, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                "Command /{} failed: {}",
                ctx.command().qualified_name,
                error
            );
            let _ = ctx
                .say("❌ Something went wrong while running that command.")
                .await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let discord_token = config.discord_token.clone();

    if let Some(parent) = std::path::Path::new(&config.database_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Database::new(&config)?;
    db.execute_init()?;

    let owners: HashSet<serenity::UserId> = config
        .owner_id
        .map(serenity::UserId::new)
        .into_iter()
        .collect();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            owners,
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    if let serenity::FullEvent::Message { new_message } = event {
                        if let Err(e) = handler::handle_message(ctx, new_message, data).await {
                            error!(
                                "Filter handling failed for message {}: {}",
                                new_message.id, e
                            );
                        }
                    }
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready!");
                if config.register_commands {
                    commands::register(
                        &ctx.http,
                        &framework.options().commands,
                        config.dev_guild_id,
                    )
                    .await?;
                }

                // Set bot status
                ctx.set_activity(Some(serenity::ActivityData::custom(&config.status_message)));

                Ok(Data {
                    config,
                    http_client: reqwest::Client::new(),
                    db,
                    launched_at: chrono::Utc::now(),
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGES;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}
