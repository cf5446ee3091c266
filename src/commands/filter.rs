use crate::config::DISCORD_MESSAGE_LIMIT;
use crate::db::FilterRecord;
use crate::services::filter::{FilterStore, MAX_KEYWORD_CHARS, MAX_RESPONSE_CHARS};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::info;

/// Room kept free at the end of a list reply for the "...and N more" line.
const LIST_OVERFLOW_RESERVE: usize = 24;

const STOPALL_FAILED: &str = "❌ Failed to stop filters, nothing was changed.";

/// Manage keyword filters for this server
#[poise::command(
    slash_command,
    subcommands("add", "list", "stop", "stopall"),
    required_permissions = "MANAGE_GUILD",
    guild_only
)]
pub async fn filter(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a new filter to the server.
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Keyword that triggers the filter"]
    #[max_length = 50]
    keyword: String,
    #[description = "What the bot replies with"]
    #[max_length = 500]
    response: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    ctx.defer().await?;

    let store = FilterStore::new(ctx.data().db.clone());
    match store.create(&guild_id.to_string(), &keyword, &response).await {
        Ok(id) => {
            info!("Filter {} ({}) saved in guild {}", id, keyword, guild_id);
            ctx.say(format!("Added filter: ``{}``.", keyword)).await?;
        }
        Err(e) if e.is_validation() => {
            ctx.say(format!(
                "❌ {}. Keywords can be up to {} characters and responses up to {}.",
                e, MAX_KEYWORD_CHARS, MAX_RESPONSE_CHARS
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// List all filters on the server.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    ctx.defer().await?;

    let store = FilterStore::new(ctx.data().db.clone());
    let filters = store.get_all(&guild_id.to_string()).await?;
    ctx.say(format_filter_list(&filters)).await?;
    Ok(())
}

/// Stop a filter from being used.
#[poise::command(slash_command, guild_only)]
pub async fn stop(
    ctx: Context<'_>,
    #[description = "Keyword of the filter to stop"] keyword: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    ctx.defer().await?;

    let store = FilterStore::new(ctx.data().db.clone());
    let removed = store.delete(&guild_id.to_string(), &keyword).await?;
    info!(
        "Stop filter '{}' in guild {} removed {} row(s)",
        keyword, guild_id, removed
    );
    ctx.say(format!("Stopped filter: ``{}``.", keyword)).await?;
    Ok(())
}

/// Stop all filters from being used.
#[poise::command(slash_command, guild_only)]
pub async fn stopall(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    let ctx_id = ctx.id();
    let yes_id = format!("{}_stopall_yes", ctx_id);
    let no_id = format!("{}_stopall_no", ctx_id);
    let row = serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(yes_id.clone())
            .label("Yes")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(no_id)
            .label("No")
            .style(serenity::ButtonStyle::Secondary),
    ]);

    let handle = ctx
        .send(
            poise::CreateReply::default()
                .content("Are you sure you want to stop all filters?")
                .components(vec![row])
                .ephemeral(true),
        )
        .await?;
    let message = handle.message().await?;

    let timeout = Duration::from_secs(ctx.data().config.stopall_confirm_timeout_secs);
    let Some(press) = message
        .await_component_interaction(ctx.serenity_context())
        .author_id(ctx.author().id)
        .timeout(timeout)
        .await
    else {
        // Timeout: best-effort disable buttons.
        let _ = handle
            .edit(
                ctx,
                poise::CreateReply::default()
                    .content("Timed out, no filters were stopped.")
                    .components(vec![]),
            )
            .await;
        return Ok(());
    };

    let outcome = if press.data.custom_id == yes_id {
        let store = FilterStore::new(ctx.data().db.clone());
        let removed = match store.delete_all(&guild_id.to_string()).await {
            Ok(removed) => removed,
            Err(e) => {
                let _ = press
                    .create_response(ctx.http(), stopall_update(STOPALL_FAILED))
                    .await;
                return Err(e.into());
            }
        };
        info!(
            "Stopped all filters in guild {} ({} removed) for {}",
            guild_id,
            removed,
            ctx.author().name
        );
        format!("Stopped all filters ({} removed).", removed)
    } else {
        "Cancelled, no filters were stopped.".to_string()
    };

    press
        .create_response(ctx.http(), stopall_update(outcome))
        .await?;
    Ok(())
}

/// Replaces the stopall prompt with `content` and removes its buttons.
fn stopall_update(content: impl Into<String>) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::UpdateMessage(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .components(vec![]),
    )
}

/// Renders the `/filter list` reply, cut short to fit in one Discord message.
pub fn format_filter_list(filters: &[FilterRecord]) -> String {
    if filters.is_empty() {
        return "No filters found".to_string();
    }

    let mut out = String::from("Filters:");
    let mut used = out.chars().count();
    for (i, filter) in filters.iter().enumerate() {
        let line = format!("\n - {}", filter.keyword);
        let line_len = line.chars().count();
        if used + line_len + LIST_OVERFLOW_RESERVE > DISCORD_MESSAGE_LIMIT {
            out.push_str(&format!("\n...and {} more", filters.len() - i));
            break;
        }
        out.push_str(&line);
        used += line_len;
    }
    out
}
