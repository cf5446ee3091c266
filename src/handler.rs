use crate::services::filter::FilterStore;
use crate::services::matcher::FilterMatcher;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Whether a message should be checked against the guild's filters.
///
/// Bots, webhooks and messages outside a guild never trigger filters.
pub fn should_scan(message: &serenity::Message) -> bool {
    !message.author.bot
        && !message.author.system
        && message.webhook_id.is_none()
        && message.guild_id.is_some()
        && !message.content.is_empty()
}

/// Reply to `new_message` once for each filter its text triggers.
pub async fn handle_message(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    if !should_scan(new_message) {
        return Ok(());
    }
    let Some(guild_id) = new_message.guild_id else {
        return Ok(());
    };

    let matcher = FilterMatcher::new(FilterStore::new(data.db.clone()));
    let matched = matcher
        .match_message(&guild_id.to_string(), &new_message.content)
        .await?;

    for filter in matched {
        debug!(
            "Filter {} triggered by message {} in guild {}",
            filter.id, new_message.id, guild_id
        );
        if let Err(e) = new_message.reply(ctx, &filter.response).await {
            warn!(
                "Failed to send filter {} response in channel {}: {}",
                filter.id, new_message.channel_id, e
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::serenity_prelude as serenity;
    use poise::serenity_prelude::{GuildId, UserId, WebhookId};

    fn mock_message(content: &str) -> serenity::Message {
        let mut msg = serenity::Message::default();
        msg.author.id = UserId::new(1);
        msg.guild_id = Some(GuildId::new(10));
        msg.content = content.to_string();
        msg
    }

    #[test]
    fn test_human_guild_message_is_scanned() {
        assert!(should_scan(&mock_message("hello")));
    }

    #[test]
    fn test_excluded_senders() {
        let mut bot = mock_message("hello");
        bot.author.bot = true;
        assert!(!should_scan(&bot));

        let mut webhook = mock_message("hello");
        webhook.webhook_id = Some(WebhookId::new(5));
        assert!(!should_scan(&webhook));

        let mut direct = mock_message("hello");
        direct.guild_id = None;
        assert!(!should_scan(&direct));

        assert!(!should_scan(&mock_message("")));
    }
}
