use crate::speedtest::SpeedTest;
use crate::{Context, Error};
use chrono::Utc;
use tracing::{error, info};

/// Get the bot latency
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    if latency.is_zero() {
        ctx.say("⏳ Latency is not known yet, try again shortly.")
            .await?;
        return Ok(());
    }
    ctx.say(format!("**Latency:** {} ms", latency.as_millis()))
        .await?;
    Ok(())
}

/// Get the bot uptime
#[poise::command(slash_command)]
pub async fn uptime(ctx: Context<'_>) -> Result<(), Error> {
    let elapsed = Utc::now() - ctx.data().launched_at;
    let secs = elapsed.num_seconds().max(0) as u64;
    ctx.say(format!("**Uptime:** {}", format_uptime(secs))).await?;
    Ok(())
}

/// Test the download and upload speed
#[poise::command(slash_command)]
pub async fn speedtest(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let test = SpeedTest::new(ctx.data().http_client.clone(), &ctx.data().config);
    match test.run().await {
        Ok(report) => {
            ctx.say(report.summary()).await?;
        }
        Err(e) => {
            error!("Speed test failed: {:#}", e);
            ctx.say("❌ Speed test failed, try again later.").await?;
        }
    }
    Ok(())
}

/// Sync the commands (Owner only)
#[poise::command(slash_command, owners_only, hide_in_help)]
pub async fn sync(ctx: Context<'_>) -> Result<(), Error> {
    info!("Sync command received from owner: {}", ctx.author().name);
    ctx.defer_ephemeral().await?;

    let commands = &ctx.framework().options().commands;
    crate::commands::register(ctx.http(), commands, ctx.data().config.dev_guild_id).await?;

    ctx.say(format!("Synced {} command(s)", commands.len()))
        .await?;
    Ok(())
}

/// Formats a number of seconds as `"{d}d, {h}h, {m}m, {s}s"`.
pub fn format_uptime(total_secs: u64) -> String {
    let (hours, remainder) = (total_secs / 3600, total_secs % 3600);
    let (minutes, seconds) = (remainder / 60, remainder % 60);
    let (days, hours) = (hours / 24, hours % 24);
    format!("{}d, {}h, {}m, {}s", days, hours, minutes, seconds)
}
