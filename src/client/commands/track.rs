use anyhow::Context as _;
use serenity::{
    all::{CommandInteraction, ResolvedOption, ResolvedValue},
    client::Context,
};
use tracing::instrument;

use crate::{
    client::{
        slash_commands::{edit_to_text, respond_ephemeral},
        App,
    },
    iracing::client::IracingApi,
    tracking::data_access::{add_tracked_driver, get_channel_for_guild, is_tracked},
};

/// `/track <driver>` where driver is either a numeric customer ID or a
/// name to search for. Tracking is refused until the guild has picked a
/// results channel so new drivers never post into the void.
#[instrument(skip_all)]
pub async fn track(ctx: Context, command: &CommandInteraction, app: &App) -> anyhow::Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond_ephemeral(&ctx, command, "❌ This command only works in a server.").await;
    };

    if get_channel_for_guild(guild_id.get() as i64, &app.db)
        .await?
        .is_none()
    {
        return respond_ephemeral(
            &ctx,
            command,
            "❌ No results channel configured. Use /set_channel first.",
        )
        .await;
    }

    let options = command.data.options();
    let Some(ResolvedOption {
        value: ResolvedValue::String(query),
        ..
    }) = options.first()
    else {
        anyhow::bail!("missing driver option");
    };

    // The lookup can take a few round trips.
    command.defer_ephemeral(&ctx.http).await?;

    let (cust_id, display_name) = match query.trim().parse::<i64>() {
        Ok(cust_id) if cust_id > 0 => (cust_id, format!("Driver {cust_id}")),
        _ => {
            let matches = app
                .iracing
                .lookup_driver(query)
                .await
                .context("driver lookup failed")?;
            let Some(driver) = matches.into_iter().next() else {
                return edit_to_text(&ctx, command, format!("❌ No driver found for `{query}`."))
                    .await;
            };
            (driver.cust_id, driver.display_name)
        }
    };

    if is_tracked(cust_id, &app.db).await? {
        return edit_to_text(
            &ctx,
            command,
            format!("❌ **{display_name}** (ID {cust_id}) is already tracked."),
        )
        .await;
    }

    add_tracked_driver(cust_id, &display_name, &app.db).await?;

    edit_to_text(
        &ctx,
        command,
        format!("✅ Now tracking **{display_name}** (ID {cust_id})."),
    )
    .await
}
