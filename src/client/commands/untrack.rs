use anyhow::Context as _;
use serenity::{
    all::{CommandDataOptionValue, CommandInteraction},
    client::Context,
};
use tracing::instrument;

use crate::{
    client::{slash_commands::respond_ephemeral, App},
    tracking::data_access::remove_tracked_driver,
};

#[instrument(skip_all)]
pub async fn untrack(ctx: Context, command: &CommandInteraction, app: &App) -> anyhow::Result<()> {
    let value = &command
        .data
        .options
        .first()
        .context("missing cust_id option")?
        .value;
    let CommandDataOptionValue::Integer(cust_id) = value else {
        anyhow::bail!("expected an integer cust_id option");
    };

    let removed = remove_tracked_driver(*cust_id, &app.db).await?;

    let content = if removed {
        format!("✅ Stopped tracking driver ID {cust_id}.")
    } else {
        format!("❌ Driver ID {cust_id} was not tracked.")
    };

    respond_ephemeral(&ctx, command, content).await
}
