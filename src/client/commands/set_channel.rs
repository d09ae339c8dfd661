use anyhow::Context as _;
use serenity::{
    all::{CommandDataOptionValue, CommandInteraction},
    client::Context,
};
use tracing::instrument;

use crate::{
    client::{slash_commands::respond_ephemeral, App},
    tracking::data_access::set_channel_for_guild,
};

#[instrument(skip_all)]
pub async fn set_channel(
    ctx: Context,
    command: &CommandInteraction,
    app: &App,
) -> anyhow::Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond_ephemeral(&ctx, command, "❌ This command only works in a server.").await;
    };

    let value = &command
        .data
        .options
        .first()
        .context("missing channel option")?
        .value;
    let CommandDataOptionValue::Channel(channel_id) = value else {
        anyhow::bail!("expected a channel option");
    };

    set_channel_for_guild(guild_id.get() as i64, channel_id.get() as i64, &app.db).await?;

    respond_ephemeral(
        &ctx,
        command,
        format!("✅ Race results will be posted to <#{channel_id}>."),
    )
    .await
}
