use serenity::{all::CommandInteraction, client::Context};
use tracing::instrument;

use crate::client::slash_commands::respond_ephemeral;

#[instrument(skip_all)]
pub async fn ping(ctx: Context, command: &CommandInteraction) -> anyhow::Result<()> {
    respond_ephemeral(&ctx, command, "Pong! 🏓").await
}
