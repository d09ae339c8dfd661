use serenity::{all::CommandInteraction, client::Context};
use tracing::instrument;

use crate::{
    client::{slash_commands::respond_ephemeral, App},
    tracking::data_access,
};

#[instrument(skip_all)]
pub async fn list_tracked(
    ctx: Context,
    command: &CommandInteraction,
    app: &App,
) -> anyhow::Result<()> {
    let tracked = data_access::list_tracked(&app.db).await?;

    if tracked.is_empty() {
        return respond_ephemeral(&ctx, command, "No drivers are being tracked.").await;
    }

    let mut content = format!("**Tracked drivers ({}):**\n", tracked.len());
    for driver in tracked {
        content.push_str(&format!(
            "• {} (ID {})\n",
            driver.display_name, driver.cust_id
        ));
    }

    respond_ephemeral(&ctx, command, content).await
}
