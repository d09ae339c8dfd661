use serenity::{all::CommandInteraction, client::Context};
use tracing::instrument;

use crate::{
    client::{slash_commands::respond_ephemeral, App},
    iracing::model::FinishRecord,
    results::{embed::DiscordSink, service::ResultSink},
    tracking::data_access::get_channel_for_guild,
};

fn sample_record() -> FinishRecord {
    FinishRecord {
        subsession_id: 1234567,
        cust_id: 987654,
        display_name: "Test Driver".to_owned(),
        series_name: "iRacing Formula 3".to_owned(),
        track_name: "Circuit de la Sarthe".to_owned(),
        car_name: "BMW M4 GT3".to_owned(),
        field_size: 24,
        finish_pos: 1,
        finish_pos_in_class: Some(1),
        class_name: Some("Pro/Am".to_owned()),
        laps: 50,
        incidents: 0,
        best_lap_time_s: Some(89.123),
        sof: Some(1250),
        official: true,
        start_time_utc: "2024-01-01T00:00:00Z".to_owned(),
    }
}

/// Posts a made-up race result through the exact same sink the poller
/// uses, so admins can verify channel setup and permissions.
#[instrument(skip_all)]
pub async fn test_post(
    ctx: Context,
    command: &CommandInteraction,
    app: &App,
) -> anyhow::Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond_ephemeral(&ctx, command, "❌ This command only works in a server.").await;
    };

    let Some(channel_id) = get_channel_for_guild(guild_id.get() as i64, &app.db).await? else {
        return respond_ephemeral(
            &ctx,
            command,
            "❌ No results channel configured. Use /set_channel first.",
        )
        .await;
    };

    let sink = DiscordSink::new(ctx.http.clone());
    sink.send(channel_id, &sample_record()).await?;

    respond_ephemeral(&ctx, command, "✅ Test result posted.").await
}
