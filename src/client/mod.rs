pub mod commands;
pub mod slash_commands;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serenity::{
    all::{ActivityData, Client, GatewayIntents, Interaction, Ready},
    async_trait,
    client::{Context, EventHandler},
};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::{
    config::Config, iracing::client::IracingClient, poller, results::embed::DiscordSink,
    results::service::ResultService,
};

/// Shared dependencies, constructed once at startup and handed to the
/// handler and the poller explicitly.
pub struct App {
    pub db: SqlitePool,
    pub iracing: Arc<IracingClient>,
    pub service: ResultService,
    pub config: Config,
}

struct Handler {
    app: Arc<App>,
    poller_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    /// Is called when the bot connects to discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        ctx.set_activity(Some(ActivityData::watching("the race results")));

        if let Err(err) = slash_commands::create_global_commands(&ctx).await {
            error!(%err, "couldn't create global slash commands");
        }

        // `ready` fires again on gateway reconnects; the poller must not.
        if !self.poller_started.swap(true, Ordering::SeqCst) {
            tokio::spawn(poller::run(
                self.app.service.clone(),
                DiscordSink::new(ctx.http.clone()),
                self.app.config.poll_interval,
            ));
        }
    }

    /// Is called when a user starts an [`Interaction`]
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            slash_commands::command_responses(&command, ctx, &self.app).await;
        }
    }
}

pub async fn start_client(
    config: Config,
    db: SqlitePool,
    iracing: Arc<IracingClient>,
) -> anyhow::Result<()> {
    let service = ResultService::new(iracing.clone(), db.clone());
    let app = Arc::new(App {
        db,
        iracing,
        service,
        config,
    });

    let mut client = Client::builder(&app.config.discord_token, GatewayIntents::non_privileged())
        .event_handler(Handler {
            app: app.clone(),
            poller_started: AtomicBool::new(false),
        })
        .await?;

    client.start().await?;

    Ok(())
}
