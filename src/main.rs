use std::sync::Arc;

use ir2dis::{client, config::Config, db, iracing::client::IracingClient, logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::setup_logging();

    let config = Config::from_env()?;

    let pool = db::connect(&config.sqlite_path).await?;
    db::create_tables(&pool).await?;

    let iracing = Arc::new(IracingClient::new(
        &config.iracing_email,
        &config.iracing_password,
        config.iracing_password_hashed,
        config.poll_concurrency,
    ));
    iracing.login().await?;
    info!("logged in to the iRacing Data API");

    client::start_client(config, pool, iracing).await
}
