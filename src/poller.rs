use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::results::service::{ResultSink, ResultService};

/// Fixed-interval poll loop: run a find-then-post cycle, log any failure
/// and keep going. Cycles never overlap because each one is awaited before
/// the sleep; the sleep is a flat interval, uncorrected for cycle duration.
pub async fn run(service: ResultService, sink: impl ResultSink, interval: Duration) {
    info!(interval_s = interval.as_secs(), "starting poll loop");

    loop {
        match service.run_cycle(&sink).await {
            Ok(0) => debug!("poll cycle completed, nothing new"),
            Ok(posted) => info!(posted, "poll cycle completed"),
            Err(err) => error!(%err, "poll cycle failed"),
        }

        sleep(interval).await;
    }
}
