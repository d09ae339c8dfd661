use std::sync::Arc;

use chrono::Utc;
use serenity::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::{
    iracing::{
        client::IracingApi,
        error::ApiError,
        model::{FinishRecord, RaceSession},
    },
    tracking::data_access::{
        get_last_poll_ts, list_guilds_with_channel, list_tracked, set_last_poll_ts,
        try_mark_posted, TrackedDriver,
    },
};

/// Session-search window when a driver has no watermark yet.
pub const DEFAULT_LOOKBACK_SECS: i64 = 48 * 3600;

/// Where rendered finish records end up. The production implementation
/// posts embeds through the Discord HTTP API.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn send(&self, channel_id: i64, record: &FinishRecord) -> anyhow::Result<()>;
}

/// Orchestrates the API client and the repository into new finish records.
#[derive(Clone)]
pub struct ResultService {
    api: Arc<dyn IracingApi>,
    pool: SqlitePool,
}

impl ResultService {
    pub fn new(api: Arc<dyn IracingApi>, pool: SqlitePool) -> Self {
        Self { api, pool }
    }

    /// One find-then-post pass. Returns the number of messages sent.
    pub async fn run_cycle(&self, sink: &dyn ResultSink) -> anyhow::Result<usize> {
        let records = self.find_new_finishes_for_tracked().await?;
        if records.is_empty() {
            return Ok(0);
        }
        Ok(self.process_and_post_results(&records, sink).await)
    }

    /// Walk every tracked driver's search window since its watermark and
    /// collect finish records. Per-driver failures are logged and skipped
    /// so one broken driver cannot stall the rest of the cycle.
    pub async fn find_new_finishes_for_tracked(&self) -> anyhow::Result<Vec<FinishRecord>> {
        let now = Utc::now().timestamp();
        let tracked = list_tracked(&self.pool).await?;

        let mut new_finishes = Vec::new();
        for driver in tracked {
            if let Err(err) = self
                .collect_driver_finishes(&driver, now, &mut new_finishes)
                .await
            {
                error!(cust_id = driver.cust_id, %err, "failed to poll driver");
            }
        }

        Ok(new_finishes)
    }

    async fn collect_driver_finishes(
        &self,
        driver: &TrackedDriver,
        now: i64,
        out: &mut Vec<FinishRecord>,
    ) -> anyhow::Result<()> {
        let since = get_last_poll_ts(driver.cust_id, &self.pool)
            .await?
            .unwrap_or(now - DEFAULT_LOOKBACK_SECS);

        let sessions = self
            .api
            .search_recent_sessions(driver.cust_id, since, now)
            .await?;
        debug!(
            cust_id = driver.cust_id,
            sessions = sessions.len(),
            "searched recent sessions"
        );

        for session in &sessions {
            match self.build_finish_record(driver, session).await {
                Ok(Some(record)) => out.push(record),
                Ok(None) => {}
                Err(err) => error!(
                    cust_id = driver.cust_id,
                    subsession_id = session.subsession_id,
                    %err,
                    "failed to process session"
                ),
            }
        }

        // Fixed window, not an exactly-once cursor: the watermark advances
        // even when single sessions above failed.
        set_last_poll_ts(driver.cust_id, now, &self.pool).await?;

        Ok(())
    }

    async fn build_finish_record(
        &self,
        driver: &TrackedDriver,
        session: &RaceSession,
    ) -> Result<Option<FinishRecord>, ApiError> {
        let results = match self.api.get_subsession_results(session.subsession_id).await {
            Err(ApiError::NotFound(_)) => return Ok(None),
            other => other?,
        };

        // The tracked driver not appearing in a sheet is a non-event.
        let Some(row) = results.results.iter().find(|r| r.cust_id == driver.cust_id) else {
            return Ok(None);
        };

        let mut record = FinishRecord::from_row(session, &results, row);
        record.display_name = driver.display_name.clone();
        Ok(Some(record))
    }

    /// Deliver records to every guild with a configured channel, at most
    /// once per (subsession, driver, guild). The dedupe row is claimed
    /// before sending; a failed send for one guild never blocks the others.
    pub async fn process_and_post_results(
        &self,
        records: &[FinishRecord],
        sink: &dyn ResultSink,
    ) -> usize {
        let guilds = match list_guilds_with_channel(&self.pool).await {
            Ok(guilds) => guilds,
            Err(err) => {
                error!(%err, "couldn't list configured guilds");
                return 0;
            }
        };

        let mut sent = 0;
        for record in records {
            for guild in &guilds {
                let claimed = match try_mark_posted(
                    record.subsession_id,
                    record.cust_id,
                    guild.guild_id,
                    &self.pool,
                )
                .await
                {
                    Ok(claimed) => claimed,
                    Err(err) => {
                        error!(
                            guild_id = guild.guild_id,
                            subsession_id = record.subsession_id,
                            %err,
                            "couldn't claim dedupe key"
                        );
                        continue;
                    }
                };
                if !claimed {
                    debug!(
                        guild_id = guild.guild_id,
                        subsession_id = record.subsession_id,
                        "already posted, skipping"
                    );
                    continue;
                }

                match sink.send(guild.channel_id, record).await {
                    Ok(()) => sent += 1,
                    Err(err) => error!(
                        guild_id = guild.guild_id,
                        subsession_id = record.subsession_id,
                        %err,
                        "failed to post result"
                    ),
                }
            }
        }

        sent
    }
}
