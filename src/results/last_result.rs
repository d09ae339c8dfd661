use chrono::Utc;
use tracing::{debug, error};

use crate::iracing::{client::IracingApi, error::ApiError, model::FinishRecord};

/// `/last_race` looks further back than the poller's window.
const LOOKBACK_SECS: i64 = 7 * 24 * 3600;

/// Fetch the most recent completed official race result for a driver,
/// shaped exactly like the records the poller posts. The dedupe state is
/// neither consulted nor updated.
pub async fn fetch_last_official_result(
    api: &dyn IracingApi,
    cust_id: i64,
) -> Result<Option<FinishRecord>, ApiError> {
    if cust_id <= 0 {
        return Ok(None);
    }

    let now = Utc::now().timestamp();
    let sessions = api
        .search_recent_sessions(cust_id, now - LOOKBACK_SECS, now)
        .await?;
    debug!(cust_id, sessions = sessions.len(), "searched recent sessions");

    // Newest first, official races only.
    for session in sessions.iter().rev() {
        if !session.official {
            continue;
        }

        let results = match api.get_subsession_results(session.subsession_id).await {
            Ok(results) => results,
            Err(err) => {
                error!(subsession_id = session.subsession_id, %err, "failed to fetch results");
                continue;
            }
        };

        if let Some(row) = results.results.iter().find(|r| r.cust_id == cust_id) {
            return Ok(Some(FinishRecord::from_row(session, &results, row)));
        }
    }

    Ok(None)
}
