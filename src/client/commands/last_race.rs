use anyhow::Context as _;
use serenity::{
    all::{CommandDataOptionValue, CommandInteraction, EditInteractionResponse},
    client::Context,
};
use tracing::{error, instrument};

use crate::{
    client::{slash_commands::followup_ephemeral, App},
    iracing::{client::IracingApi, model::FinishRecord},
    results::{embed::build_race_result_embed, last_result::fetch_last_official_result},
};

enum LastRaceReply {
    Result(Box<FinishRecord>),
    Error(String),
}

async fn build_reply(api: &dyn IracingApi, cust_id: i64) -> LastRaceReply {
    if cust_id <= 0 {
        return LastRaceReply::Error(
            "❌ Invalid customer ID. Please provide a positive numeric ID.".to_owned(),
        );
    }

    match fetch_last_official_result(api, cust_id).await {
        Ok(Some(record)) => LastRaceReply::Result(Box::new(record)),
        Ok(None) => LastRaceReply::Error(format!(
            "No completed official race found for driver ID {cust_id}."
        )),
        Err(err) => {
            error!(cust_id, %err, "couldn't fetch last race");
            LastRaceReply::Error(
                "❌ Failed to fetch the last race. Please check the ID and try again.".to_owned(),
            )
        }
    }
}

/// `/last_race <cust_id>`: on-demand version of what the poller posts. The
/// result embed is posted publicly; every error stays between the bot and
/// the invoking user.
#[instrument(skip_all)]
pub async fn last_race(
    ctx: Context,
    command: &CommandInteraction,
    app: &App,
) -> anyhow::Result<()> {
    let value = &command
        .data
        .options
        .first()
        .context("missing cust_id option")?
        .value;
    let CommandDataOptionValue::Integer(cust_id) = value else {
        anyhow::bail!("expected an integer cust_id option");
    };
    let cust_id = *cust_id;

    // The search plus the results fetch can exceed the 3 second
    // interaction deadline.
    command.defer(&ctx.http).await?;

    match build_reply(app.iracing.as_ref(), cust_id).await {
        LastRaceReply::Result(record) => {
            command
                .edit_response(
                    &ctx.http,
                    EditInteractionResponse::new().embed(build_race_result_embed(&record)),
                )
                .await?;
            Ok(())
        }
        LastRaceReply::Error(content) => followup_ephemeral(&ctx, command, content).await,
    }
}

#[cfg(test)]
mod tests {
    use serenity::async_trait;

    use super::*;
    use crate::iracing::{
        error::ApiError,
        model::{DriverInfo, DriverRow, RaceSession, SessionResults},
    };

    struct StubApi {
        sessions: Result<Vec<RaceSession>, ()>,
        results: SessionResults,
    }

    #[async_trait]
    impl IracingApi for StubApi {
        async fn search_recent_sessions(
            &self,
            _cust_id: i64,
            _start_time_epoch_s: i64,
            _end_time_epoch_s: i64,
        ) -> Result<Vec<RaceSession>, ApiError> {
            match &self.sessions {
                Ok(sessions) => Ok(sessions.clone()),
                Err(()) => Err(ApiError::ServerError(503)),
            }
        }

        async fn get_subsession_results(
            &self,
            _subsession_id: i64,
        ) -> Result<SessionResults, ApiError> {
            Ok(self.results.clone())
        }

        async fn lookup_driver(&self, _query: &str) -> Result<Vec<DriverInfo>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn invalid_and_missing_drivers_reply_with_error_text() {
        let api = StubApi {
            sessions: Ok(Vec::new()),
            results: SessionResults::default(),
        };

        let LastRaceReply::Error(content) = build_reply(&api, -5).await else {
            panic!("expected an error reply");
        };
        assert!(content.contains("Invalid customer ID"));

        let LastRaceReply::Error(content) = build_reply(&api, 123456).await else {
            panic!("expected an error reply");
        };
        assert!(content.contains("No completed official race found"));
    }

    #[tokio::test]
    async fn api_failure_replies_with_error_text() {
        let api = StubApi {
            sessions: Err(()),
            results: SessionResults::default(),
        };

        let LastRaceReply::Error(content) = build_reply(&api, 123456).await else {
            panic!("expected an error reply");
        };
        assert!(content.contains("Failed to fetch the last race"));
    }

    #[tokio::test]
    async fn found_race_replies_with_the_record() {
        let api = StubApi {
            sessions: Ok(vec![RaceSession {
                subsession_id: 789012,
                series_name: "Test Series".to_owned(),
                track_name: "Test Track".to_owned(),
                start_time: "2024-01-01T00:00:00Z".to_owned(),
                official: true,
            }]),
            results: SessionResults {
                field_size: 18,
                sof: Some(1500),
                results: vec![DriverRow {
                    cust_id: 123456,
                    display_name: "Test Driver".to_owned(),
                    car_name: "Test Car".to_owned(),
                    finish_pos: 2,
                    finish_pos_in_class: None,
                    class_name: None,
                    laps: 30,
                    incidents: 1,
                    best_lap_time_s: None,
                }],
            },
        };

        let LastRaceReply::Result(record) = build_reply(&api, 123456).await else {
            panic!("expected a result reply");
        };
        assert_eq!(record.subsession_id, 789012);
        assert_eq!(record.finish_pos, 2);
    }
}
