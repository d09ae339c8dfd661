use std::sync::Arc;

use serenity::{
    all::{ChannelId, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage},
    async_trait,
    http::Http,
};

use super::service::ResultSink;
use crate::iracing::model::FinishRecord;

const GREEN: Colour = Colour::new(0x2ECC71);
const ORANGE: Colour = Colour::new(0xE67E22);
const RED: Colour = Colour::new(0xE74C3C);

/// Podium green, top-ten orange, red otherwise.
pub fn finish_colour(finish_pos: i64) -> Colour {
    if finish_pos <= 3 {
        GREEN
    } else if finish_pos <= 10 {
        ORANGE
    } else {
        RED
    }
}

fn embed_title(record: &FinishRecord) -> String {
    let mut title = format!("🏁 {} — P{}", record.display_name, record.finish_pos);
    if let Some(class_pos) = record.finish_pos_in_class {
        title.push_str(&format!(" (Class P{class_pos})"));
    }
    title
}

fn embed_description(record: &FinishRecord) -> String {
    let sof = record
        .sof
        .map(|sof| sof.to_string())
        .unwrap_or("—".to_owned());

    let mut lines = vec![
        format!(
            "**Series:** {} • **Track:** {} • **Car:** {}",
            record.series_name, record.track_name, record.car_name
        ),
        format!(
            "**Field:** {} • **Laps:** {} • **Inc:** {} • **SOF:** {}",
            record.field_size, record.laps, record.incidents, sof
        ),
    ];
    if let Some(best) = record.best_lap_time_s {
        lines.push(format!("**Best:** {best:.3}s"));
    }
    lines.push(if record.official {
        "**Official:** ✅".to_owned()
    } else {
        "**Official:** ❌".to_owned()
    });

    lines.join("\n")
}

/// The exact embed the poller posts; `/last_race` reuses it so both outputs
/// are identical.
pub fn build_race_result_embed(record: &FinishRecord) -> CreateEmbed {
    CreateEmbed::new()
        .title(embed_title(record))
        .description(embed_description(record))
        .colour(finish_colour(record.finish_pos))
        .footer(CreateEmbedFooter::new(format!(
            "Subsession {} • {}",
            record.subsession_id, record.start_time_utc
        )))
}

/// Posts finish records as embeds through the Discord HTTP API.
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResultSink for DiscordSink {
    async fn send(&self, channel_id: i64, record: &FinishRecord) -> anyhow::Result<()> {
        let embed = build_race_result_embed(record);
        ChannelId::new(channel_id as u64)
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FinishRecord {
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
            start_time_utc: "2023-01-01T00:00:00Z".to_owned(),
        }
    }

    #[test]
    fn colour_thresholds() {
        assert_eq!(finish_colour(1), GREEN);
        assert_eq!(finish_colour(3), GREEN);
        assert_eq!(finish_colour(4), ORANGE);
        assert_eq!(finish_colour(5), ORANGE);
        assert_eq!(finish_colour(10), ORANGE);
        assert_eq!(finish_colour(11), RED);
    }

    #[test]
    fn title_includes_class_position_when_present() {
        assert_eq!(embed_title(&record()), "🏁 Test Driver — P1 (Class P1)");

        let mut no_class = record();
        no_class.finish_pos_in_class = None;
        no_class.finish_pos = 12;
        assert_eq!(embed_title(&no_class), "🏁 Test Driver — P12");
    }

    #[test]
    fn description_lines() {
        let description = embed_description(&record());
        let lines: Vec<&str> = description.lines().collect();
        assert_eq!(
            lines[0],
            "**Series:** iRacing Formula 3 • **Track:** Circuit de la Sarthe • **Car:** BMW M4 GT3"
        );
        assert_eq!(
            lines[1],
            "**Field:** 24 • **Laps:** 50 • **Inc:** 0 • **SOF:** 1250"
        );
        assert_eq!(lines[2], "**Best:** 89.123s");
        assert_eq!(lines[3], "**Official:** ✅");

        let mut sparse = record();
        sparse.best_lap_time_s = None;
        sparse.sof = None;
        sparse.official = false;
        let description = embed_description(&sparse);
        let lines: Vec<&str> = description.lines().collect();
        assert_eq!(
            lines[1],
            "**Field:** 24 • **Laps:** 50 • **Inc:** 0 • **SOF:** —"
        );
        assert_eq!(lines[2], "**Official:** ❌");
    }
}
