use serde::Deserialize;

/// Minimal session row from `results/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct RaceSession {
    pub subsession_id: i64,
    #[serde(default)]
    pub series_name: String,
    #[serde(default)]
    pub track_name: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub official: bool,
}

/// Full result sheet from `results/get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionResults {
    #[serde(default)]
    pub field_size: i64,
    #[serde(default)]
    pub sof: Option<i64>,
    #[serde(default)]
    pub results: Vec<DriverRow>,
}

/// One driver's row inside a result sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverRow {
    pub cust_id: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub car_name: String,
    #[serde(default)]
    pub finish_pos: i64,
    #[serde(default)]
    pub finish_pos_in_class: Option<i64>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub laps: i64,
    #[serde(default)]
    pub incidents: i64,
    #[serde(default)]
    pub best_lap_time_s: Option<f64>,
}

/// Driver record from `lookup/drivers`.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverInfo {
    pub cust_id: i64,
    #[serde(default)]
    pub display_name: String,
}

/// Everything the rendering layer needs about one finish, assembled per
/// (driver, session) pair. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishRecord {
    pub subsession_id: i64,
    pub cust_id: i64,
    pub display_name: String,
    pub series_name: String,
    pub track_name: String,
    pub car_name: String,
    pub field_size: i64,
    pub finish_pos: i64,
    pub finish_pos_in_class: Option<i64>,
    pub class_name: Option<String>,
    pub laps: i64,
    pub incidents: i64,
    pub best_lap_time_s: Option<f64>,
    pub sof: Option<i64>,
    pub official: bool,
    pub start_time_utc: String,
}

impl FinishRecord {
    pub fn from_row(session: &RaceSession, results: &SessionResults, row: &DriverRow) -> Self {
        let display_name = if row.display_name.is_empty() {
            "Unknown".to_owned()
        } else {
            row.display_name.clone()
        };
        let car_name = if row.car_name.is_empty() {
            "Unknown".to_owned()
        } else {
            row.car_name.clone()
        };

        Self {
            subsession_id: session.subsession_id,
            cust_id: row.cust_id,
            display_name,
            series_name: session.series_name.clone(),
            track_name: session.track_name.clone(),
            car_name,
            field_size: results.field_size,
            finish_pos: row.finish_pos,
            finish_pos_in_class: row.finish_pos_in_class,
            class_name: row.class_name.clone(),
            laps: row.laps,
            incidents: row.incidents,
            best_lap_time_s: row.best_lap_time_s,
            sof: results.sof,
            official: session.official,
            start_time_utc: session.start_time.clone(),
        }
    }
}
