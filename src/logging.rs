use std::env;

use tracing::{level_filters::LevelFilter, subscriber::set_global_default, Level};
use tracing_subscriber::{
    filter::Targets,
    fmt::{format::FmtSpan, time::ChronoLocal},
    layer::SubscriberExt,
    Layer,
};

pub fn setup_logging() {
    let log_level: Level = env::var("LOG_LEVEL")
        .unwrap_or("info".to_owned())
        .parse()
        .expect("invalid LOG_LEVEL");
    let lib_log_level: Level = env::var("LIB_LOG_LEVEL")
        .unwrap_or("error".to_owned())
        .parse()
        .expect("invalid LIB_LOG_LEVEL");

    let crate_filter = Targets::new().with_target("ir2dis", log_level);
    let lib_filter = Targets::new()
        .with_default(lib_log_level)
        .with_target("ir2dis", LevelFilter::OFF);

    let crate_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_timer(ChronoLocal::new("%F %T%.3f".to_string()))
        .with_filter(crate_filter);

    let lib_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_timer(ChronoLocal::new("%F %T%.3f".to_string()))
        .with_filter(lib_filter);

    let subscriber = tracing_subscriber::registry()
        .with(crate_layer)
        .with(lib_layer);

    set_global_default(subscriber).expect("logging already initialized");
}
