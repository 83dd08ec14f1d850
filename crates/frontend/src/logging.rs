//! Browser console logging

use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Pretty;
use tracing_subscriber::prelude::*;
use tracing_web::{MakeWebConsoleWriter, performance_layer};

/// Install the console subscriber. Later calls leave the first one in place.
pub fn init(level: &str) {
    let filter = LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        // std::time is unavailable in the browser
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(perf_layer)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(%filter, "console logging installed");
    }
}
