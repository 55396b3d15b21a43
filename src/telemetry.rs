use prometheus::register_int_counter_vec;
use prometheus::IntCounterVec;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref PROXY_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "portal_proxy_requests_total",
        "Number of requests handled by the proxy routes",
        &["route", "status"]
    )
    .expect("metric can be registered once");
}

pub fn record_proxy_request(route: &str, status: u16) {
    let status = status.to_string();
    PROXY_REQUESTS
        .with_label_values(&[route, status.as_str()])
        .inc();
}

pub fn init_tracing() {
    let mut fmt_layer = fmt::layer().with_writer(std::io::stderr);
    if std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true")) {
        fmt_layer = fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT);
    }
    let filter_layer =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
