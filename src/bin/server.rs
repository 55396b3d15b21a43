use parish_portal::{config::Settings, server::app::run_server, telemetry::init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::load(None)?;
    run_server(&settings).await
}
