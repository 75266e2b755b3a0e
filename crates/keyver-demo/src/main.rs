use keyver_demo::{config, telemetry, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config::load_dotenv();

    let config = AppConfig::from_env()?;
    telemetry::init(&config.log_filter, config.log_format);

    keyver_demo::run(config).await.map_err(|e| {
        tracing::error!(error = %e, "Keyed Services Demo stopped");
        e.into()
    })
}
