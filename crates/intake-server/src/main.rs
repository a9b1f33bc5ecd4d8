use intake_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Telemetry, upload root, pipeline
    let handler = intake_server::setup::initialize_app(&config).await?;

    // Start the server
    intake_server::setup::server::start_server(&config, handler).await?;

    Ok(())
}
