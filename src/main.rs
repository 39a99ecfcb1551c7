use muistuttaja::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Load configuration; logging verbosity depends on it
    let config = startup::load_config()?;

    // Initialize logging
    startup::init_logging(config.settings.debug)?;

    info!("Starting muistuttaja");

    // Run until interrupted
    startup::start_daemon(config).await?;

    info!("muistuttaja stopped");
    Ok(())
}
