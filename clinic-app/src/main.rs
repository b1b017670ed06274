use tracing::info;
use tracing_subscriber::EnvFilter;

use clinic_app::{build_controller, config::Config, ui};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the screens on stdout stay readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Opening Kawaii Clinic...");

    let config = Config::new();
    let controller = build_controller(&config).await?;

    ui::run(controller).await?;

    info!("Clinic closed. See you next shift!");
    Ok(())
}
