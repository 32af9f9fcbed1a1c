//! qpanel - a terminal SQL query panel backed by a remote export endpoint.

use qpanel::cli::Cli;
use qpanel::config::Config;
use qpanel::error::Result;
use qpanel::{logging, tui};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let log_file = logging::init(&logging::LogTarget::for_mode(cli.is_headless()));
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = ?log_file,
        "qpanel starting"
    );

    match run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e.detail());
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;

    if cli.is_headless() {
        return tui::headless::run_headless(cli, &config).await;
    }

    tui::run(&config).await?;
    Ok(0)
}

/// Builds the effective configuration: CLI, then file, then environment,
/// then built-in defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_defaults();
    cli.apply_overrides(&mut config);
    config.validate()?;

    Ok(config)
}
