use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use sol_connector::cli::{self, Cli, Commands};
use sol_connector::config::ConnectorConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Logs go to stderr; stdout carries the rendered card.
fn init_tracing() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

/// Switch to the configured level unless `RUST_LOG` is set.
fn apply_log_level(handle: &FilterHandle, level: &str) {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    match EnvFilter::try_new(level) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                warn!("Could not apply log level '{}': {}", level, e);
            }
        }
        Err(e) => warn!("Invalid log_level '{}': {}", level, e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = init_tracing();
    let config = ConnectorConfig::load_or_default(&cli.config);
    apply_log_level(&filter, &config.log_level);

    let result = match cli.command {
        Some(Commands::Balance { address, cluster }) => {
            cli::query::handle_balance_command(&config, &address, cluster.as_deref())
                .await
                .map(|_| ())
        }
        Some(Commands::Status { cluster }) => {
            cli::query::handle_status_command(&config, cluster.as_deref()).await
        }
        Some(Commands::InitConfig { force }) => cli::handle_init_config(&cli.config, force),
        Some(Commands::Watch { account, cluster, offline }) => {
            cli::watch::handle_watch_command(
                config,
                &cli.config,
                account.as_deref(),
                cluster.as_deref(),
                offline,
            )
            .await
        }
        // No subcommand: interactive session with the configured defaults
        None => cli::watch::handle_watch_command(config, &cli.config, None, None, false).await,
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result.map_err(Into::into)
}
