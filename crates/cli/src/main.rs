mod config_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "wheelhouse", about = "Wheelhouse — channel membership service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/wheelhouse/).
    #[arg(long, global = true, env = "WHEELHOUSE_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
    /// Custom data directory (overrides default data dir).
    #[arg(long, global = true, env = "WHEELHOUSE_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default when no subcommand is provided).
    Serve,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    // Apply directory overrides before any config lookup.
    if let Some(ref dir) = cli.config_dir {
        wheelhouse_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        wheelhouse_config::set_data_dir(dir.clone());
    }

    match cli.command {
        // Default: serve when no subcommand is provided
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "wheelhouse starting");

            let config = wheelhouse_config::discover_and_load();

            // CLI args override config values
            let bind = cli.bind.unwrap_or(config.server.bind);
            let port = cli.port.unwrap_or(config.server.port);

            wheelhouse_gateway::server::start_gateway(&bind, port).await
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action),
    }
}
