use clap::{Parser, Subcommand};
use schoolapi::admin::{self, AdminCommands};
use schoolapi::config::Config;
use schoolapi::crash;
use schoolapi::error::AppResult;
use schoolapi::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// schoolapi - School management REST backend
#[derive(Parser, Debug)]
#[command(name = "schoolapi")]
#[command(version)]
#[command(about = "School management REST backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Administrative commands
    Admin {
        #[command(subcommand)]
        admin_command: AdminCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    init_tracing();
    crash::install_crash_handlers();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Server { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let addr = config.bind_addr();
            server::run_server(config, addr).await
        }
        Commands::Admin { admin_command } => admin::run(config, admin_command).await,
    }
}
