//! Administrative command handlers.
//!
//! Offline checks an operator can run against the loaded configuration
//! without starting the server.

use crate::config::Config;
use crate::cors::OriginPolicy;
use crate::error::AppResult;
use crate::routes::RouteTable;
use clap::Subcommand;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Evaluate the origin policy for an origin (omit for a non-browser caller)
    CheckOrigin {
        /// Origin header value, e.g. https://app.example.com
        origin: Option<String>,
    },

    /// Print the effective configuration and mounted prefixes
    ShowConfig,
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::CheckOrigin { origin } => check_origin(&config, origin.as_deref()),
        AdminCommands::ShowConfig => show_config(&config),
    }
}

/// Report whether `origin` would be admitted.
fn check_origin(config: &Config, origin: Option<&str>) -> AppResult<()> {
    info!("Evaluating origin policy...");

    let policy = OriginPolicy::new(&config.cors, config.environment.clone());
    let decision = policy.evaluate(origin);

    println!(
        "{} -> {} ({})",
        origin.unwrap_or(crate::middleware_impls::NO_ORIGIN),
        if decision.is_allowed() { "allowed" } else { "denied" },
        decision.as_str()
    );

    Ok(())
}

/// Display the effective configuration.
fn show_config(config: &Config) -> AppResult<()> {
    let table = RouteTable::school()?;

    println!("\n=== School API Configuration ===");
    println!("Bind address:    {}", config.bind_addr());
    println!("Environment:     {}", config.environment);
    println!("Body limit:      {} bytes", config.server.body_limit_bytes);
    println!("Allowed origins: {}", config.cors.allowed_origins.join(", "));
    println!("Route prefixes:");
    for prefix in table.prefixes() {
        println!("  {}", prefix);
    }
    println!();

    Ok(())
}
