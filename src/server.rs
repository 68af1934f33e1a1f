//! Server startup and shutdown logic.
//!
//! `run_server` builds the application state and router, binds the listener,
//! reports LAN-reachable URLs and serves until a shutdown signal arrives.

use crate::config::Config;
use crate::db::MemoryStore;
use crate::error::{AppError, AppResult};
use crate::routes::{self, RouteTable};
use crate::state::AppState;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the web server with the given configuration.
///
/// # Errors
///
/// Returns an error if the route table is inconsistent, the address cannot
/// be bound, or the server fails while running.
pub async fn run_server(config: Config, addr: String) -> AppResult<()> {
    info!("Starting school API server...");
    info!(
        environment = %config.environment,
        allowed_origins = %config.cors.allowed_origins.join(","),
        "Origin policy loaded"
    );

    let state = Arc::new(AppState::new(&config, Arc::new(MemoryStore::new())));
    let table = RouteTable::school()?;
    info!("Mounted {} handler groups", table.len());

    let app = routes::create_router(state, table, config.server.body_limit_bytes);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| AppError::Internal(format!("Failed to read bound address: {}", e)))?;

    info!("Server listening on {}", local_addr);
    if config.server.binds_all_interfaces() || local_addr.ip().is_unspecified() {
        log_network_urls(local_addr.port());
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// URLs for every non-loopback IPv4 address, for operators on the LAN.
pub fn network_urls<I>(addrs: I, port: u16) -> Vec<String>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs
        .into_iter()
        .filter_map(|ip| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
            _ => None,
        })
        .map(|v4: Ipv4Addr| format!("http://{}:{}", v4, port))
        .collect()
}

fn log_network_urls(port: u16) {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Could not enumerate network interfaces: {}", e);
            return;
        }
    };

    let urls = network_urls(interfaces.iter().map(|iface| iface.ip()), port);
    if urls.is_empty() {
        info!("No LAN IPv4 address found; reachable on localhost only");
        return;
    }

    for url in urls {
        info!("Reachable on network: {}", url);
    }
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails; such a panic is fatal under
/// the process crash handler.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_network_urls_skip_loopback_and_ipv6() {
        let addrs = vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
        ];

        assert_eq!(
            network_urls(addrs, 5000),
            vec!["http://192.168.1.5:5000", "http://10.0.0.7:5000"]
        );
    }

    #[test]
    fn test_network_urls_empty() {
        let addrs = vec![IpAddr::V4(Ipv4Addr::LOCALHOST)];
        assert!(network_urls(addrs, 5000).is_empty());
    }
}
