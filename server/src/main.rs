use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use udpdemux_server::cli::Cli;
use udpdemux_server::{Relay, Role};

fn init_tracing() {
    #[cfg(debug_assertions)]
    let default_level = "debug";

    #[cfg(not(debug_assertions))]
    let default_level = "info";

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();
    init_tracing();

    let relay = match Relay::open(&config).await {
        Ok(relay) => relay,
        Err(e) => {
            error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let listen = relay
        .local_addr(Role::ClientFacing)
        .map_or_else(|_| config.listen.to_string(), |addr| addr.to_string());
    info!(
        "UDP demultiplexer, listen address {}, remote address {}, DTLS address {}",
        listen, config.remote, config.dtls
    );

    match relay.run(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[{}] Relay stopped: {}", e.role(), e);
            ExitCode::FAILURE
        }
    }
}
