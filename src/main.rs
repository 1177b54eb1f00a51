use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use train_ticket::TicketService;
use train_ticket::config::Config;
use train_ticket::server;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let train = config.train_info();

    let listener = match TcpListener::bind(config.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(listen = %config.listen, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        listen = %config.listen,
        train = %train.id,
        from = %train.origin,
        to = %train.destination,
        date = %train.date,
        capacity = config.capacity,
        "ticket server started"
    );

    let service = Arc::new(TicketService::new(train, config.capacity));

    tokio::select! {
        () = server::serve(listener, service) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "failed to listen for shutdown signal");
                return ExitCode::FAILURE;
            }
            info!("shutting down");
        }
    }

    ExitCode::SUCCESS
}
