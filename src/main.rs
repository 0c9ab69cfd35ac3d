//! # Static Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de archivos estáticos.

use clap::Parser;
use static_server::config::Config;
use static_server::error::ServerError;
use static_server::logging;
use static_server::server::{Server, ShutdownSignal};

fn run(config: Config) -> Result<(), ServerError> {
    config.validate().map_err(ServerError::Config)?;
    config.log_summary();

    let signal = ShutdownSignal::new();
    signal.install_handler()?;

    let mut server = Server::bind(config)?;
    let result = server.run(&signal);
    server.shutdown();
    result
}

fn main() {
    let config = Config::parse();
    logging::init(&config.log_level);

    tracing::info!("static_server v{} arrancando", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config) {
        tracing::error!("error fatal: {}", e);
        std::process::exit(1);
    }
}
