//! # Logging
//! src/logging.rs
//!
//! Subscriber de `tracing` para el binario y los tests. `RUST_LOG` manda; si
//! no está definida se usa `static_server=<level>`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filtro por defecto para un nivel dado
pub fn default_filter(level: &str) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

/// Instala el subscriber global
///
/// Retorna `false` si ya había uno instalado (llamarla dos veces no falla).
pub fn init(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init()
        .is_ok()
}
