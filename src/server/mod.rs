//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones y las despacha al pool de workers
//! 3. En cada worker: lee, parsea, decide y escribe la respuesta
//! 4. Se apaga en orden ante SIGINT/SIGTERM

pub mod dispatcher;
pub mod pipeline;
pub mod shutdown;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use dispatcher::Dispatcher;
pub use pipeline::ConnectionHandler;
pub use shutdown::ShutdownSignal;
pub use tcp::{Server, ACCEPT_POLL_INTERVAL};
