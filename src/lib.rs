//! # Static Server
//! src/lib.rs
//!
//! Servidor HTTP/1.x de archivos estáticos. Un thread acepta conexiones y
//! las encola en una cola acotada; un pool fijo de workers atiende cada
//! conexión de punta a punta y la cierra.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: modelo de request/response, headers y códigos de estado
//! - `router`: motor de decisiones sobre la raíz estática y tabla MIME
//! - `storage`: clasificación y lectura de archivos
//! - `workers`: cola acotada y pool de workers
//! - `server`: accept loop, dispatcher, pipeline por conexión y apagado
//! - `config`, `logging`, `error`: configuración, trazas y errores
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_server::config::Config;
//! use static_server::server::{Server, ShutdownSignal};
//!
//! let signal = ShutdownSignal::new();
//! let mut server = Server::bind(Config::default()).unwrap();
//! server.run(&signal).unwrap();
//! server.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod storage;
pub mod workers;
