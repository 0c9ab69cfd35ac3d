//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos estáticos con soporte para
//! argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./static_server --port 8080 \
//!   --static-root /srv/www \
//!   --workers 7 \
//!   --queue-capacity 32
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 STATIC_ROOT=/srv/www WORKERS=4 ./static_server
//! ```

use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Configuración del servidor HTTP/1.x
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "static_server")]
#[command(about = "Servidor HTTP/1.x de archivos estáticos con pool de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Prefijo absoluto bajo el cual se sirven archivos
    #[arg(long = "static-root", default_value = "/tmp/static", env = "STATIC_ROOT")]
    pub static_root: String,

    // === Workers ===

    /// Número de workers del pool
    #[arg(short, long, default_value = "7", env = "WORKERS")]
    pub workers: usize,

    /// Capacidad de la cola de tareas (por defecto, igual a `workers`)
    #[arg(long = "queue-capacity", env = "QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    // === Protocolo ===

    /// Máximo de bytes leídos por request
    #[arg(long = "request-buffer", default_value = "8192", env = "REQUEST_BUFFER")]
    pub request_buffer: usize,

    /// Versión de protocolo cuando el request no trae una válida
    #[arg(long, default_value = "HTTP/1.1", env = "HTTP_PROTOCOL")]
    pub protocol: String,

    /// Valor del header `Server`
    #[arg(long = "server-name", default_value = "static-server/0.1", env = "SERVER_NAME")]
    pub server_name: String,

    // === Ciclo de vida ===

    /// Tiempo máximo de espera a los workers al apagar, en milisegundos
    #[arg(long = "shutdown-grace-ms", default_value = "5000", env = "SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: u64,

    /// Nivel de log cuando `RUST_LOG` no está definida
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Capacidad efectiva de la cola
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity() == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.request_buffer < 16 {
            return Err("Request buffer must be >= 16 bytes".to_string());
        }
        if !Path::new(&self.static_root).is_absolute() {
            return Err(format!("Static root must be an absolute path: {}", self.static_root));
        }
        if !self.protocol.starts_with("HTTP/") {
            return Err(format!("Protocol must start with HTTP/: {}", self.protocol));
        }

        Ok(())
    }

    /// Resumen de la configuración efectiva
    pub fn summary_json(&self) -> serde_json::Value {
        let mut summary = serde_json::to_value(self).unwrap_or_default();
        if let Some(fields) = summary.as_object_mut() {
            fields.insert("address".to_string(), self.address().into());
            fields.insert("queue_capacity".to_string(), self.queue_capacity().into());
        }
        summary
    }

    /// Registra el resumen en el log de arranque
    pub fn log_summary(&self) {
        tracing::info!(config = %self.summary_json(), "configuración efectiva");
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            static_root: "/tmp/static".to_string(),
            workers: 7,
            queue_capacity: None,
            request_buffer: 8192,
            protocol: "HTTP/1.1".to_string(),
            server_name: "static-server/0.1".to_string(),
            shutdown_grace_ms: 5_000,
            log_level: "info".to_string(),
        }
    }
}
