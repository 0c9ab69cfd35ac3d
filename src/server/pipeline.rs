//! # Pipeline por Conexión
//! src/server/pipeline.rs
//!
//! Lo que hace un worker con cada tarea:
//!
//! ```text
//! read (una sola vez) → parse → decide → write + flush → close
//! ```

use crate::error::HttpError;
use crate::http::{Request, StatusCode};
use crate::router::DecisionEngine;
use crate::storage::Storage;
use crate::workers::Task;
use std::io::{Read, Write};
use std::time::Instant;

/// Procesa conexiones completas contra un motor de decisiones
pub struct ConnectionHandler<S> {
    engine: DecisionEngine<S>,
    request_buffer_size: usize,
}

impl<S: Storage> ConnectionHandler<S> {
    pub fn new(engine: DecisionEngine<S>, request_buffer_size: usize) -> Self {
        Self {
            engine,
            request_buffer_size,
        }
    }

    /// Atiende una conexión
    ///
    /// Retorna `Ok(None)` si el cliente cerró sin mandar nada. Los errores de
    /// parsing y de decisión ya vienen convertidos en respuesta; solo la I/O
    /// sobre la conexión puede fallar.
    pub fn handle<C: Read + Write>(&self, conn: &mut C) -> Result<Option<StatusCode>, HttpError> {
        let started = Instant::now();

        let mut buffer = vec![0u8; self.request_buffer_size];
        let bytes_read = conn.read(&mut buffer)?;
        if bytes_read == 0 {
            tracing::debug!("conexión cerrada sin datos");
            return Ok(None);
        }
        tracing::trace!(bytes = bytes_read, "request leído");

        let parsed = Request::parse(&buffer[..bytes_read]);
        if let Err(e) = &parsed {
            tracing::warn!("request inválido: {}", e);
        }

        let (mut response, status) = self.engine.decide(parsed.as_ref());
        response.write_to(conn, self.engine.default_protocol(), self.engine.storage())?;
        conn.flush()?;

        match &parsed {
            Ok(request) => tracing::info!(
                method = %request.method(),
                path = request.path(),
                status = status.as_u16(),
                elapsed_ms = request.processing_duration().as_secs_f64() * 1000.0,
                "request atendido"
            ),
            Err(_) => tracing::info!(
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                "request inválido atendido"
            ),
        }

        Ok(Some(status))
    }

    /// Job de los workers: atiende la conexión de la tarea y la cierra
    pub fn serve<C: Read + Write>(&self, mut task: Task<C>) {
        let id = task.id();
        tracing::debug!(task = id, waited_ms = task.waited().as_millis() as u64, "tarea tomada");

        if let Err(e) = self.handle(task.conn_mut()) {
            tracing::error!(task = id, "error atendiendo conexión: {}", e);
        }
        // Al soltar la tarea se cierra la conexión
        drop(task);
    }
}
