//! Unidad de trabajo: una conexión aceptada esperando a un worker.

use std::time::{Duration, Instant};

/// Envuelve un handle de conexión
///
/// La crea el dispatcher y la consume exactamente un worker; al destruirse
/// se cierra la conexión.
#[derive(Debug)]
pub struct Task<C> {
    id: u64,
    conn: C,
    accepted_at: Instant,
}

impl<C> Task<C> {
    pub fn new(id: u64, conn: C) -> Self {
        Self {
            id,
            conn,
            accepted_at: Instant::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Tiempo que la tarea lleva desde que se aceptó la conexión
    pub fn waited(&self) -> Duration {
        self.accepted_at.elapsed()
    }
}
