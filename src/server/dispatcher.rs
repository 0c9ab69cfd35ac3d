//! Entrega de conexiones aceptadas al pool de workers.

use crate::workers::{PoolError, Task, WorkerPool};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Envuelve cada conexión en una `Task` numerada y la encola
///
/// `dispatch` bloquea mientras la cola esté llena: nunca se descarta una
/// conexión por backpressure.
pub struct Dispatcher<C: Send + 'static> {
    pool: Arc<WorkerPool<Task<C>>>,
    next_id: AtomicU64,
}

impl<C: Send + 'static> Dispatcher<C> {
    pub fn new(pool: Arc<WorkerPool<Task<C>>>) -> Self {
        Self {
            pool,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn dispatch(&self, conn: C) -> Result<u64, PoolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pool.submit(Task::new(id, conn))?;
        tracing::trace!(task = id, "conexión encolada");
        Ok(id)
    }

    /// Cantidad de tareas despachadas hasta ahora
    pub fn dispatched(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_dispatch_assigns_increasing_ids() {
        let pool = Arc::new(WorkerPool::new(1, 4).unwrap());
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        pool.start(move |mut task: Task<&'static str>| {
            tx.lock().unwrap().send((task.id(), *task.conn_mut())).unwrap();
        })
        .unwrap();

        let dispatcher = Dispatcher::new(Arc::clone(&pool));
        assert_eq!(dispatcher.dispatch("a").unwrap(), 1);
        assert_eq!(dispatcher.dispatch("b").unwrap(), 2);
        assert_eq!(dispatcher.dispatched(), 2);

        let got: Vec<_> = (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(got, vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_dispatch_after_stop_fails() {
        let pool = Arc::new(WorkerPool::new(1, 1).unwrap());
        pool.start(|_: Task<u8>| {}).unwrap();
        pool.stop(Duration::from_secs(1));

        let dispatcher = Dispatcher::new(pool);
        assert!(matches!(dispatcher.dispatch(0), Err(PoolError::Stopped)));
    }
}
