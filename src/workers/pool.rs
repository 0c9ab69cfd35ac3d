//! # Pool de Workers
//! src/workers/pool.rs
//!
//! N threads de larga vida que sacan tareas de la `BoundedQueue` compartida y
//! ejecutan el job (el pipeline request/response) sobre cada una.
//!
//! ## Estados de un worker
//!
//! ```text
//! Idle ──(hay tarea)──▶ Processing ──▶ Idle
//!   │                       │
//!   └────────(stop)─────────┴──▶ Cancelled
//! ```
//!
//! La cancelación es cooperativa: cada worker revisa el flag antes de sacar
//! una tarea y antes de empezar el job. `stop` cierra la cola (las tareas
//! pendientes se descartan) y espera a los workers un período de gracia.

use super::queue::{BoundedQueue, QueueError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Cada cuánto se revisa si los workers terminaron durante `stop`
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errores del pool
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool size must be >= 1")]
    ZeroWorkers,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("worker pool already started")]
    AlreadyStarted,

    #[error("worker pool is stopped")]
    Stopped,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker pool state lock poisoned")]
    Poisoned,
}

/// Estado observable de un worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Processing = 1,
    Cancelled = 2,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Processing,
            _ => WorkerState::Cancelled,
        }
    }
}

/// Lo que cada thread necesita para su loop
struct WorkerContext<T, F> {
    id: usize,
    queue: Arc<BoundedQueue<T>>,
    cancel: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    job: Arc<F>,
}

impl<T, F> WorkerContext<T, F>
where
    F: Fn(T),
{
    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn run(self) {
        tracing::debug!(worker = self.id, "worker started");

        loop {
            if self.cancelled() {
                break;
            }
            self.set_state(WorkerState::Idle);

            let task = match self.queue.pop() {
                Ok(task) => task,
                Err(QueueError::Closed(())) => break,
                Err(e) => {
                    tracing::error!(worker = self.id, "no se pudo sacar tarea: {}", e);
                    break;
                }
            };

            if self.cancelled() {
                drop(task);
                break;
            }

            self.set_state(WorkerState::Processing);
            let job = self.job.as_ref();
            if panic::catch_unwind(AssertUnwindSafe(move || job(task))).is_err() {
                tracing::error!(worker = self.id, "el job entró en pánico; el worker sigue activo");
            }
        }

        self.set_state(WorkerState::Cancelled);
        tracing::debug!(worker = self.id, "worker stopped");
    }
}

/// Pool de tamaño fijo dueño de la cola de tareas
pub struct WorkerPool<T: Send + 'static> {
    size: usize,
    queue: Arc<BoundedQueue<T>>,
    cancel: Arc<AtomicBool>,
    states: Vec<Arc<AtomicU8>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Crea un pool de `size` workers con una cola de `capacity` tareas
    pub fn new(size: usize, capacity: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::ZeroWorkers);
        }
        let queue = BoundedQueue::new(capacity)?;

        Ok(Self {
            size,
            queue: Arc::new(queue),
            cancel: Arc::new(AtomicBool::new(false)),
            states: (0..size)
                .map(|_| Arc::new(AtomicU8::new(WorkerState::Idle as u8)))
                .collect(),
            handles: Mutex::new(Vec::with_capacity(size)),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Política por defecto: una tarea pendiente por worker
    pub fn with_default_capacity(size: usize) -> Result<Self, PoolError> {
        Self::new(size, size)
    }

    /// Lanza los `size` threads; cada uno ejecuta `job` sobre cada tarea
    pub fn start<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(PoolError::Stopped);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(PoolError::AlreadyStarted);
        }

        let job = Arc::new(job);
        let mut handles = self.handles.lock().map_err(|_| PoolError::Poisoned)?;

        for (id, state) in self.states.iter().enumerate() {
            let context = WorkerContext {
                id,
                queue: Arc::clone(&self.queue),
                cancel: Arc::clone(&self.cancel),
                state: Arc::clone(state),
                job: Arc::clone(&job),
            };

            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || context.run())
                .map_err(PoolError::Spawn)?;
            handles.push(handle);
        }

        tracing::info!(
            workers = self.size,
            capacity = self.queue.capacity(),
            "pool de workers iniciado"
        );
        Ok(())
    }

    /// Encola una tarea; bloquea mientras la cola esté llena
    pub fn submit(&self, task: T) -> Result<(), PoolError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(PoolError::Stopped);
        }

        match self.queue.push(task) {
            Ok(()) => Ok(()),
            Err(QueueError::Closed(_)) => Err(PoolError::Stopped),
            Err(QueueError::Poisoned) => Err(PoolError::Queue(QueueError::Poisoned)),
            Err(QueueError::ZeroCapacity) => Err(PoolError::Queue(QueueError::ZeroCapacity)),
            Err(QueueError::OutOfMemory(n)) => Err(PoolError::Queue(QueueError::OutOfMemory(n))),
        }
    }

    /// Marca la cancelación y cierra la cola sin esperar a los workers
    ///
    /// Las tareas pendientes se descartan y cualquier `submit` bloqueado
    /// retorna `Stopped`. Se puede llamar desde cualquier thread y más de una
    /// vez; `stop` la incluye.
    pub fn cancel(&self) {
        if self.cancel.swap(true, Ordering::SeqCst) {
            return;
        }

        let discarded = self.queue.close();
        if !discarded.is_empty() {
            tracing::warn!(count = discarded.len(), "descartando tareas sin procesar");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Detiene el pool
    ///
    /// Marca la cancelación, cierra la cola descartando lo pendiente y espera
    /// a los workers hasta `grace`. Retorna cuántos workers seguían ocupados
    /// al vencer el plazo (quedan desacoplados y terminan su tarea actual).
    pub fn stop(&self, grace: Duration) -> usize {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return 0;
        }

        tracing::info!("deteniendo workers del pool...");
        self.cancel();

        let mut pending = match self.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        let deadline = Instant::now() + grace;
        loop {
            let (finished, running): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|handle| handle.is_finished());

            for handle in finished {
                if handle.join().is_err() {
                    tracing::warn!("un worker terminó con pánico");
                }
            }
            pending = running;

            let now = Instant::now();
            if pending.is_empty() || now >= deadline {
                break;
            }
            thread::sleep(STOP_POLL_INTERVAL.min(deadline - now));
        }

        if !pending.is_empty() {
            tracing::warn!(
                count = pending.len(),
                "workers ocupados al vencer el período de gracia; se abandonan"
            );
        }
        tracing::info!("pool de workers detenido");
        pending.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Tareas encoladas que aún no tomó ningún worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Foto del estado de cada worker
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.states
            .iter()
            .map(|state| WorkerState::from_u8(state.load(Ordering::SeqCst)))
            .collect()
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.stop(Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    /// Tarea que cuenta cuántas veces fue destruida
    struct Tracked {
        id: u32,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn wait_for<P: Fn() -> bool>(predicate: P) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(WorkerPool::<u32>::new(0, 4), Err(PoolError::ZeroWorkers)));
        assert!(matches!(
            WorkerPool::<u32>::new(2, 0),
            Err(PoolError::Queue(QueueError::ZeroCapacity))
        ));
    }

    #[test]
    fn test_default_capacity_matches_workers() {
        let pool = WorkerPool::<u32>::with_default_capacity(7).unwrap();
        assert_eq!(pool.size(), 7);
        assert_eq!(pool.capacity(), 7);
    }

    #[test]
    fn test_processes_every_task_once() {
        let pool = WorkerPool::new(3, 3).unwrap();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        pool.start(move |n: u32| {
            tx.lock().unwrap().send(n).unwrap();
        })
        .unwrap();

        for n in 0..50 {
            pool.submit(n).unwrap();
        }

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let n = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert!(seen.insert(n), "tarea {} entregada dos veces", n);
        }
        assert_eq!(pool.stop(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_single_worker_is_fifo() {
        let pool = WorkerPool::new(1, 4).unwrap();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        pool.start(move |n: u32| {
            tx.lock().unwrap().send(n).unwrap();
        })
        .unwrap();

        for n in 0..20 {
            pool.submit(n).unwrap();
        }
        let order: Vec<u32> = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_submit_blocks_when_full_and_never_drops() {
        let pool = Arc::new(WorkerPool::new(1, 1).unwrap());
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();
        let started_tx = Mutex::new(started_tx);
        let gate_rx = Mutex::new(gate_rx);
        let done_tx = Mutex::new(done_tx);

        pool.start(move |n: u32| {
            started_tx.lock().unwrap().send(n).unwrap();
            gate_rx.lock().unwrap().recv().unwrap();
            done_tx.lock().unwrap().send(n).unwrap();
        })
        .unwrap();

        // El único worker queda ocupado con la tarea 1
        pool.submit(1).unwrap();
        assert_eq!(started_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        assert_eq!(pool.worker_states(), vec![WorkerState::Processing]);

        // La tarea 2 llena la cola
        pool.submit(2).unwrap();
        assert_eq!(pool.queued(), 1);

        // La tarea 3 debe bloquear al productor
        let submitted = Arc::new(AtomicBool::new(false));
        let producer = {
            let pool = Arc::clone(&pool);
            let submitted = Arc::clone(&submitted);
            thread::spawn(move || {
                pool.submit(3).unwrap();
                submitted.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(150));
        assert!(!submitted.load(Ordering::SeqCst), "submit debía bloquear con la cola llena");

        for _ in 0..3 {
            gate_tx.send(()).unwrap();
        }
        producer.join().unwrap();
        assert!(submitted.load(Ordering::SeqCst));

        let mut done: Vec<u32> = (0..3)
            .map(|_| done_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        done.sort();
        assert_eq!(done, vec![1, 2, 3]);

        assert_eq!(pool.stop(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_stop_idle_workers() {
        let pool = WorkerPool::new(4, 4).unwrap();
        pool.start(|_: u32| {}).unwrap();

        assert_eq!(pool.stop(Duration::from_secs(2)), 0);
        assert!(pool.is_stopped());
        assert!(pool
            .worker_states()
            .iter()
            .all(|state| *state == WorkerState::Cancelled));
    }

    #[test]
    fn test_stop_discards_queued_and_detaches_busy() {
        let pool = WorkerPool::new(1, 4).unwrap();
        let drops = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let gate_rx = Mutex::new(gate_rx);

        pool.start(move |task: Tracked| {
            started_tx.lock().unwrap().send(task.id).unwrap();
            let _ = gate_rx.lock().unwrap().recv();
        })
        .unwrap();

        for id in 0..4 {
            pool.submit(Tracked {
                id,
                drops: Arc::clone(&drops),
            })
            .unwrap();
        }
        assert_eq!(started_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);

        // 3 tareas pendientes se descartan; el worker ocupado se abandona
        assert_eq!(pool.stop(Duration::from_millis(50)), 1);
        assert!(wait_for(|| drops.load(Ordering::SeqCst) == 3));

        gate_tx.send(()).unwrap();
        assert!(wait_for(|| drops.load(Ordering::SeqCst) == 4));
        assert!(wait_for(|| pool.worker_states() == vec![WorkerState::Cancelled]));
    }

    #[test]
    fn test_submit_after_stop() {
        let pool = WorkerPool::new(1, 1).unwrap();
        pool.start(|_: u32| {}).unwrap();
        pool.stop(Duration::from_secs(1));
        assert!(matches!(pool.submit(1), Err(PoolError::Stopped)));
        assert!(matches!(pool.start(|_: u32| {}), Err(PoolError::Stopped)));
    }

    #[test]
    fn test_start_twice() {
        let pool = WorkerPool::new(1, 1).unwrap();
        pool.start(|_: u32| {}).unwrap();
        assert!(matches!(pool.start(|_: u32| {}), Err(PoolError::AlreadyStarted)));
    }

    #[test]
    fn test_panicking_job_keeps_worker_alive() {
        let pool = WorkerPool::new(1, 2).unwrap();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        pool.start(move |n: u32| {
            if n == 0 {
                panic!("job roto");
            }
            tx.lock().unwrap().send(n).unwrap();
        })
        .unwrap();

        pool.submit(0).unwrap();
        pool.submit(1).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
    }

    #[test]
    fn test_cancel_releases_blocked_submit() {
        let pool = Arc::new(WorkerPool::new(1, 1).unwrap());
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let gate_rx = Mutex::new(gate_rx);

        pool.start(move |n: u32| {
            started_tx.lock().unwrap().send(n).unwrap();
            let _ = gate_rx.lock().unwrap().recv();
        })
        .unwrap();

        pool.submit(1).unwrap();
        assert_eq!(started_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        pool.submit(2).unwrap();

        let producer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.submit(3))
        };
        thread::sleep(Duration::from_millis(100));
        assert!(!producer.is_finished(), "submit debía bloquear con la cola llena");

        pool.cancel();
        assert!(matches!(producer.join().unwrap(), Err(PoolError::Stopped)));
        assert!(pool.is_cancelled());
        assert_eq!(pool.queued(), 0);

        gate_tx.send(()).unwrap();
        assert_eq!(pool.stop(Duration::from_secs(2)), 0);
    }
}
