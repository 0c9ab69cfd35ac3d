//! # Workers
//! src/workers/mod.rs
//!
//! Cola acotada de tareas y pool de workers que la consume.

pub mod pool;
pub mod queue;
pub mod task;

pub use pool::{PoolError, WorkerPool, WorkerState};
pub use queue::{BoundedQueue, QueueError};
pub use task::Task;
