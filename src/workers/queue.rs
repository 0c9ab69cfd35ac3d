//! # Cola Acotada de Tareas
//! src/workers/queue.rs
//!
//! Buffer circular de capacidad fija, thread-safe, entre el dispatcher y el
//! pool de workers. Un solo `Mutex` y dos `Condvar` (no-llena, no-vacía):
//!
//! - `push` bloquea mientras la cola está llena (backpressure)
//! - `pop` bloquea mientras la cola está vacía
//! - `close` despierta a todos los que esperan y devuelve lo pendiente
//!
//! `is_full`, `is_empty` y `len` son fotos tomadas bajo el lock; pueden dejar
//! de ser ciertas apenas se libera.

use std::sync::{Condvar, Mutex, MutexGuard};
use thiserror::Error;

/// Errores de la cola
#[derive(Debug, Error)]
pub enum QueueError<T = ()> {
    #[error("queue capacity must be >= 1")]
    ZeroCapacity,

    #[error("not enough memory for a queue of {0} slots")]
    OutOfMemory(usize),

    /// La cola fue cerrada; en `push` se devuelve el valor al caller
    #[error("queue is closed")]
    Closed(T),

    #[error("queue lock poisoned")]
    Poisoned,
}

/// Estado protegido por el lock
struct Ring<T> {
    slots: Vec<Option<T>>,
    /// Próxima posición a leer
    front: usize,
    /// Próxima posición a escribir
    rear: usize,
    len: usize,
    closed: bool,
}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push_rear(&mut self, value: T) {
        debug_assert!(!self.is_full());
        self.slots[self.rear] = Some(value);
        self.rear = (self.rear + 1) % self.capacity();
        self.len += 1;
    }

    fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.front].take();
        self.front = (self.front + 1) % self.capacity();
        self.len -= 1;
        value
    }
}

/// Cola FIFO acotada y bloqueante
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola con `capacity` posiciones
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| QueueError::OutOfMemory(capacity))?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                front: 0,
                rear: 0,
                len: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ring<T>>, QueueError> {
        self.ring.lock().map_err(|_| QueueError::Poisoned)
    }

    /// Encola al final; bloquea mientras la cola esté llena
    pub fn push(&self, value: T) -> Result<(), QueueError<T>> {
        let mut ring = match self.ring.lock() {
            Ok(ring) => ring,
            Err(_) => return Err(QueueError::Poisoned),
        };

        while ring.is_full() && !ring.closed {
            ring = match self.not_full.wait(ring) {
                Ok(ring) => ring,
                Err(_) => return Err(QueueError::Poisoned),
            };
        }

        if ring.closed {
            return Err(QueueError::Closed(value));
        }

        ring.push_rear(value);
        drop(ring);
        self.not_empty.notify_one();

        Ok(())
    }

    /// Desencola del frente; bloquea mientras la cola esté vacía
    ///
    /// Retorna `Closed` cuando la cola se cerró (lo pendiente ya fue devuelto
    /// por `close`).
    pub fn pop(&self) -> Result<T, QueueError> {
        let mut ring = self.lock()?;

        loop {
            if ring.closed {
                return Err(QueueError::Closed(()));
            }
            if let Some(value) = ring.pop_front() {
                drop(ring);
                self.not_full.notify_one();
                return Ok(value);
            }
            ring = self.not_empty.wait(ring).map_err(|_| QueueError::Poisoned)?;
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        let mut ring = self.ring.lock().ok()?;
        let value = ring.pop_front();
        if value.is_some() {
            drop(ring);
            self.not_full.notify_one();
        }
        value
    }

    /// Cierra la cola, despierta a todos los que esperan y devuelve los
    /// elementos que nadie llegó a desencolar
    pub fn close(&self) -> Vec<T> {
        let mut pending = Vec::new();
        // Con el lock envenenado igual se cierra: el estado del ring solo se
        // modifica en operaciones que no pueden entrar en pánico a la mitad
        let mut ring = match self.ring.lock() {
            Ok(ring) => ring,
            Err(poisoned) => poisoned.into_inner(),
        };

        ring.closed = true;
        while let Some(value) = ring.pop_front() {
            pending.push(value);
        }
        drop(ring);

        self.not_full.notify_all();
        self.not_empty.notify_all();
        pending
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|ring| ring.closed).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|ring| ring.len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().map(|ring| ring.is_empty()).unwrap_or(true)
    }

    pub fn is_full(&self) -> bool {
        self.lock().map(|ring| ring.is_full()).unwrap_or(false)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
