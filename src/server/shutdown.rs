//! Señal de apagado compartida entre el handler de señales y el accept loop.
//!
//! Además del flag, la señal guarda hooks que corren en el thread que la
//! dispara. El servidor registra ahí la cancelación del pool, así un accept
//! loop bloqueado en `submit` con la cola llena se despierta igual.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    flag: AtomicBool,
    hooks: Mutex<Vec<Hook>>,
}

#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispara la señal y corre los hooks registrados
    ///
    /// Retorna `false` si ya estaba disparada; los hooks corren una sola vez.
    pub fn trigger(&self) -> bool {
        let hooks = {
            let mut hooks = match self.inner.hooks.lock() {
                Ok(hooks) => hooks,
                Err(poisoned) => poisoned.into_inner(),
            };
            if self.inner.flag.swap(true, Ordering::SeqCst) {
                return false;
            }
            std::mem::take(&mut *hooks)
        };

        for hook in hooks {
            hook();
        }
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Registra una acción para el momento del disparo
    ///
    /// Si la señal ya se disparó, la acción corre de inmediato.
    pub fn on_trigger<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut hooks = match self.inner.hooks.lock() {
                Ok(hooks) => hooks,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !self.inner.flag.load(Ordering::SeqCst) {
                hooks.push(Box::new(hook));
                return;
            }
        }
        hook();
    }

    /// Registra el handler de SIGINT/SIGTERM
    ///
    /// La primera señal dispara el apagado ordenado; una segunda solo se
    /// anota en el log.
    pub fn install_handler(&self) -> Result<(), ctrlc::Error> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            if signal.is_triggered() {
                tracing::warn!("señal repetida; el apagado ya está en curso");
            } else {
                tracing::info!("señal recibida; iniciando apagado");
                signal.trigger();
            }
        })
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
