//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Un thread acepta conexiones y las despacha al pool; N workers ejecutan el
//! pipeline sobre cada una.
//!
//! El listener queda en modo no bloqueante y se consulta cada
//! `ACCEPT_POLL_INTERVAL`, así el accept loop ve la señal de apagado sin
//! necesitar una conexión extra que lo despierte.

use super::dispatcher::Dispatcher;
use super::pipeline::ConnectionHandler;
use super::shutdown::ShutdownSignal;
use crate::config::Config;
use crate::error::ServerError;
use crate::router::DecisionEngine;
use crate::storage::FsStorage;
use crate::workers::{PoolError, Task, WorkerPool};
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Espera entre consultas al listener cuando no hay conexiones pendientes
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Servidor de archivos estáticos
pub struct Server {
    config: Config,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    handler: Option<Arc<ConnectionHandler<FsStorage>>>,
    pool: Arc<WorkerPool<Task<TcpStream>>>,
    dispatcher: Dispatcher<TcpStream>,
}

impl Server {
    /// Valida la configuración, abre el listener y arma el pool
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        let engine = DecisionEngine::new(
            &config.static_root,
            &config.protocol,
            &config.server_name,
            FsStorage::new(),
        );
        let handler = Arc::new(ConnectionHandler::new(engine, config.request_buffer));

        let pool = Arc::new(WorkerPool::new(config.workers, config.queue_capacity())?);
        let dispatcher = Dispatcher::new(Arc::clone(&pool));

        tracing::info!(address = %local_addr, root = %config.static_root, "servidor escuchando");

        Ok(Self {
            config,
            listener: Some(listener),
            local_addr,
            handler: Some(handler),
            pool,
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Arranca los workers y corre el accept loop hasta que `shutdown` se
    /// dispare
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> Result<(), ServerError> {
        let handler = match &self.handler {
            Some(handler) => Arc::clone(handler),
            None => return Err(ServerError::Pool(PoolError::Stopped)),
        };
        self.pool.start(move |task| handler.serve(task))?;

        // La señal cancela el pool directamente: un dispatch bloqueado por
        // backpressure retorna `Stopped` y el loop termina
        let pool = Arc::downgrade(&self.pool);
        shutdown.on_trigger(move || {
            if let Some(pool) = pool.upgrade() {
                pool.cancel();
            }
        });

        let listener = match &self.listener {
            Some(listener) => listener,
            None => return Err(ServerError::Pool(PoolError::Stopped)),
        };
        listener.set_nonblocking(true)?;

        tracing::info!(
            workers = self.pool.size(),
            capacity = self.pool.capacity(),
            "aceptando conexiones"
        );

        while !shutdown.is_triggered() && !self.pool.is_cancelled() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "nueva conexión");
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::error!(%peer, "no se pudo configurar la conexión: {}", e);
                        continue;
                    }
                    match self.dispatcher.dispatch(stream) {
                        Ok(_) => {}
                        Err(PoolError::Stopped) => break,
                        Err(e) => tracing::error!(%peer, "no se pudo despachar: {}", e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("error al aceptar conexión: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!(dispatched = self.dispatcher.dispatched(), "accept loop terminado");
        Ok(())
    }

    /// Apaga en orden: pool, handler, listener
    pub fn shutdown(mut self) {
        let detached = self.pool.stop(self.config.shutdown_grace());
        tracing::info!(detached, "pool detenido");

        drop(self.handler.take());
        tracing::info!("handler liberado");

        drop(self.listener.take());
        tracing::info!(address = %self.local_addr, "listener liberado");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral_config() -> Config {
        Config {
            port: 0,
            workers: 2,
            ..Config::default()
        }
    }

    #[test]
    fn test_bind_rejects_invalid_config() {
        let mut config = ephemeral_config();
        config.workers = 0;
        assert!(matches!(Server::bind(config), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let server = Server::bind(ephemeral_config()).unwrap();
        assert_ne!(server.local_addr().port(), 0);
        server.shutdown();
    }

    #[test]
    fn test_bind_port_in_use() {
        let first = Server::bind(ephemeral_config()).unwrap();
        let mut config = ephemeral_config();
        config.port = first.local_addr().port();

        assert!(matches!(Server::bind(config), Err(ServerError::Bind { .. })));
        first.shutdown();
    }

    #[test]
    fn test_run_returns_when_signalled() {
        let mut server = Server::bind(ephemeral_config()).unwrap();
        let signal = ShutdownSignal::new();
        signal.trigger();

        server.run(&signal).unwrap();
        server.shutdown();
    }
}
