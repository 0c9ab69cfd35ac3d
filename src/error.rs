//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores del motor HTTP y errores de arranque del servidor.
//! Los errores de parsing y de decisión nunca salen del pipeline: el motor de
//! decisiones los convierte en una plantilla de respuesta con `status()`.

use crate::http::request::{Method, ParseError};
use crate::http::StatusCode;
use crate::workers::PoolError;
use thiserror::Error;

/// Errores del pipeline request → decisión → response
#[derive(Debug, Error)]
pub enum HttpError {
    /// Datos malformados en el wire
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ParseError),

    /// Método distinto de GET/HEAD
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// Path fuera de la raíz estática o con segmento `..`
    #[error("path forbidden: {0}")]
    PathForbidden(String),

    /// El path no es archivo regular ni directorio
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Directorio o tipo de contenido desconocido
    #[error("resource type unsupported: {0}")]
    ResourceTypeUnsupported(String),

    /// Fallo de memoria, de construcción de headers o de apertura de archivo
    #[error("internal failure: {0}")]
    InternalFailure(String),

    /// Errores de lectura/escritura en el socket o el filesystem
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// Código de estado con el que se responde a este error
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::InvalidRequest(_) => StatusCode::InternalServerError,
            HttpError::MethodNotAllowed(_) => StatusCode::MethodNotAllowed,
            HttpError::PathForbidden(_) => StatusCode::Forbidden,
            HttpError::ResourceNotFound(_) => StatusCode::NotFound,
            HttpError::ResourceTypeUnsupported(_) => StatusCode::NotImplemented,
            HttpError::InternalFailure(_) | HttpError::Io(_) => StatusCode::InternalServerError,
        }
    }
}

/// Errores fatales de arranque/ejecución del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Listener(#[from] std::io::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
