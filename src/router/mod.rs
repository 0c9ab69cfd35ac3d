//! # Motor de Decisiones
//! src/router/mod.rs
//!
//! Política de enrutamiento de archivos estáticos: dado un request (y lo que
//! responde el `Storage`) decide el código de estado y arma la plantilla de
//! la respuesta.
//!
//! ## Reglas (gana la primera que aplica)
//!
//! ```text
//! parse fallido                          → 500
//! método distinto de GET/HEAD            → 405
//! fuera de la raíz o con segmento ".."   → 403
//! raíz o raíz + "/"                      → se reescribe a raíz/index.html
//! directorio                             → 501
//! ni archivo ni directorio               → 404
//! sufijo sin tipo MIME                   → 501
//! archivo regular                        → 200 (GET adjunta el archivo)
//! ```
//!
//! Si algo falla después de decidir 200 (headers, apertura del archivo) la
//! respuesta se degrada a 500 y se reconstruye la plantilla.

pub mod mime;

use crate::error::HttpError;
use crate::http::{Method, ParseError, Request, Response, StatusCode};
use crate::storage::{FileKind, Storage};

/// Archivo que se sirve para la raíz estática
pub const INDEX_FILE: &str = "index.html";

/// Archivo resuelto que se puede servir con 200
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    path: String,
    content_type: &'static str,
    size: u64,
}

/// Motor de decisiones sobre una raíz estática
pub struct DecisionEngine<S> {
    /// Raíz normalizada, sin separador final (salvo que sea "/")
    static_root: String,
    default_protocol: String,
    server_name: String,
    storage: S,
}

impl<S: Storage> DecisionEngine<S> {
    pub fn new(static_root: &str, default_protocol: &str, server_name: &str, storage: S) -> Self {
        let trimmed = static_root.trim_end_matches('/');
        let static_root = if trimmed.is_empty() { "/" } else { trimmed };

        Self {
            static_root: static_root.to_string(),
            default_protocol: default_protocol.to_string(),
            server_name: server_name.to_string(),
            storage,
        }
    }

    pub fn static_root(&self) -> &str {
        &self.static_root
    }

    pub fn default_protocol(&self) -> &str {
        &self.default_protocol
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Decide la respuesta para el resultado del parsing
    ///
    /// Nunca falla: cualquier error se convierte en la plantilla de su código.
    pub fn decide(&self, parsed: Result<&Request, &ParseError>) -> (Response, StatusCode) {
        let protocol = match parsed {
            Ok(request) => request.protocol(),
            Err(_) => self.default_protocol.as_str(),
        };

        let (method, target) = match self.resolve(parsed) {
            Ok(resolved) => resolved,
            Err(e) => {
                let status = e.status();
                tracing::debug!(%status, "decisión: {}", e);
                return (self.template(protocol, status), status);
            }
        };

        match self.success(protocol, method, &target) {
            Ok(response) => (response, StatusCode::Ok),
            Err(e) => {
                tracing::error!(path = %target.path, "degradando respuesta a 500: {}", e);
                let status = StatusCode::InternalServerError;
                (self.template(protocol, status), status)
            }
        }
    }

    fn resolve(&self, parsed: Result<&Request, &ParseError>) -> Result<(Method, Target), HttpError> {
        let request = parsed.map_err(|e| HttpError::InvalidRequest(e.clone()))?;

        let method = request.method();
        if !matches!(method, Method::GET | Method::HEAD) {
            return Err(HttpError::MethodNotAllowed(method));
        }

        let path = self.confine(request.path())?;

        let class = self.storage.classify(&path);
        match class.kind {
            FileKind::Regular => {}
            FileKind::Directory => {
                return Err(HttpError::ResourceTypeUnsupported(format!(
                    "{} is a directory",
                    path
                )))
            }
            FileKind::Unknown => return Err(HttpError::ResourceNotFound(path)),
        }

        let content_type = mime::content_type_for(&path).ok_or_else(|| {
            HttpError::ResourceTypeUnsupported(format!("{} has no known content type", path))
        })?;

        Ok((
            method,
            Target {
                path,
                content_type,
                size: class.size,
            },
        ))
    }

    /// Verifica que el path esté dentro de la raíz y aplica la reescritura a
    /// `index.html`
    fn confine(&self, path: &str) -> Result<String, HttpError> {
        if !self.is_within_root(path) || path.split('/').any(|segment| segment == "..") {
            return Err(HttpError::PathForbidden(path.to_string()));
        }

        let root = self.static_root.as_str();
        if path == root || path.strip_prefix(root) == Some("/") {
            return Ok(self.index_path());
        }

        Ok(path.to_string())
    }

    fn is_within_root(&self, path: &str) -> bool {
        if self.static_root == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.static_root.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn index_path(&self) -> String {
        if self.static_root == "/" {
            format!("/{}", INDEX_FILE)
        } else {
            format!("{}/{}", self.static_root, INDEX_FILE)
        }
    }

    /// Plantilla de respuesta: protocolo, código y headers comunes
    fn template(&self, protocol: &str, status: StatusCode) -> Response {
        Response::new(protocol, status)
            .with_header("Server", &self.server_name)
            .with_header("Connection", "close")
    }

    fn success(&self, protocol: &str, method: Method, target: &Target) -> Result<Response, HttpError> {
        let mut response = self.template(protocol, StatusCode::Ok);
        response.set_header("Content-Type", target.content_type)?;
        response.set_header("Content-Length", &target.size.to_string())?;

        if method == Method::GET {
            let handle = self.storage.open(&target.path).map_err(|e| {
                HttpError::InternalFailure(format!("open {}: {}", target.path, e))
            })?;
            response.attach(handle);
        }

        Ok(response)
    }
}
