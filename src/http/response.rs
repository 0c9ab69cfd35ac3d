//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Builder mutable de una respuesta y su serialización al wire.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <h1>hola</h1>
//! ```
//!
//! Sin body la respuesta termina inmediatamente después del último header,
//! sin línea en blanco extra.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use static_server::http::{Response, StatusCode};
//!
//! let response = Response::new("HTTP/1.1", StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("hola");
//!
//! let bytes = response.to_bytes("HTTP/1.1").unwrap();
//! assert!(bytes.ends_with(b"\r\n\r\nhola"));
//! ```

use super::header::Headers;
use super::StatusCode;
use crate::error::HttpError;
use crate::storage::{Attachment, FsStorage, Storage};
use std::io::{self, Write};

/// Cuerpo de la respuesta; solo una variante está activa al escribir
pub enum Body {
    /// Sin body: la respuesta termina después de los headers
    Empty,
    /// Bytes en memoria
    Bytes(Vec<u8>),
    /// Handle abierto que se copia en streaming al destino
    Attachment(Attachment),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Body::Attachment(_) => f.write_str("Attachment"),
        }
    }
}

/// Respuesta HTTP en construcción
///
/// La response es dueña del handle adjunto: al destruirse la response el
/// archivo se cierra, termine bien o mal la escritura.
#[derive(Debug)]
pub struct Response {
    protocol: Option<String>,
    status: Option<StatusCode>,
    headers: Headers,
    body: Body,
}

impl Response {
    /// Crea una respuesta con protocolo y código de estado
    pub fn new(protocol: &str, status: StatusCode) -> Self {
        Self {
            protocol: Some(protocol.to_string()),
            status: Some(status),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Respuesta sin protocolo ni código; se completan por defecto al escribir
    pub fn empty() -> Self {
        Self {
            protocol: None,
            status: None,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    pub fn set_protocol(&mut self, protocol: &str) {
        self.protocol = Some(protocol.to_string());
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Agrega un header (se escriben en orden de inserción)
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), HttpError> {
        self.headers.set(name, value)
    }

    /// Versión builder de `set_header`
    ///
    /// Ignora un fallo de memoria de la colección; el motor de decisiones
    /// usa `set_header` para poder degradar a 500.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Err(e) = self.headers.set(name, value) {
            tracing::error!(name, "no se pudo agregar header: {}", e);
        }
        self
    }

    /// Establece un body en memoria y su `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Igual que `with_body` pero desde bytes
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        let length = body.len().to_string();
        self.body = Body::Bytes(body);
        self.with_header("Content-Length", &length)
    }

    /// Adjunta un handle de lectura como body
    pub fn attach(&mut self, handle: Attachment) {
        self.body = Body::Attachment(handle);
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn has_attachment(&self) -> bool {
        matches!(self.body, Body::Attachment(_))
    }

    /// Completa protocolo y código faltantes, dejando registro de cada default
    fn fill_defaults(&mut self, default_protocol: &str) {
        if self.protocol.is_none() {
            tracing::warn!(protocol = default_protocol, "response sin protocolo; usando el configurado");
            self.protocol = Some(default_protocol.to_string());
        }
        if self.status.is_none() {
            tracing::warn!("response sin código de estado; usando 200 OK");
            self.status = Some(StatusCode::Ok);
        }
    }

    /// Escribe la respuesta completa en `dst`
    ///
    /// 1. Status line: `<protocol> <status>\r\n`
    /// 2. Headers: `Name: Value\r\n` en orden de inserción
    /// 3. Si hay body: `\r\n` y luego los bytes, o el adjunto copiado con
    ///    `storage.copy_bytes`
    ///
    /// Un error de escritura aborta con el error de I/O; lo ya escrito no se
    /// deshace.
    pub fn write_to<W: Write>(
        &mut self,
        dst: &mut W,
        default_protocol: &str,
        storage: &dyn Storage,
    ) -> io::Result<()> {
        self.fill_defaults(default_protocol);

        let protocol = self.protocol.as_deref().unwrap_or(default_protocol);
        let status = self.status.unwrap_or(StatusCode::Ok);
        write!(dst, "{} {}\r\n", protocol, status)?;

        for header in &self.headers {
            write!(dst, "{}: {}\r\n", header.name(), header.value())?;
        }

        match &mut self.body {
            Body::Empty => {}
            Body::Bytes(bytes) => {
                dst.write_all(b"\r\n")?;
                dst.write_all(bytes)?;
            }
            Body::Attachment(handle) => {
                dst.write_all(b"\r\n")?;
                storage.copy_bytes(&mut **handle, dst)?;
            }
        }

        Ok(())
    }

    /// Serializa la respuesta a bytes (consume el adjunto si lo hay)
    pub fn to_bytes(mut self, default_protocol: &str) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out, default_protocol, &FsStorage)?;
        Ok(out)
    }
}
