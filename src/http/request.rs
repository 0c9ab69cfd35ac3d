//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Parser de requests desde cero sobre un buffer crudo.
//!
//! ## Formato aceptado
//!
//! ```text
//! GET /tmp/static/index.html HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! \r\n
//! ```
//!
//! ## Reglas
//!
//! 1. Se separa en líneas por `\r\n`; las líneas vacías se descartan
//! 2. Línea 0: `METHOD SP PATH SP PROTOCOL`
//! 3. Líneas `[1, n-1)`: headers `Name: Value`
//! 4. Última línea: body si hay `Content-Type` y `Content-Length`, si no es
//!    un header más. Por eso el body debe ir en una sola línea.

use super::header::{Header, Headers};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Métodos HTTP reconocidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    /// Todos los métodos, en el orden de su definición
    pub const ALL: [Method; 9] = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::CONNECT,
        Method::OPTIONS,
        Method::TRACE,
        Method::PATCH,
    ];

    /// Convierte el método a su token textual
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = ParseError;

    /// Match exacto y sensible a mayúsculas contra los nueve tokens
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseError::UnknownMethod(s.to_string()))
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// El buffer no tiene ninguna línea
    #[error("empty request")]
    Empty,

    /// El buffer no es UTF-8 válido
    #[error("request is not valid UTF-8")]
    NotUtf8,

    /// Falta alguno de los separadores de la request line
    #[error("invalid request line: {0}")]
    InvalidRequestLine(String),

    /// Token de método fuera de los nueve definidos
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// Línea de header sin `": "` o sin valor
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// La colección de headers no pudo crecer
    #[error("headers allocation failed")]
    OutOfMemory,
}

/// Request HTTP ya parseado; inmutable después de construirse
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    protocol: String,
    headers: Headers,
    body: Option<Vec<u8>>,
    /// Momento de llegada, tomado antes de empezar a parsear
    arrived: Instant,
}

impl Request {
    /// Parsea un request desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_server::http::{Method, Request};
    ///
    /// let raw = b"GET /tmp/static/index.html HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.path(), "/tmp/static/index.html");
    /// assert_eq!(request.header("Host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let arrived = Instant::now();

        let raw = std::str::from_utf8(buffer).map_err(|_| ParseError::NotUtf8)?;

        let lines: Vec<&str> = raw.split("\r\n").filter(|line| !line.is_empty()).collect();
        let Some((first, rest)) = lines.split_first() else {
            return Err(ParseError::Empty);
        };

        let (method, path, protocol) = Self::parse_request_line(first)?;

        let mut headers = Headers::new();
        let mut body = None;

        if let Some((last, header_lines)) = rest.split_last() {
            for line in header_lines {
                Self::append_header(&mut headers, line)?;
            }

            if headers.contains("Content-Type") && headers.contains("Content-Length") {
                body = Some(last.as_bytes().to_vec());
            } else {
                Self::append_header(&mut headers, last)?;
            }
        }

        Ok(Request {
            method,
            path,
            protocol,
            headers,
            body,
            arrived,
        })
    }

    /// Parsea `METHOD SP PATH SP PROTOCOL`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let (method, rest) = line
            .split_once(' ')
            .ok_or_else(|| ParseError::InvalidRequestLine(line.to_string()))?;
        let method: Method = method.parse()?;

        let (path, protocol) = rest
            .split_once(' ')
            .ok_or_else(|| ParseError::InvalidRequestLine(line.to_string()))?;

        if path.is_empty() || protocol.is_empty() {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        }

        Ok((method, path.to_string(), protocol.to_string()))
    }

    fn append_header(headers: &mut Headers, line: &str) -> Result<(), ParseError> {
        let header =
            Header::parse(line).ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
        headers.append(header).map_err(|_| ParseError::OutOfMemory)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Versión de protocolo tal cual llegó (ej: "HTTP/1.1")
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Primer header con ese nombre
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.find(name)
    }

    /// Body de una sola línea, si el request declaró uno
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn arrived(&self) -> Instant {
        self.arrived
    }

    /// Tiempo transcurrido desde la llegada del request
    pub fn processing_duration(&self) -> Duration {
        self.arrived.elapsed()
    }
}
