//! # Módulo HTTP
//!
//! Motor del protocolo HTTP/1.x implementado desde cero:
//!
//! - Colección ordenada de headers
//! - Parsing de requests desde un buffer crudo
//! - Construcción y serialización de responses (incluyendo archivos adjuntos)
//! - Códigos de estado
//!
//! ### Formato de Request
//!
//! ```text
//! GET /tmp/static/index.html HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <h1>hola</h1>
//! ```

pub mod header;
pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use header::{Header, Headers};
pub use request::{Method, ParseError, Request};
pub use response::{Body, Response};
pub use status::StatusCode;
