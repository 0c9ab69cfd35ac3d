//! # Headers HTTP
//! src/http/header.rs
//!
//! Un `Header` es un par nombre/valor inmutable; `Headers` es la colección
//! ordenada que usan tanto el request como la response.
//!
//! ## Reglas
//!
//! - Se conserva el orden de inserción (la response los escribe en ese orden)
//! - La búsqueda por nombre es lineal, sensible a mayúsculas, primer match
//! - Cuando la colección se llena crece ~1.25x; `compact()` la ajusta al tamaño exacto

use crate::error::HttpError;

/// Factor de crecimiento de la colección cuando se llena
const GROWTH_FACTOR: f64 = 1.25;

/// Capacidad inicial típica (pocos headers por request)
pub const AVERAGE_HEADERS_COUNT: usize = 8;

/// Un header `Name: Value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Construye un header explícitamente
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parsea una línea cruda `"Name: Value"`
    ///
    /// Se separa en el primer `": "`. Retorna `None` si no existe el
    /// separador o si no hay contenido después de él.
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::Header;
    ///
    /// let header = Header::parse("Host: localhost:8080").unwrap();
    /// assert_eq!(header.name(), "Host");
    /// assert_eq!(header.value(), "localhost:8080");
    /// assert!(Header::parse("Host:").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, value) = raw.split_once(": ")?;
        if value.is_empty() {
            return None;
        }
        Some(Self::new(name, value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Colección ordenada de headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    /// Crea una colección vacía con la capacidad típica
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(AVERAGE_HEADERS_COUNT),
        }
    }

    /// Crea una colección vacía con capacidad exacta
    pub fn with_capacity(capacity: usize) -> Result<Self, HttpError> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|e| HttpError::InternalFailure(format!("headers allocation: {}", e)))?;
        Ok(Self { entries })
    }

    /// Agrega un header al final
    ///
    /// Si la colección está llena crece por el factor de expansión. Un fallo
    /// de memoria se reporta al caller en vez de abortar.
    pub fn append(&mut self, header: Header) -> Result<(), HttpError> {
        if self.entries.len() == self.entries.capacity() {
            self.expand()?;
        }
        self.entries.push(header);
        Ok(())
    }

    /// Construye y agrega un header a partir de nombre y valor
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), HttpError> {
        self.append(Header::new(name, value))
    }

    fn expand(&mut self) -> Result<(), HttpError> {
        let capacity = self.entries.capacity();
        let target = ((capacity as f64) * GROWTH_FACTOR) as usize;
        let additional = target.saturating_sub(capacity).max(1);
        self.entries.try_reserve_exact(additional).map_err(|e| {
            tracing::error!(capacity, additional, "no se pudo expandir headers: {}", e);
            HttpError::InternalFailure(format!("headers expansion: {}", e))
        })
    }

    /// Ajusta la capacidad al número exacto de headers
    pub fn compact(&mut self) {
        self.entries.shrink_to_fit();
    }

    /// Busca el valor del primer header con ese nombre (sensible a mayúsculas)
    pub fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    /// Verifica si existe un header con ese nombre
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Header en la posición `index` (orden de inserción)
    pub fn get(&self, index: usize) -> Option<&Header> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.entries.iter()
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let header = Header::parse("Content-Type: text/html").unwrap();
        assert_eq!(header.name(), "Content-Type");
        assert_eq!(header.value(), "text/html");
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let header = Header::parse("X-Note: a: b").unwrap();
        assert_eq!(header.name(), "X-Note");
        assert_eq!(header.value(), "a: b");
    }

    #[test]
    fn test_parse_invalid_header() {
        assert!(Header::parse("NoSeparator").is_none());
        assert!(Header::parse("Host:localhost").is_none());
        assert!(Header::parse("Host: ").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Header::new("Host", "x").to_string(), "Host: x");
    }

    #[test]
    fn test_insertion_order() {
        let mut headers = Headers::new();
        headers.set("B", "2").unwrap();
        headers.set("A", "1").unwrap();
        headers.set("C", "3").unwrap();

        let names: Vec<&str> = headers.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_find_first_match_case_sensitive() {
        let mut headers = Headers::new();
        headers.set("Accept", "first").unwrap();
        headers.set("Accept", "second").unwrap();

        assert_eq!(headers.find("Accept"), Some("first"));
        assert_eq!(headers.find("accept"), None);
        assert!(!headers.contains("Missing"));
    }

    #[test]
    fn test_growth_keeps_size_within_capacity() {
        let mut headers = Headers::with_capacity(1).unwrap();
        for i in 0..50 {
            headers.set(&format!("X-{}", i), "v").unwrap();
            assert!(headers.len() <= headers.capacity());
        }
        assert_eq!(headers.len(), 50);
        assert_eq!(headers.get(49).unwrap().name(), "X-49");
        assert!(headers.get(50).is_none());
    }

    #[test]
    fn test_growth_from_zero_capacity() {
        let mut headers = Headers::with_capacity(0).unwrap();
        headers.set("A", "1").unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_compact() {
        let mut headers = Headers::with_capacity(32).unwrap();
        headers.set("A", "1").unwrap();
        headers.set("B", "2").unwrap();
        headers.compact();
        assert_eq!(headers.len(), 2);
        assert!(headers.capacity() >= 2);
        assert!(headers.capacity() < 32);
    }
}
