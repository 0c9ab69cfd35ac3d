//! # Storage
//! src/storage/mod.rs
//!
//! Servicio de filesystem que consulta el motor de decisiones:
//!
//! - `classify`: tipo de archivo (regular, directorio, desconocido) + tamaño
//! - `open`: handle de lectura para adjuntar a la response
//! - `copy_bytes`: copia de un handle a otro (archivo → socket)
//!
//! El trait permite probar el motor con un storage en memoria.

use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

/// Tamaño del buffer de copia archivo → socket
pub const FILE_COPY_BUFFER_SIZE: usize = 8 * 1024;

/// Handle de lectura adjuntado a una response
pub type Attachment = Box<dyn Read + Send>;

/// Tipo de un path en el filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    /// No existe, no se pudo consultar o no es archivo ni directorio
    Unknown,
}

/// Resultado de clasificar un path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: FileKind,
    pub size: u64,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            kind: FileKind::Unknown,
            size: 0,
        }
    }
}

/// Operaciones de filesystem que necesita el servidor
pub trait Storage: Send + Sync {
    /// Clasifica un path; los errores de `stat` se reportan como `Unknown`
    fn classify(&self, path: &str) -> Classification;

    /// Abre un archivo para lectura
    fn open(&self, path: &str) -> io::Result<Attachment>;

    /// Copia todo `src` a `dst`
    fn copy_bytes(&self, src: &mut dyn Read, dst: &mut dyn Write) -> io::Result<u64> {
        copy_bytes(src, dst)
    }
}

/// Copia `src` a `dst` con un buffer fijo
///
/// Reintenta en `Interrupted`; cualquier otro error aborta la copia y se
/// propaga. Retorna el total de bytes copiados.
pub fn copy_bytes<R, W>(src: &mut R, dst: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = [0u8; FILE_COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = match src.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!(copied = total, "copy_bytes read: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = dst.write_all(&buffer[..n]) {
            tracing::error!(copied = total, "copy_bytes write: {}", e);
            return Err(e);
        }
        total += n as u64;
    }
}

/// Storage sobre `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn classify(&self, path: &str) -> Classification {
        match fs::metadata(Path::new(path)) {
            Ok(meta) if meta.is_file() => Classification {
                kind: FileKind::Regular,
                size: meta.len(),
            },
            Ok(meta) if meta.is_dir() => Classification {
                kind: FileKind::Directory,
                size: meta.len(),
            },
            Ok(_) => Classification::unknown(),
            Err(e) => {
                tracing::debug!(path, "stat: {}", e);
                Classification::unknown()
            }
        }
    }

    fn open(&self, path: &str) -> io::Result<Attachment> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "static_server_storage_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writer que falla después de aceptar `limit` bytes
    struct FailingWriter {
        limit: usize,
        written: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written >= self.limit {
                return Err(io::Error::new(ErrorKind::BrokenPipe, "peer closed"));
            }
            let n = buf.len().min(self.limit - self.written);
            self.written += n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_classify_regular_file() {
        let dir = scratch_dir("regular");
        let file = dir.join("index.html");
        fs::write(&file, b"<h1>hi</h1>").unwrap();

        let class = FsStorage.classify(file.to_str().unwrap());
        assert_eq!(class.kind, FileKind::Regular);
        assert_eq!(class.size, 11);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_classify_directory() {
        let dir = scratch_dir("directory");
        let class = FsStorage.classify(dir.to_str().unwrap());
        assert_eq!(class.kind, FileKind::Directory);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_classify_missing_is_unknown() {
        let dir = scratch_dir("missing");
        let class = FsStorage.classify(dir.join("nope.html").to_str().unwrap());
        assert_eq!(class, Classification::unknown());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_and_copy() {
        let dir = scratch_dir("copy");
        let file = dir.join("data.css");
        let content: Vec<u8> = (0..(FILE_COPY_BUFFER_SIZE * 3 + 17)).map(|i| i as u8).collect();
        fs::write(&file, &content).unwrap();

        let mut handle = FsStorage.open(file.to_str().unwrap()).unwrap();
        let mut out = Vec::new();
        let copied = FsStorage.copy_bytes(&mut handle, &mut out).unwrap();

        assert_eq!(copied, content.len() as u64);
        assert_eq!(out, content);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_missing_file() {
        let dir = scratch_dir("open_missing");
        assert!(FsStorage.open(dir.join("x.html").to_str().unwrap()).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_copy_propagates_write_error() {
        let mut src = Cursor::new(vec![7u8; 100]);
        let mut dst = FailingWriter { limit: 10, written: 0 };
        let err = copy_bytes(&mut src, &mut dst).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_copy_empty_source() {
        let mut src = Cursor::new(Vec::<u8>::new());
        let mut out = Vec::new();
        assert_eq!(copy_bytes(&mut src, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
