//! Tabla fija sufijo → tipo MIME.

/// Tipo de contenido para el sufijo del path, o `None` si es desconocido
///
/// # Ejemplo
/// ```
/// use static_server::router::mime::content_type_for;
///
/// assert_eq!(content_type_for("/tmp/static/index.html"), Some("text/html"));
/// assert_eq!(content_type_for("/tmp/static/file.unknownext"), None);
/// ```
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, suffix) = file_name.rsplit_once('.')?;

    match suffix {
        "html" => Some("text/html"),
        "css" => Some("text/css"),
        "js" => Some("text/javascript"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "swf" | "mp4" => Some("application/x-shockwave-flash"),
        _ => None,
    }
}
