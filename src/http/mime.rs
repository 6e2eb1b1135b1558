//! MIME type resolution from the source URL's file extension.

/// Guess the content type of a source image from its URL path.
///
/// Query and fragment are ignored; the extension after the last dot of
/// the final path segment decides. `None` means the type cannot be
/// determined and the request must be rejected as unsupported.
pub fn content_type_for(source_url: &str) -> Option<&'static str> {
    let path = source_url.split(['?', '#']).next().unwrap_or(source_url);
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;

    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        _ => return None,
    };

    Some(mime)
}
