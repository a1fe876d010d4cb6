use std::path::Path;

use report_core::UploadFile;

/// Reads a picked file whole. The media type is guessed from the extension,
/// which is all a browser file picker would report.
pub fn read_upload(path: &Path) -> std::io::Result<UploadFile> {
    let bytes = std::fs::read(path)?;
    let media_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(UploadFile::new(display_name(path), media_type.essence_str(), bytes))
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
