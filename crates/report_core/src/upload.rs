use std::fmt;

use thiserror::Error;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

pub type UploadId = u64;

/// A file the user picked or dropped, read fully into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported media type {media_type:?}; only PDF statements are accepted")]
    NotPdf { media_type: String },
}

/// Accepts PDFs only. Parameters such as `; charset=...` are ignored.
pub fn validate_upload(file: &UploadFile) -> Result<(), ValidationError> {
    let essence = file
        .media_type
        .split(';')
        .next()
        .unwrap_or(file.media_type.as_str())
        .trim();
    if essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE) {
        Ok(())
    } else {
        Err(ValidationError::NotPdf {
            media_type: file.media_type.clone(),
        })
    }
}
