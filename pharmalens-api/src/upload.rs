/// Upload constraint enforcement and storage
///
/// Uploads are validated before the scan pipeline runs any external
/// call: image extension/MIME allow-list and a size cap (10 MB by
/// default). Accepted files are written to the uploads directory under a
/// generated name and kept there in every outcome, success or failure,
/// so the history page can display them later.

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Accepted image file extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Accepted image MIME types
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// Error type for upload validation
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    /// File extension or MIME type is not an accepted image format
    #[error("Only image files are allowed")]
    NotAnImage,

    /// File exceeds the configured size cap
    #[error("File too large")]
    TooLarge,
}

/// Validates an upload against the image allow-list and size cap
///
/// Returns the lowercased file extension on success.
///
/// # Errors
///
/// Returns `UploadError::NotAnImage` when the extension or MIME type is
/// not allow-listed, `UploadError::TooLarge` when the payload exceeds
/// `max_bytes`.
pub fn validate_image_upload(
    file_name: &str,
    content_type: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<String, UploadError> {
    if size > max_bytes {
        return Err(UploadError::TooLarge);
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(UploadError::NotAnImage)?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::NotAnImage);
    }

    if let Some(mime) = content_type {
        if !ALLOWED_MIME_TYPES.contains(&mime.to_ascii_lowercase().as_str()) {
            return Err(UploadError::NotAnImage);
        }
    }

    Ok(extension)
}

/// Generates a unique stored filename for an accepted upload
pub fn stored_filename(extension: &str) -> String {
    format!("scan-{}.{}", Uuid::new_v4(), extension)
}

/// Writes an upload into the uploads directory, creating it if needed
///
/// Returns the full path of the stored file.
pub async fn store(dir: &Path, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MB: usize = 10 * 1024 * 1024;

    #[test]
    fn test_accepts_allowed_images() {
        for (name, mime) in [
            ("photo.jpg", "image/jpeg"),
            ("photo.JPEG", "image/jpeg"),
            ("box.png", "image/png"),
            ("label.gif", "image/gif"),
        ] {
            let ext = validate_image_upload(name, Some(mime), 1024, TEN_MB)
                .unwrap_or_else(|e| panic!("{} should be accepted: {}", name, e));
            assert!(ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        }
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        assert_eq!(
            validate_image_upload("notes.pdf", Some("application/pdf"), 1024, TEN_MB),
            Err(UploadError::NotAnImage)
        );
        assert_eq!(
            validate_image_upload("script.jpg.exe", Some("image/jpeg"), 1024, TEN_MB),
            Err(UploadError::NotAnImage)
        );
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert_eq!(
            validate_image_upload("noextension", Some("image/jpeg"), 1024, TEN_MB),
            Err(UploadError::NotAnImage)
        );
    }

    #[test]
    fn test_rejects_mismatched_mime() {
        assert_eq!(
            validate_image_upload("photo.jpg", Some("text/html"), 1024, TEN_MB),
            Err(UploadError::NotAnImage)
        );
    }

    #[test]
    fn test_accepts_missing_mime() {
        // Some clients omit the part content type; the extension check
        // still applies.
        assert!(validate_image_upload("photo.jpg", None, 1024, TEN_MB).is_ok());
    }

    #[test]
    fn test_rejects_oversized_file() {
        assert_eq!(
            validate_image_upload("photo.jpg", Some("image/jpeg"), TEN_MB + 1, TEN_MB),
            Err(UploadError::TooLarge)
        );
    }

    #[test]
    fn test_stored_filenames_are_unique() {
        let a = stored_filename("jpg");
        let b = stored_filename("jpg");

        assert_ne!(a, b);
        assert!(a.starts_with("scan-"));
        assert!(a.ends_with(".jpg"));
    }
}
