//! Image upload storage
//!
//! Uploaded recipe images live in a single directory and are referenced from
//! the `recipes` table by their public path (`/uploads/<file>`). Writes and
//! removals are not part of any database transaction; removal is best effort
//! and only logs on failure.

use axum::body::Bytes;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

/// URL prefix under which stored images are served
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Accepted image types (file extension and MIME subtype)
const ALLOWED_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// Prefix of the message returned for uploads over the size limit
pub const IMAGE_TOO_LARGE: &str = "Image exceeds maximum size";

/// Image file received with a create/update request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original client-side file name
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Directory of stored recipe images
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check type and size of an upload, returning its extension (with dot)
    pub fn validate(&self, upload: &ImageUpload) -> ApiResult<String> {
        let extension = Path::new(&upload.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let extension_ok = ALLOWED_TYPES.contains(&extension.to_ascii_lowercase().as_str());
        let mime_ok = upload
            .content_type
            .as_deref()
            .and_then(|ct| ct.strip_prefix("image/"))
            .map(|subtype| {
                let subtype = subtype.to_ascii_lowercase();
                ALLOWED_TYPES.iter().any(|t| subtype.contains(t))
            })
            .unwrap_or(false);

        if !extension_ok || !mime_ok {
            return Err(ApiError::BadRequest(
                "Only image files are allowed (jpeg, jpg, png, gif, webp)".to_string(),
            ));
        }

        if upload.bytes.len() > self.max_bytes {
            return Err(ApiError::BadRequest(format!(
                "{} of {} bytes",
                IMAGE_TOO_LARGE, self.max_bytes
            )));
        }

        Ok(format!(".{}", extension))
    }

    /// Validate and write an upload, returning its public path
    pub async fn save(&self, upload: &ImageUpload) -> ApiResult<String> {
        let extension = self.validate(upload)?;
        let file_name = generate_file_name(&extension);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), &upload.bytes).await?;

        info!(
            file = %file_name,
            bytes = upload.bytes.len(),
            original = %upload.file_name,
            "Stored recipe image"
        );

        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Remove a stored image by public path (best effort)
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            warn!(path = public_path, "Refusing to remove image outside upload directory");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = public_path, "Removed recipe image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = public_path, "Recipe image already absent");
            }
            Err(e) => warn!(path = public_path, error = %e, "Failed to remove recipe image"),
        }
    }

    /// Map a public path to a file inside the upload directory
    ///
    /// Only plain file names directly under [`PUBLIC_PREFIX`] resolve.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path
            .strip_prefix(PUBLIC_PREFIX)?
            .strip_prefix('/')?;

        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return None;
        }

        Some(self.dir.join(name))
    }
}

/// `recipe-<unix millis>-<random 0..1e9><extension>`
pub fn generate_file_name(extension: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "recipe-{}-{}{}",
        recipe_common::time::now_millis(),
        suffix,
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(name: &str, content_type: &str, len: usize) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: Some(content_type.to_string()),
            bytes: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn test_generated_name_keeps_extension() {
        let name = generate_file_name(".png");
        assert!(name.starts_with("recipe-"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.matches('-').count(), 2);
    }

    #[test]
    fn test_validate_accepts_images() {
        let store = ImageStore::new(PathBuf::from("/tmp"), 1024);
        assert_eq!(store.validate(&upload("a.JPG", "image/jpeg", 10)).unwrap(), ".JPG");
        assert_eq!(store.validate(&upload("b.webp", "image/webp", 10)).unwrap(), ".webp");
    }

    #[test]
    fn test_validate_accepts_legacy_image_mime_types() {
        let store = ImageStore::new(PathBuf::from("/tmp"), 1024);
        assert_eq!(store.validate(&upload("a.jpg", "image/pjpeg", 10)).unwrap(), ".jpg");
        assert_eq!(store.validate(&upload("b.png", "image/x-png", 10)).unwrap(), ".png");
        assert!(store.validate(&upload("c.png", "image/svg+xml", 10)).is_err());
    }

    #[test]
    fn test_validate_rejects_other_types() {
        let store = ImageStore::new(PathBuf::from("/tmp"), 1024);
        assert!(store.validate(&upload("notes.txt", "text/plain", 10)).is_err());
        // Extension and MIME type must both match
        assert!(store.validate(&upload("photo.png", "application/octet-stream", 10)).is_err());
        assert!(store.validate(&upload("noext", "image/png", 10)).is_err());
    }

    #[test]
    fn test_validate_rejects_oversize() {
        let store = ImageStore::new(PathBuf::from("/tmp"), 16);
        assert!(store.validate(&upload("a.png", "image/png", 16)).is_ok());
        match store.validate(&upload("a.png", "image/png", 17)) {
            Err(ApiError::BadRequest(msg)) => assert!(msg.starts_with(IMAGE_TOO_LARGE)),
            other => panic!("expected size rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = ImageStore::new(PathBuf::from("/srv/uploads"), 16);
        assert_eq!(
            store.resolve("/uploads/recipe-1-2.png"),
            Some(PathBuf::from("/srv/uploads/recipe-1-2.png"))
        );
        assert_eq!(store.resolve("/uploads/../recipes.db"), None);
        assert_eq!(store.resolve("/uploads/.."), None);
        assert_eq!(store.resolve("/static/a.png"), None);
        assert_eq!(store.resolve("/uploads/"), None);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 1024);

        let public_path = store.save(&upload("cake.gif", "image/gif", 32)).await.unwrap();
        assert!(public_path.starts_with("/uploads/recipe-"));

        let file = store.resolve(&public_path).unwrap();
        assert_eq!(std::fs::read(&file).unwrap().len(), 32);

        store.remove(&public_path).await;
        assert!(!file.exists());

        // Second removal is a logged no-op
        store.remove(&public_path).await;
    }
}
