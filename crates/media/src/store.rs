use std::{fs, io::Cursor, path::PathBuf};

use {async_trait::async_trait, image::ImageReader, tracing::debug};

use crate::error::{Error, Result};

/// Image types accepted into the store.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Maximum stored payload: 10 MB.
pub const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024;

/// Bytes plus the content type sniffed back out of them.
#[derive(Debug, Clone)]
pub struct StoredContent {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Storage contract for channel image content.
///
/// References are opaque to callers: they come out of [`store`] and are the
/// only valid inputs to [`open`] and [`delete`].
///
/// [`store`]: ContentStore::store
/// [`open`]: ContentStore::open
/// [`delete`]: ContentStore::delete
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Validate and persist content, returning its reference.
    async fn store(&self, data: &[u8], content_type: &str) -> Result<String>;
    /// Load content by reference.
    async fn open(&self, reference: &str) -> Result<StoredContent>;
    /// Remove content by reference. Deleting a missing reference is Ok.
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Filesystem-backed content store. Files live flat in one directory as
/// `<uuid>.<ext>`.
pub struct FsContentStore {
    base_dir: PathBuf,
}

impl FsContentStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a reference to its path, rejecting anything that is not a
    /// plain filename produced by this store.
    fn path_for(&self, reference: &str) -> Result<PathBuf> {
        if !valid_reference(reference) {
            return Err(Error::invalid_reference(reference));
        }
        Ok(self.base_dir.join(reference))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn store(&self, data: &[u8], content_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(Error::invalid_content("empty content"));
        }
        if data.len() > MAX_CONTENT_SIZE {
            return Err(Error::invalid_content(format!(
                "content exceeds maximum size ({MAX_CONTENT_SIZE} bytes)"
            )));
        }

        let declared = base_type(content_type);
        if !ALLOWED_IMAGE_TYPES.contains(&declared) {
            return Err(Error::unsupported_type(declared));
        }
        match sniffed_type(data) {
            Some(actual) if actual == declared => {},
            _ => return Err(Error::type_mismatch(declared)),
        }

        let ext = extension_for(declared).unwrap_or("img");
        let reference = format!("{}.{ext}", uuid::Uuid::new_v4());
        let path = self.base_dir.join(&reference);
        let dir = self.base_dir.clone();
        let size = data.len();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            fs::create_dir_all(&dir)?;
            fs::write(&path, &data)
        })
        .await
        .map_err(|e| Error::io("store content", std::io::Error::other(e)))?
        .map_err(|e| Error::io("store content", e))?;

        debug!(reference, size, "content stored");
        Ok(reference)
    }

    async fn open(&self, reference: &str) -> Result<StoredContent> {
        let path = self.path_for(reference)?;
        let reference = reference.to_string();

        let data = tokio::task::spawn_blocking(move || fs::read(&path))
            .await
            .map_err(|e| Error::io("open content", std::io::Error::other(e)))?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::not_found(&reference),
                _ => Error::io("open content", e),
            })?;

        Ok(StoredContent {
            content_type: content_type_for(&data).to_string(),
            data,
        })
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let path = self.path_for(reference)?;
        let reference = reference.to_string();

        match tokio::task::spawn_blocking(move || fs::remove_file(&path))
            .await
            .map_err(|e| Error::io("delete content", std::io::Error::other(e)))?
        {
            Ok(()) => {
                debug!(reference, "content deleted");
                Ok(())
            },
            // Idempotent: deleting what is already gone is fine.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io("delete content", e)),
        }
    }
}

/// Strip content-type parameters (`image/png; charset=...` -> `image/png`).
fn base_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// Map an allowed content type to its file extension.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Sniff the actual media type from leading bytes.
fn sniffed_type(data: &[u8]) -> Option<&'static str> {
    let format = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .format()?;
    match format {
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Content type for serving, derived from the stored bytes.
fn content_type_for(data: &[u8]) -> &'static str {
    sniffed_type(data).unwrap_or("application/octet-stream")
}

/// References are single flat filenames: no separators, no leading dot.
fn valid_reference(reference: &str) -> bool {
    !reference.is_empty()
        && !reference.starts_with('.')
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red pixel JPEG
    const TINY_JPEG: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x08, 0x06, 0x06, 0x07, 0x06,
        0x05, 0x08, 0x07, 0x07, 0x07, 0x09, 0x09, 0x08, 0x0A, 0x0C, 0x14, 0x0D, 0x0C, 0x0B, 0x0B,
        0x0C, 0x19, 0x12, 0x13, 0x0F, 0x14, 0x1D, 0x1A, 0x1F, 0x1E, 0x1D, 0x1A, 0x1C, 0x1C, 0x20,
        0x24, 0x2E, 0x27, 0x20, 0x22, 0x2C, 0x23, 0x1C, 0x1C, 0x28, 0x37, 0x29, 0x2C, 0x30, 0x31,
        0x34, 0x34, 0x34, 0x1F, 0x27, 0x39, 0x3D, 0x38, 0x32, 0x3C, 0x2E, 0x33, 0x34, 0x32, 0xFF,
        0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00,
        0x1F, 0x00, 0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
        0xFF, 0xC4, 0x00, 0xB5, 0x10, 0x00, 0x02, 0x01, 0x03, 0x03, 0x02, 0x04, 0x03, 0x05, 0x05,
        0x04, 0x04, 0x00, 0x00, 0x01, 0x7D, 0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21,
        0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08,
        0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A,
        0x16, 0x17, 0x18, 0x19, 0x1A, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37,
        0x38, 0x39, 0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56,
        0x57, 0x58, 0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75,
        0x76, 0x77, 0x78, 0x79, 0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93,
        0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9,
        0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6,
        0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2,
        0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
        0xF8, 0xF9, 0xFA, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, 0xFB, 0xD5,
        0xDB, 0x20, 0xA8, 0xBA, 0xA3, 0xE8, 0xEB, 0xEC, 0x00, 0x3C, 0xF4, 0x76, 0x19, 0xE8, 0x78,
        0xAD, 0x99, 0xA0, 0x19, 0xE0, 0xD0, 0x6A, 0x40, 0x23, 0x9C, 0xD0, 0x07, 0xFF, 0xD9,
    ];

    // 1x1 transparent PNG
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn store() -> (tempfile::TempDir, FsContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("uploads"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_store_and_open_round_trip() {
        let (_dir, store) = store();

        let reference = store.store(TINY_JPEG, "image/jpeg").await.unwrap();
        assert!(reference.ends_with(".jpg"));

        let content = store.open(&reference).await.unwrap();
        assert_eq!(content.data, TINY_JPEG);
        assert_eq!(content.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_png_gets_png_extension() {
        let (_dir, store) = store();

        let reference = store.store(TINY_PNG, "image/png").await.unwrap();
        assert!(reference.ends_with(".png"));
        assert_eq!(
            store.open(&reference).await.unwrap().content_type,
            "image/png"
        );
    }

    #[tokio::test]
    async fn test_content_type_parameters_are_ignored() {
        let (_dir, store) = store();
        let reference = store
            .store(TINY_JPEG, "image/jpeg; charset=binary")
            .await
            .unwrap();
        assert!(reference.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_disallowed_type_is_rejected() {
        let (_dir, store) = store();
        let err = store.store(TINY_JPEG, "image/gif").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
        assert!(err.is_rejected_input());
    }

    #[tokio::test]
    async fn test_declared_type_must_match_bytes() {
        let (_dir, store) = store();

        // JPEG bytes declared as PNG.
        assert!(matches!(
            store.store(TINY_JPEG, "image/png").await,
            Err(Error::TypeMismatch { .. })
        ));
        // Bytes that are no image at all.
        assert!(matches!(
            store.store(b"definitely not an image", "image/png").await,
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.store(&[], "image/png").await,
            Err(Error::InvalidContent { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = store();

        let reference = store.store(TINY_PNG, "image/png").await.unwrap();
        store.delete(&reference).await.unwrap();
        assert!(matches!(
            store.open(&reference).await,
            Err(Error::NotFound { .. })
        ));

        // Second delete is still Ok.
        store.delete(&reference).await.unwrap();
        // As is deleting something that never existed.
        store.delete("0000.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_references_are_rejected() {
        let (_dir, store) = store();

        for bad in ["../../etc/passwd", "a/b.png", ".hidden", "", "a\\b.png"] {
            assert!(
                matches!(store.open(bad).await, Err(Error::InvalidReference { .. })),
                "open accepted {bad:?}"
            );
            assert!(
                matches!(store.delete(bad).await, Err(Error::InvalidReference { .. })),
                "delete accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_allow_list_contents() {
        assert!(ALLOWED_IMAGE_TYPES.contains(&"image/webp"));
        assert!(!ALLOWED_IMAGE_TYPES.contains(&"image/gif"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("text/html"), None);
    }
}
