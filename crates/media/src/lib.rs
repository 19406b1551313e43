//! Content store for channel images.
//!
//! Stores opaque blobs on the filesystem under references of the form
//! `<uuid>.<ext>`. Only the image types the rest of the system understands
//! are accepted, and the declared type is checked against the actual bytes
//! before anything touches disk.

pub mod error;
pub mod store;

pub use {
    error::{Error, Result},
    store::{ALLOWED_IMAGE_TYPES, ContentStore, FsContentStore, MAX_CONTENT_SIZE, StoredContent},
};
