//! Flat file storage for recipe images
//!
//! All files live directly in the store root, so paths are plain file names.
#![allow(async_fn_in_trait)]
use std::str::FromStr;

use error::{StoreError, StoreResult};

pub mod error;
pub mod file_store;
pub mod image;
use tracing::debug;

pub use file_store::FileStore;
pub use image::{DecodedImage, ImageError, ImageFile, ImageStore};

const MAX_NAME_LEN: usize = 255;
const NAME_INVALID_CHARS: &str = r#"/\:"#;

/// File name directly under store root
///
/// Not empty, not hidden (no leading dot, which also excludes `.` and `..`),
/// without separators or control characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPath(String);

impl ValidPath {
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.len() > MAX_NAME_LEN
            || name
                .chars()
                .any(|c| NAME_INVALID_CHARS.contains(c) || c.is_control());
        if invalid {
            debug!("Invalid file name: {name:?}");
            return Err(StoreError::InvalidPath);
        }
        Ok(ValidPath(name))
    }
}

impl FromStr for ValidPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValidPath::new(s)
    }
}

impl AsRef<str> for ValidPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ValidPath> for String {
    fn from(value: ValidPath) -> Self {
        value.0
    }
}

#[derive(Debug)]
pub struct StoreInfo {
    /// name under which the file is stored, differs from requested one on name clash
    pub final_path: ValidPath,
    pub size: u64,
    /// SHA256 hash
    pub hash: String,
}

pub trait Store {
    async fn store_data(&self, path: &ValidPath, data: &[u8]) -> StoreResult<StoreInfo>;
    /// Removes file, returns false if there was no such file
    async fn delete(&self, path: &ValidPath) -> StoreResult<bool>;
    /// Names of regular files directly in store root
    async fn list(&self) -> StoreResult<Vec<String>>;
}
