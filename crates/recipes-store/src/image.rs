//! Recipe images - validation policy and storage in managed directory
//!
//! Images are stored under unique names and addressed by public URL `<url_prefix>/<encoded name>`.

use std::path::PathBuf;

use base64::Engine as _;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use recipes_types::utils::file_ext;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing::{debug, error, info, warn};

use crate::{FileStore, Store as _, ValidPath};

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
const DEFAULT_EXTENSION: &str = "jpg";
const MAX_NAME_CHARS: usize = 50;
const INVALID_NAME_CHARS: &str = r#"<>:"/\|?*"#;
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Same as unreserved characters of RFC 3986, everything else is escaped
const URL_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("No file provided")]
    Empty,
    #[error("File is too large: {0} bytes")]
    TooLarge(usize),
    #[error("Unsupported file extension: {0:?}")]
    UnsupportedExtension(Option<String>),
    #[error("Content type {content_type} is not allowed for .{ext}")]
    ContentTypeMismatch { content_type: String, ext: String },
    #[error("Invalid base64 data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

impl ImageError {
    /// User facing description of image policy
    pub fn policy_message() -> String {
        format!(
            "Invalid image file. Allowed types: {}. Max size: {}MB",
            ALLOWED_EXTENSIONS.join(", "),
            MAX_IMAGE_SIZE / (1024 * 1024)
        )
    }
}

fn content_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn ext_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Uploaded image file as received from client
#[derive(Debug, Clone, Copy)]
pub struct ImageFile<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

impl ImageFile<'_> {
    /// Checks file against image policy, returns normalized extension (lowercase, without dot)
    pub fn validate(&self) -> Result<String, ImageError> {
        if self.data.is_empty() {
            return Err(ImageError::Empty);
        }
        if self.data.len() > MAX_IMAGE_SIZE {
            return Err(ImageError::TooLarge(self.data.len()));
        }
        let ext = file_ext(self.file_name);
        let expected_type = ext
            .as_deref()
            .and_then(content_type_for)
            .ok_or_else(|| ImageError::UnsupportedExtension(ext.clone()))?;
        let ext = ext.unwrap_or_default();
        // aliases like image/jpg are compared by their canonical type
        let supplied_type = ext_for_content_type(self.content_type).and_then(content_type_for);
        if supplied_type != Some(expected_type) {
            return Err(ImageError::ContentTypeMismatch {
                content_type: self.content_type.to_string(),
                ext,
            });
        }
        Ok(ext)
    }
}

/// Image decoded from base64 payload
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// Decodes raw base64 or data URL (`data:image/png;base64,...`)
    ///
    /// Extension is taken from data URL media type, then from file name hint, default is jpg.
    pub fn decode(payload: &str, file_name_hint: Option<&str>) -> Result<Self, ImageError> {
        let (media_type, encoded) = match payload.trim().strip_prefix("data:") {
            Some(rest) => match rest.split_once(',') {
                Some((header, encoded)) => {
                    let media_type = header.split(';').next().filter(|m| !m.is_empty());
                    (media_type, encoded)
                }
                None => (None, rest),
            },
            None => (None, payload),
        };
        let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        if encoded.is_empty() {
            return Err(ImageError::Empty);
        }
        // decoded size is 3/4 of encoded
        if encoded.len() / 4 * 3 > MAX_IMAGE_SIZE + 3 {
            return Err(ImageError::TooLarge(encoded.len() / 4 * 3));
        }
        let data = base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes())?;
        if data.len() > MAX_IMAGE_SIZE {
            return Err(ImageError::TooLarge(data.len()));
        }

        let hint_ext = file_name_hint
            .and_then(file_ext)
            .filter(|ext| content_type_for(ext).is_some());
        let ext = media_type
            .and_then(ext_for_content_type)
            .map(str::to_string)
            .or(hint_ext)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        // unknown media type is kept, so that validation rejects it
        let content_type = match media_type {
            Some(media_type) if ext_for_content_type(media_type).is_none() => media_type.to_string(),
            _ => content_type_for(&ext).unwrap_or("image/jpeg").to_string(),
        };
        let stem = file_name_hint
            .and_then(|name| std::path::Path::new(name).file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("image");

        Ok(DecodedImage {
            file_name: format!("{stem}.{ext}"),
            content_type,
            data,
        })
    }

    pub fn as_file(&self) -> ImageFile<'_> {
        ImageFile {
            file_name: &self.file_name,
            content_type: &self.content_type,
            data: &self.data,
        }
    }
}

/// Cleans original file name for use in stored name
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .filter(|c| !INVALID_NAME_CHARS.contains(*c) && !c.is_control())
        .take(MAX_NAME_CHARS)
        .map(|c| if c == ' ' { '-' } else { c })
        .collect();
    while sanitized.contains("--") {
        sanitized = sanitized.replace("--", "-");
    }
    let sanitized = sanitized.trim_matches('-');
    if sanitized.is_empty() || sanitized.starts_with('.') {
        "image".to_string()
    } else {
        sanitized.to_string()
    }
}

fn unique_file_name(original_name: &str, ext: &str, recipe_id: Option<i64>) -> String {
    let timestamp = OffsetDateTime::now_utc()
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());
    let unique_id = uuid::Uuid::new_v4().simple().to_string();
    let unique_id = &unique_id[..8];
    match recipe_id {
        Some(id) => format!("recipe-{id}-{timestamp}-{unique_id}.{ext}"),
        None => {
            let stem = std::path::Path::new(original_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            format!("{}-{timestamp}-{unique_id}.{ext}", sanitize_name(stem))
        }
    }
}

#[derive(Clone)]
pub struct ImageStore {
    store: FileStore,
    url_prefix: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix: String = url_prefix.into();
        ImageStore {
            store: FileStore::new(root),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.store.root()
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.url_prefix,
            utf8_percent_encode(file_name, URL_NAME_SET)
        )
    }

    /// True if url points into this store
    pub fn is_managed(&self, url: &str) -> bool {
        self.file_name_from_url(url).is_some()
    }

    fn file_name_from_url(&self, url: &str) -> Option<String> {
        let encoded = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        let name = percent_decode_str(encoded).decode_utf8().ok()?;
        if name.is_empty() || name.contains('/') {
            None
        } else {
            Some(name.into_owned())
        }
    }

    /// Validates and stores image, returns its public URL
    ///
    /// Invalid file or storage failure are logged and result in `None`
    pub async fn upload(&self, file: &ImageFile<'_>, recipe_id: Option<i64>) -> Option<String> {
        let ext = match file.validate() {
            Ok(ext) => ext,
            Err(e) => {
                warn!("Invalid image file {}: {e}", file.file_name);
                return None;
            }
        };
        let name = unique_file_name(file.file_name, &ext, recipe_id);
        let path = ValidPath::new(name)
            .inspect_err(|e| error!("Cannot create image path for {}: {e}", file.file_name))
            .ok()?;
        match self.store.store_data(&path, file.data).await {
            Ok(info) => {
                info!(
                    "Image uploaded: {} ({} bytes, sha256 {})",
                    info.final_path.as_ref(),
                    info.size,
                    info.hash
                );
                Some(self.url_for(info.final_path.as_ref()))
            }
            Err(e) => {
                error!("Error uploading image {}: {e}", file.file_name);
                None
            }
        }
    }

    /// Removes image addressed by URL, returns true if file was removed
    pub async fn delete(&self, url: &str) -> bool {
        let Some(name) = self.file_name_from_url(url) else {
            debug!("Image URL {url} is not managed by this store");
            return false;
        };
        let path = match ValidPath::new(name) {
            Ok(path) => path,
            Err(_) => {
                warn!("Invalid image path in URL {url}");
                return false;
            }
        };
        match self.store.delete(&path).await {
            Ok(true) => {
                info!("Image deleted: {url}");
                true
            }
            Ok(false) => {
                warn!("Image not found for deletion: {url}");
                false
            }
            Err(e) => {
                error!("Error deleting image {url}: {e}");
                false
            }
        }
    }

    /// Names of all stored image files
    pub async fn list_files(&self) -> crate::error::StoreResult<Vec<String>> {
        self.store.list().await
    }

    /// URL to file name mapping for managed URLs
    pub fn file_name(&self, url: &str) -> Option<String> {
        self.file_name_from_url(url)
    }
}
