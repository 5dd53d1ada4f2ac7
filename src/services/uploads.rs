use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Image extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Subdirectory for patient profile photos.
pub const PHOTOS_DIR: &str = "photos";

const SUBDIRS: [&str; 3] = ["anamneses", "fichas", PHOTOS_DIR];

/// Stores uploaded images under a root directory served at `/uploads`.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root and its image subdirectories
    pub async fn init(&self) -> Result<()> {
        for subdir in SUBDIRS {
            let dir = self.root.join(subdir);
            fs::create_dir_all(&dir).await.map_err(|e| {
                Error::Internal(format!("Failed to create upload directory {:?}: {}", dir, e))
            })?;
        }
        Ok(())
    }

    /// Saves an uploaded image and returns its path relative to the root
    /// (`<subdir>/<stem>_<8 hex>.<ext>`).
    ///
    /// Returns `Ok(None)` when there is nothing to store: no file name, an
    /// empty body, or an extension outside [`ALLOWED_EXTENSIONS`].
    pub async fn save_image(&self, subdir: &str, file_name: Option<&str>, content: &[u8]) -> Result<Option<String>> {
        let Some(file_name) = file_name.map(str::trim).filter(|name| !name.is_empty()) else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }

        let Some((stem, extension)) = split_image_name(file_name) else {
            tracing::debug!(file_name, "rejected upload with unsupported extension");
            return Ok(None);
        };

        let subdir = sanitize(subdir);
        let suffix = hex::encode(rand::random::<[u8; 4]>());
        let relative = format!("{}/{}_{}.{}", subdir, stem, suffix, extension);

        let dir = self.root.join(&subdir);
        fs::create_dir_all(&dir).await?;
        fs::write(self.root.join(&relative), content).await?;

        tracing::debug!(path = %relative, bytes = content.len(), "stored upload");
        Ok(Some(relative))
    }

    /// Deletes a file previously returned by [`save_image`](Self::save_image).
    /// A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<()> {
        if relative.split(['/', '\\']).any(|part| part == "..") {
            return Err(Error::Internal(format!("Refusing to remove {:?}", relative)));
        }

        match fs::remove_file(self.root.join(relative)).await {
            Ok(()) => {
                tracing::debug!(path = %relative, "removed upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Splits a client file name into a sanitized stem and a lower-cased
/// allowed extension.
fn split_image_name(file_name: &str) -> Option<(String, String)> {
    // Browsers may send a full client path.
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, extension) = base.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    Some((sanitize(stem), extension))
}

/// Keeps ASCII letters, digits, `-` and `_`; anything else becomes `_`.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .take(64)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
