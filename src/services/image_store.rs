use std::path::{Component, Path, PathBuf};

use actix_multipart::Multipart;
use futures_util::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
const PUBLIC_PREFIX: &str = "/uploads/";
const PRODUCT_DIR: &str = "products";
const IMAGE_FIELD: &str = "image";

/// Lowercased extension of `filename` if it is an accepted image type.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Copies `chunks` into a new file at `path`, at most `limit` bytes. The file
/// is removed again if any step fails.
async fn write_capped<S, B, E>(path: &Path, chunks: S, limit: usize) -> AppResult<usize>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let result = copy_chunks(path, chunks, limit).await;
    if result.is_err() {
        let _ = fs::remove_file(path).await;
    }
    result
}

async fn copy_chunks<S, B, E>(path: &Path, chunks: S, limit: usize) -> AppResult<usize>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut file = fs::File::create(path).await?;
    let mut written = 0usize;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk
            .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {e}")))?;
        let chunk = chunk.as_ref();
        written += chunk.len();
        if written > limit {
            return Err(AppError::ValidationError(format!(
                "Image exceeds the {limit} byte limit"
            )));
        }
        file.write_all(chunk).await?;
    }
    file.flush().await?;
    Ok(written)
}

/// Writes product images below the upload directory, which is served
/// statically under `/uploads`.
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_file_size: usize,
}

impl ImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            max_file_size: config.max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Streams the `image` field of a multipart body to disk and returns its
    /// public path.
    pub async fn save_product_image(&self, mut payload: Multipart) -> AppResult<String> {
        while let Some(item) = payload.next().await {
            let field = item.map_err(|e| {
                AppError::ValidationError(format!("Invalid multipart payload: {e}"))
            })?;

            let disposition = field.content_disposition();
            if disposition.get_name() != Some(IMAGE_FIELD) {
                continue;
            }
            let ext = disposition
                .get_filename()
                .and_then(allowed_extension)
                .ok_or_else(|| {
                    AppError::ValidationError(
                        "Only .jpg, .jpeg, .png and .gif images are allowed".to_string(),
                    )
                })?;

            let dir = self.root.join(PRODUCT_DIR);
            fs::create_dir_all(&dir).await?;
            let file_name = format!("{}.{ext}", uuid::Uuid::new_v4());
            let path = dir.join(&file_name);

            let written = write_capped(&path, field, self.max_file_size).await?;

            log::info!("Stored product image {file_name} ({written} bytes)");
            return Ok(format!("{PUBLIC_PREFIX}{PRODUCT_DIR}/{file_name}"));
        }

        Err(AppError::ValidationError(
            "Multipart field 'image' is required".to_string(),
        ))
    }

    /// Maps a public `/uploads/...` path back to a file under the upload
    /// directory. Anything that could escape it yields `None`.
    pub fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let relative = Path::new(public_path.strip_prefix(PUBLIC_PREFIX)?);
        let mut components = relative.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Best effort: a missing file is not an error.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.local_path(public_path) else {
            return;
        };
        if let Err(e) = fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove image {}: {e}", path.display());
        }
    }
}
