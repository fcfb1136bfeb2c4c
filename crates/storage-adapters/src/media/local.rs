//! Local filesystem implementation of `MediaStorage`.
//! Files are content-addressed and sharded three directories deep:
//! `<root>/ab/cd/ef/<hash>.<ext>`.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use domains::{DomainError, MediaStorage, Result, UserId};
use image::imageops::FilterType;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

/// Edge of the square profile photo, in pixels.
pub const AVATAR_SIZE: u32 = 36;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./upload")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/upload")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// `ab/cd/ef/<rest of hash>.<ext>` for the given content.
    fn sharded_name(data: &[u8], extension: &str) -> String {
        let hash = hex::encode(Sha256::digest(data));
        format!(
            "{}/{}/{}/{}.{}",
            &hash[0..2],
            &hash[2..4],
            &hash[4..6],
            &hash[6..26],
            extension
        )
    }

    async fn write(&self, relative: &str, data: &[u8]) -> Result<String> {
        let target = self.root_path.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(DomainError::internal)?;
        }
        if fs::try_exists(&target).await.map_err(DomainError::internal)? {
            debug!(path = %target.display(), "upload already stored");
        } else {
            fs::write(&target, data).await.map_err(DomainError::internal)?;
        }
        Ok(format!("{}/{}", self.url_prefix, relative))
    }
}

/// File extension for the stored image, taken from its content. Only JPEG
/// and PNG are kept.
fn image_extension(data: &[u8]) -> Result<&'static str> {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => Ok("jpg"),
        Ok(ImageFormat::Png) => Ok("png"),
        _ => Err(DomainError::Validation("image is not a JPEG or PNG file".into())),
    }
}

/// Centre-crops `data` to a square and scales it to `AVATAR_SIZE`, as PNG.
pub fn avatar_png(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| DomainError::Validation(format!("photo is not a readable image: {e}")))?;

    let side = img.width().min(img.height());
    let x = (img.width() - side) / 2;
    let y = (img.height() - side) / 2;
    let avatar = img
        .crop_imm(x, y, side, side)
        .resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    avatar
        .write_to(&mut out, ImageFormat::Png)
        .map_err(DomainError::internal)?;
    Ok(out.into_inner())
}

#[async_trait]
impl MediaStorage for LocalMediaStore {
    async fn save_image(&self, data: Vec<u8>, extension: &str) -> Result<String> {
        let detected = image_extension(&data)?;
        if !extension.eq_ignore_ascii_case(detected) {
            debug!(declared = %extension, detected, "image extension follows content");
        }
        let relative = Self::sharded_name(&data, detected);
        self.write(&relative, &data).await
    }

    async fn save_avatar(&self, user_id: UserId, data: Vec<u8>) -> Result<String> {
        let png = tokio::task::spawn_blocking(move || avatar_png(&data))
            .await
            .map_err(DomainError::internal)??;
        let relative = format!("avatars/{}", Self::sharded_name(&png, "png"));
        let url = self.write(&relative, &png).await?;
        debug!(user_id, url = %url, "avatar stored");
        Ok(url)
    }
}
