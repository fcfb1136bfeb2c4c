use std::path::Path;

use domains::Result;
use tracing::info;

use super::GeneralService;
use crate::dto::{BlogInfo, FieldErrors, Outcome, ResultResponse};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

impl GeneralService {
    pub fn blog_info(&self) -> BlogInfo {
        self.blog.clone()
    }

    /// Stores an image embedded in a post and returns its public path.
    pub async fn upload_image(&self, file_name: &str, data: Vec<u8>) -> Result<Outcome<String>> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let mut errors = FieldErrors::default();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            errors.image = Some("Only jpg and png images are accepted".into());
        } else if data.len() > self.limits.max_image_bytes {
            errors.image = Some(format!(
                "Image is larger than {} KB",
                self.limits.max_image_bytes / 1024
            ));
        }
        if !errors.is_empty() {
            return Ok(Outcome::Rejected(ResultResponse::from_errors(errors)));
        }

        let size = data.len();
        let path = self.media.save_image(data, &extension).await?;
        info!(path = %path, size, "image uploaded");
        Ok(Outcome::Done(path))
    }
}
