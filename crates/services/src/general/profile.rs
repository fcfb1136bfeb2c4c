use domains::{PhotoChange, ProfileUpdate, Result, User};
use tracing::info;

use super::GeneralService;
use crate::dto::{FieldErrors, ProfileForm, ResultResponse};
use crate::validation;

impl GeneralService {
    /// Applies a profile edit. A new photo wins over `remove_photo`.
    pub async fn edit_profile(&self, user: &User, form: ProfileForm) -> Result<ResultResponse> {
        let mut errors = FieldErrors::default();

        errors.name = validation::name_error(form.name.as_deref());

        let email = match form.email.as_deref().map(|e| e.trim().to_lowercase()) {
            None => user.email.clone(),
            Some(email) if email == user.email => email,
            Some(email) => {
                if !validation::is_plausible_email(&email) {
                    errors.email = Some("E-mail is invalid".into());
                } else if self
                    .repos
                    .users
                    .find_by_email(&email)
                    .await?
                    .is_some_and(|other| other.id != user.id)
                {
                    errors.email = Some("This e-mail is already registered".into());
                }
                email
            }
        };

        if let Some(password) = form.password.as_deref() {
            errors.password = validation::password_error(password);
        }

        if form.photo.as_ref().is_some_and(|p| p.len() > self.limits.max_photo_bytes) {
            errors.photo = Some(format!(
                "Photo is larger than {} MB",
                self.limits.max_photo_bytes / (1024 * 1024)
            ));
        }

        if !errors.is_empty() {
            return Ok(ResultResponse::from_errors(errors));
        }

        let password_hash = match form.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };
        let photo = match form.photo {
            Some(bytes) => PhotoChange::Set(self.media.save_avatar(user.id, bytes).await?),
            None if form.remove_photo => PhotoChange::Remove,
            None => PhotoChange::Keep,
        };

        let update = ProfileUpdate {
            name: form.name.unwrap_or_default().trim().to_string(),
            email,
            password_hash,
            photo,
        };
        self.repos.users.update_profile(user.id, update).await?;
        info!(user_id = user.id, "profile updated");
        Ok(ResultResponse::ok())
    }
}
