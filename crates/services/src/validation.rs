//! Input rules shared by the services.

use crate::dto::FieldErrors;

pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_TEXT_LEN: usize = 50;
pub const MIN_COMMENT_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Checks the title and text of a post being created or edited.
pub fn post_errors(title: &str, text: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();

    let title = title.trim();
    if title.is_empty() {
        errors.title = Some("Title is not set".into());
    } else if title.chars().count() < MIN_TITLE_LEN {
        errors.title = Some("Title is too short".into());
    }

    let text = text.trim();
    if text.is_empty() {
        errors.text = Some("Text is not set".into());
    } else if text.chars().count() < MIN_TEXT_LEN {
        errors.text = Some("Text is too short".into());
    }

    errors
}

pub fn comment_error(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        Some("Comment is not set".into())
    } else if text.chars().count() < MIN_COMMENT_LEN {
        Some("Comment is too short".into())
    } else {
        None
    }
}

pub fn password_error(password: &str) -> Option<String> {
    (password.chars().count() < MIN_PASSWORD_LEN)
        .then(|| format!("Password is shorter than {MIN_PASSWORD_LEN} characters"))
}

pub fn name_error(name: Option<&str>) -> Option<String> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => None,
        _ => Some("Name is invalid".into()),
    }
}

/// A loose shape check; the real proof of ownership is the recovery mail.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    }
}

/// Normalises the tag list of a post: trimmed, lowercased, unique, non-empty.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
