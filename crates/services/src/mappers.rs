//! Entity → DTO conversions.

use domains::{Author, PostComment, PostSummary, TagUsage, User};

use crate::dto::{AuthUser, CommentView, PostDetail, PostPreview, TagWeight, UserRef, UserWithPhoto};

/// Maximum number of characters of the feed announce.
pub const ANNOUNCE_LEN: usize = 200;

pub fn post_preview(summary: &PostSummary) -> PostPreview {
    let post = &summary.post;
    PostPreview {
        id: post.id,
        timestamp: post.time.timestamp(),
        user: user_ref(&summary.author),
        title: post.title.clone(),
        announce: announce(&post.text),
        like_count: summary.likes,
        dislike_count: summary.dislikes,
        comment_count: summary.comments,
        view_count: post.view_count,
    }
}

pub fn post_detail(summary: &PostSummary, comments: &[PostComment], tags: Vec<String>) -> PostDetail {
    let post = &summary.post;
    PostDetail {
        id: post.id,
        timestamp: post.time.timestamp(),
        active: post.is_active,
        user: user_ref(&summary.author),
        title: post.title.clone(),
        text: post.text.clone(),
        like_count: summary.likes,
        dislike_count: summary.dislikes,
        view_count: post.view_count,
        comments: comments.iter().map(comment).collect(),
        tags,
    }
}

pub fn comment(c: &PostComment) -> CommentView {
    CommentView {
        id: c.id,
        timestamp: c.time.timestamp(),
        text: c.text.clone(),
        user: UserWithPhoto {
            id: c.author.id,
            name: c.author.name.clone(),
            photo: c.author.photo.clone(),
        },
        parent_id: c.parent_id,
    }
}

pub fn auth_user(user: &User, moderation_count: i64) -> AuthUser {
    AuthUser {
        id: user.id,
        name: user.name.clone(),
        photo: user.photo.clone(),
        email: user.email.clone(),
        moderation: user.is_moderator,
        moderation_count: if user.is_moderator { moderation_count } else { 0 },
        settings: user.is_moderator,
    }
}

/// Weight of each tag relative to the number of published posts, rescaled so
/// the most used tag weighs exactly 1.
pub fn tag_weights(usage: &[TagUsage], published_posts: i64) -> Vec<TagWeight> {
    if published_posts <= 0 {
        return Vec::new();
    }
    let total = published_posts as f64;
    let raw: Vec<(String, f64)> = usage
        .iter()
        .filter(|t| t.posts > 0)
        .map(|t| (t.name.clone(), t.posts as f64 / total))
        .collect();
    let max = raw.iter().map(|(_, w)| *w).fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    raw.into_iter()
        .map(|(name, weight)| TagWeight { name, weight: weight / max })
        .collect()
}

fn user_ref(author: &Author) -> UserRef {
    UserRef { id: author.id, name: author.name.clone() }
}

/// Plain-text teaser: markup removed, cut at `ANNOUNCE_LEN` characters.
pub fn announce(text: &str) -> String {
    let plain = strip_tags(text);
    let plain = plain.trim();
    if plain.chars().count() <= ANNOUNCE_LEN {
        return plain.to_string();
    }
    let cut: String = plain.chars().take(ANNOUNCE_LEN).collect();
    format!("{}...", cut.trim_end())
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut chars = html.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' if !in_tag
                && chars.peek().is_some_and(|c| c.is_ascii_alphabetic() || *c == '/' || *c == '!') =>
            {
                in_tag = true
            }
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    let text = html_escape::decode_html_entities(&out);
    // Collapse the whitespace left behind by removed tags.
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
