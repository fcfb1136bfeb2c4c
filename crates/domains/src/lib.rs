//! devpub/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions of the blog.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use chrono::{Duration, Utc};

    fn post(status: ModerationStatus, active: bool) -> Post {
        Post {
            id: 1,
            is_active: active,
            moderation_status: status,
            moderator_id: None,
            author_id: 7,
            time: Utc::now() - Duration::hours(1),
            title: "Hello".into(),
            text: "Hello Rust!".into(),
            view_count: 0,
        }
    }

    #[test]
    fn test_published_requires_active_accepted_and_due() {
        let now = Utc::now();
        assert!(post(ModerationStatus::Accepted, true).is_published(now));
        assert!(!post(ModerationStatus::Accepted, false).is_published(now));
        assert!(!post(ModerationStatus::New, true).is_published(now));

        let mut scheduled = post(ModerationStatus::Accepted, true);
        scheduled.time = now + Duration::days(1);
        assert!(!scheduled.is_published(now));
    }

    #[test]
    fn test_query_parsers_fall_back() {
        assert_eq!(PostOrder::from_mode("best"), PostOrder::Best);
        assert_eq!(PostOrder::from_mode("whatever"), PostOrder::Recent);
        assert_eq!(ModerationStatus::from_query("new"), ModerationStatus::New);
        assert_eq!(ModerationStatus::from_query("???"), ModerationStatus::Accepted);
        assert_eq!(MyPostsStatus::from_query("pending"), MyPostsStatus::Pending);
        assert_eq!(MyPostsStatus::from_query(""), MyPostsStatus::Published);
        assert_eq!(Decision::parse("decline"), Some(Decision::Decline));
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[test]
    fn test_page_clamps_window() {
        assert_eq!(Page::new(-5, 0), Page { offset: 0, limit: 1 });
        assert_eq!(Page::new(20, 1000).limit, Page::MAX_LIMIT);
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [ModerationStatus::New, ModerationStatus::Accepted, ModerationStatus::Declined] {
            assert_eq!(status.as_str().parse::<ModerationStatus>().unwrap(), status);
        }
        assert!("PENDING".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn test_settings_codes() {
        let mut settings = GlobalSettings::default();
        settings.set(SettingCode::StatisticsIsPublic, false);
        assert!(!settings.get(SettingCode::StatisticsIsPublic));
        assert_eq!(SettingCode::parse("MULTIUSER_MODE"), Some(SettingCode::MultiuserMode));
        assert!(GlobalSettings::decode("yes"));
        assert_eq!(GlobalSettings::encode(false), "NO");
    }
}
