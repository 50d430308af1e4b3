//! Common test utilities

use chrono::{Duration, Utc};
use pulse::models::{BusinessLine, Post};

/// Create a test post with default values
pub fn create_test_post(handle: &str, content: &str) -> Post {
    Post {
        handle: handle.to_string(),
        content: content.to_string(),
        created_at: Some(Utc::now()),
        ..Default::default()
    }
}

/// Create a post with a native identifier
#[allow(dead_code)]
pub fn create_post_with_id(id: &str, handle: &str, content: &str) -> Post {
    Post {
        id: Some(id.to_string()),
        handle: handle.to_string(),
        content: content.to_string(),
        created_at: Some(Utc::now()),
        ..Default::default()
    }
}

/// Create a post with a timestamp offset into the past
#[allow(dead_code)]
pub fn create_post_hours_ago(handle: &str, content: &str, hours: i64) -> Post {
    Post {
        handle: handle.to_string(),
        content: content.to_string(),
        created_at: Some(Utc::now() - Duration::hours(hours)),
        ..Default::default()
    }
}

/// Business line whose members are the given handles
pub fn create_business_line(handles: &[&str]) -> BusinessLine {
    BusinessLine {
        id: "bl-test".to_string(),
        name: "Test Line".to_string(),
        members: handles.iter().map(|h| h.to_string()).collect(),
    }
}
