//! External collaborator interfaces
//!
//! The pipeline consumes posts, member descriptions, and snapshot
//! persistence through trait seams so business logic stays decoupled from
//! any particular backing store. In-memory implementations back the CLI and
//! tests; production deployments supply their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::{MemberContext, Post, Snapshot};

/// Read access to the raw post document store.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fetch posts authored by any of `handles`, optionally bounded by a
    /// time range, ordered newest-first. Returns the total matching count
    /// alongside the requested page. A `limit` of 0 means unbounded.
    async fn fetch_posts(
        &self,
        handles: &[String],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        skip: usize,
        limit: usize,
    ) -> Result<(u64, Vec<Post>)>;
}

/// Access to business-line member metadata.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Mapping from member handle to free-text description for one
    /// business line.
    async fn member_descriptions(&self, business_line_id: &str) -> Result<MemberContext>;
}

/// Filters for snapshot listing.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    pub business_line_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub public_only: bool,
    /// 0 means no limit
    pub limit: usize,
}

/// Persistence for analysis snapshots. Each write is a single atomic
/// insert; the pipeline core never mutates stored snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn insert(&self, snapshot: Snapshot) -> Result<Snapshot>;

    async fn get(&self, id: &str) -> Result<Snapshot>;

    async fn list(&self, filter: &SnapshotFilter) -> Result<Vec<Snapshot>>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory post store
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostStore {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn fetch_posts(
        &self,
        handles: &[String],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        skip: usize,
        limit: usize,
    ) -> Result<(u64, Vec<Post>)> {
        let posts = self
            .posts
            .read()
            .map_err(|_| Error::store("post store lock poisoned"))?;

        let mut matched: Vec<Post> = posts
            .iter()
            .filter(|post| handles.contains(&post.handle))
            .filter(|post| match (post.created_at, start) {
                (Some(at), Some(start)) => at >= start,
                _ => true,
            })
            .filter(|post| match (post.created_at, end) {
                (Some(at), Some(end)) => at <= end,
                _ => true,
            })
            .cloned()
            .collect();

        // newest first
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let page: Vec<Post> = if limit == 0 {
            matched.into_iter().skip(skip).collect()
        } else {
            matched.into_iter().skip(skip).take(limit).collect()
        };

        Ok((total, page))
    }
}

/// In-memory member directory keyed by business-line id
#[derive(Debug, Default)]
pub struct MemoryMemberDirectory {
    descriptions: HashMap<String, MemberContext>,
}

impl MemoryMemberDirectory {
    pub fn new(descriptions: HashMap<String, MemberContext>) -> Self {
        Self { descriptions }
    }
}

#[async_trait]
impl MemberDirectory for MemoryMemberDirectory {
    async fn member_descriptions(&self, business_line_id: &str) -> Result<MemberContext> {
        Ok(self
            .descriptions
            .get(business_line_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory snapshot store
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn insert(&self, snapshot: Snapshot) -> Result<Snapshot> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| Error::store("snapshot store lock poisoned"))?;
        snapshots.insert(snapshot.id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    async fn get(&self, id: &str) -> Result<Snapshot> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| Error::store("snapshot store lock poisoned"))?;
        snapshots
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("snapshot {id}")))
    }

    async fn list(&self, filter: &SnapshotFilter) -> Result<Vec<Snapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| Error::store("snapshot store lock poisoned"))?;

        let mut matched: Vec<Snapshot> = snapshots
            .values()
            .filter(|s| {
                filter
                    .business_line_id
                    .as_ref()
                    .map_or(true, |id| &s.business_line_id == id)
            })
            .filter(|s| filter.start.map_or(true, |start| s.analysis_date >= start))
            .filter(|s| filter.end.map_or(true, |end| s.analysis_date <= end))
            .filter(|s| !filter.public_only || s.is_public)
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.analysis_date.cmp(&a.analysis_date));
        if filter.limit > 0 {
            matched.truncate(filter.limit);
        }
        Ok(matched)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| Error::store("snapshot store lock poisoned"))?;
        snapshots
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("snapshot {id}")))
    }
}
