//! pulse - Social media insights for business lines
//!
//! Turns a window of social media posts into topic summaries and a
//! validated relationship graph, using an LLM provider for enrichment with
//! a deterministic frequency-based fallback.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`llm`] - Provider gateway for text completion
//! - [`analyzer`] - Topic and key-person extraction with fallback
//! - [`graph`] - Relationship graph assembly and validation
//! - [`pipeline`] - End-to-end insight generation
//! - [`store`] - Post, member, and snapshot store interfaces
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pulse::config::Config;
//! use pulse::pipeline::{AnalysisWindow, InsightsPipeline};
//! use pulse::store::{MemoryMemberDirectory, MemoryPostStore};
//! use pulse::models::BusinessLine;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pipeline = InsightsPipeline::new(
//!     Arc::new(MemoryPostStore::default()),
//!     Arc::new(MemoryMemberDirectory::default()),
//!     config.provider,
//! );
//! let line = BusinessLine {
//!     id: "bl1".to_string(),
//!     name: "Platform".to_string(),
//!     members: vec!["alice".to_string()],
//! };
//! let result = pipeline
//!     .generate_insights(&line, &AnalysisWindow::LastHours(24), true)
//!     .await?;
//! println!("{} topics", result.topics.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::graph::build_graph;
    pub use crate::models::{
        BusinessLine, GraphEdge, GraphNode, InsightsResult, NodeId, Post, Snapshot, TopicSummary,
    };
    pub use crate::pipeline::{AnalysisWindow, InsightsPipeline};
    pub use crate::store::{MemberDirectory, PostStore, SnapshotStore};
}

// Direct re-exports for convenience
pub use models::{InsightsResult, Post};
