//! Insight generation orchestrator
//!
//! Ties the collaborators together: fetch posts for a business line,
//! analyze them (LLM-enriched when possible, frequency-based otherwise),
//! and assemble the relationship graph. Any enrichment failure degrades to
//! the deterministic path; only post-store failures surface to callers.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analyzer::{fallback, TextAnalyzer};
use crate::config::ProviderConfig;
use crate::error::Result;
use crate::graph::build_graph;
use crate::llm::{LlmClient, TextCompletion};
use crate::models::{BusinessLine, InsightsResult, MemberContext, Post, Snapshot};
use crate::store::{MemberDirectory, PostStore};

/// Fetch cap for rolling live windows.
pub const LIVE_FETCH_LIMIT: usize = 500;
/// Fetch cap for explicit historical ranges.
pub const RANGE_FETCH_LIMIT: usize = 5000;

/// Time window an analysis run covers.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisWindow {
    /// Rolling window ending now.
    LastHours(i64),
    /// Explicit historical range, inclusive on both ends.
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl AnalysisWindow {
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            Self::LastHours(hours) => (Some(Utc::now() - Duration::hours(*hours)), None),
            Self::Range { start, end } => (Some(*start), Some(*end)),
        }
    }

    pub fn fetch_limit(&self) -> usize {
        match self {
            Self::LastHours(_) => LIVE_FETCH_LIMIT,
            Self::Range { .. } => RANGE_FETCH_LIMIT,
        }
    }
}

/// End-to-end insight generation for business lines.
pub struct InsightsPipeline {
    posts: Arc<dyn PostStore>,
    members: Arc<dyn MemberDirectory>,
    provider: ProviderConfig,
    completion: Option<Arc<dyn TextCompletion>>,
}

impl InsightsPipeline {
    pub fn new(
        posts: Arc<dyn PostStore>,
        members: Arc<dyn MemberDirectory>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            posts,
            members,
            provider,
            completion: None,
        }
    }

    /// Use a caller-supplied completion backend instead of constructing a
    /// gateway client from the provider config.
    pub fn with_completion(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Generate insights for a business line over the given window.
    ///
    /// Post-store errors propagate. A member-directory failure degrades to
    /// an empty context, and an empty window yields an empty result.
    pub async fn generate_insights(
        &self,
        line: &BusinessLine,
        window: &AnalysisWindow,
        enrichment: bool,
    ) -> Result<InsightsResult> {
        let posts = self.fetch_window(line, window).await?;
        if posts.is_empty() {
            info!(line = %line.name, "no posts in window, returning empty result");
            return Ok(InsightsResult::empty());
        }
        let members = self.member_context(line).await;
        Ok(self
            .generate_insights_for_posts(&posts, &members, enrichment)
            .await)
    }

    /// Generate insights and wrap them in a persistable snapshot.
    pub async fn generate_snapshot(
        &self,
        line: &BusinessLine,
        window: &AnalysisWindow,
        enrichment: bool,
    ) -> Result<Snapshot> {
        let posts = self.fetch_window(line, window).await?;
        let members = self.member_context(line).await;
        let result = self
            .generate_insights_for_posts(&posts, &members, enrichment)
            .await;
        Ok(Snapshot::new(line, Utc::now(), result)
            .with_summary(format!("{} posts analyzed", posts.len())))
    }

    /// Analyze an already-fetched post set. Never fails: enrichment
    /// problems fall back to the frequency-based path.
    pub async fn generate_insights_for_posts(
        &self,
        posts: &[Post],
        members: &MemberContext,
        enrichment: bool,
    ) -> InsightsResult {
        if posts.is_empty() {
            return InsightsResult::empty();
        }

        if enrichment {
            match self.enriched(posts, members).await {
                Ok(result) => return result,
                Err(err) => {
                    warn!(
                        error = %err,
                        category = ?err.category(),
                        "enrichment unavailable, using frequency analysis"
                    );
                }
            }
        }

        self.deterministic(posts)
    }

    async fn fetch_window(
        &self,
        line: &BusinessLine,
        window: &AnalysisWindow,
    ) -> Result<Vec<Post>> {
        let (start, end) = window.bounds();
        let (total, posts) = self
            .posts
            .fetch_posts(&line.members, start, end, 0, window.fetch_limit())
            .await?;
        debug!(
            line = %line.name,
            total,
            fetched = posts.len(),
            "fetched posts for analysis window"
        );
        Ok(posts)
    }

    async fn member_context(&self, line: &BusinessLine) -> MemberContext {
        match self.members.member_descriptions(&line.id).await {
            Ok(context) => context,
            Err(err) => {
                warn!(error = %err, line = %line.name, "member directory unavailable");
                MemberContext::new()
            }
        }
    }

    async fn enriched(&self, posts: &[Post], members: &MemberContext) -> Result<InsightsResult> {
        let client;
        let completion: &dyn TextCompletion = match &self.completion {
            Some(shared) => shared.as_ref(),
            None => {
                client = LlmClient::new(self.provider.clone())?;
                &client
            }
        };

        let analyzer = TextAnalyzer::new(completion);
        let topics = analyzer.analyze_topics(posts, members).await;
        let analysis = analyzer.analyze_key_persons(posts, members).await;
        Ok(build_graph(topics, analysis, posts))
    }

    fn deterministic(&self, posts: &[Post]) -> InsightsResult {
        let (topics, analysis) = fallback::frequency_analysis(posts);
        build_graph(topics, analysis, posts)
    }
}
