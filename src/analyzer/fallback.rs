//! Deterministic fallback analysis
//!
//! Pure frequency counting over post content and authorship, used when the
//! text-completion provider is disabled or fails. No external calls; the
//! same input posts always yield the same counts and derived weights.

use std::collections::HashMap;

use crate::models::{Post, TopicSummary};

use super::{KeyPerson, KeyPersonAnalysis};

/// Number of hashtag topics the fallback reports
pub const TOPIC_LIMIT: usize = 5;

/// Number of pseudo key persons the fallback reports
pub const KEY_PERSON_LIMIT: usize = 10;

const FALLBACK_ROLE: &str = "Active contributor";

/// Count whitespace-delimited tokens beginning with `#`, case-folded.
fn hashtag_counts(posts: &[Post]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for post in posts {
        for token in post.content.split_whitespace() {
            if token.starts_with('#') && token.len() > 1 {
                *counts.entry(token.to_lowercase()).or_default() += 1;
            }
        }
    }
    counts
}

/// Count posts per author handle.
fn author_counts(posts: &[Post]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for post in posts {
        *counts.entry(post.handle.clone()).or_default() += 1;
    }
    counts
}

/// Highest counts first; ties broken lexicographically so output order is
/// stable across runs.
fn ranked(counts: HashMap<String, u32>) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Per-operation topic fallback: top hashtags with scores normalized into
/// [0, 1]. Substitutes for the topic analysis operation when the provider
/// call or response parse fails.
pub fn topics(posts: &[Post]) -> Vec<TopicSummary> {
    ranked(hashtag_counts(posts))
        .into_iter()
        .take(TOPIC_LIMIT)
        .map(|(tag, count)| TopicSummary {
            topic: tag.clone(),
            summary: tag,
            score: (f64::from(count) / 10.0).min(1.0),
            sentiment: None,
            related_post_ids: Vec::new(),
            related_handles: Vec::new(),
        })
        .collect()
}

/// Per-operation key-person fallback: most frequent authors with importance
/// normalized into [0, 1] and no relationships.
pub fn key_persons(posts: &[Post]) -> KeyPersonAnalysis {
    let key_persons = ranked(author_counts(posts))
        .into_iter()
        .take(KEY_PERSON_LIMIT)
        .map(|(handle, count)| KeyPerson {
            handle,
            role: FALLBACK_ROLE.to_string(),
            importance: (f64::from(count) / 20.0).min(1.0),
        })
        .collect();

    KeyPersonAnalysis {
        key_persons,
        relationships: Vec::new(),
    }
}

/// Whole-pipeline frequency analysis, used on the orchestrator's
/// deterministic path. Topic scores and author weights are raw counts;
/// every author becomes a node so that the graph builder's co-occurrence
/// pass can attach topic edges weighted by min(count/5, 1).
pub fn frequency_analysis(posts: &[Post]) -> (Vec<TopicSummary>, KeyPersonAnalysis) {
    let topics = ranked(hashtag_counts(posts))
        .into_iter()
        .take(TOPIC_LIMIT)
        .map(|(tag, count)| TopicSummary {
            topic: tag.clone(),
            summary: tag,
            score: f64::from(count),
            sentiment: None,
            related_post_ids: Vec::new(),
            related_handles: Vec::new(),
        })
        .collect();

    let key_persons = ranked(author_counts(posts))
        .into_iter()
        .map(|(handle, count)| KeyPerson {
            handle,
            role: FALLBACK_ROLE.to_string(),
            importance: f64::from(count),
        })
        .collect();

    (
        topics,
        KeyPersonAnalysis {
            key_persons,
            relationships: Vec::new(),
        },
    )
}
