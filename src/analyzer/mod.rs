//! LLM-backed text analysis
//!
//! Two analysis operations run against the provider gateway: topic
//! extraction and key-person/relationship extraction. Both follow the same
//! protocol: render the post window into prompt lines, call the provider at
//! a fixed temperature, strip Markdown fences, and parse the JSON payload
//! tolerantly. Any provider or parse failure routes to the deterministic
//! fallback for that operation; the analyzer always produces a result.

pub mod fallback;

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

use crate::llm::TextCompletion;
use crate::models::{
    EdgeSentiment, MemberContext, Post, RelationshipKind, TopicSentiment, TopicSummary,
};

/// Posts beyond this cap are not rendered into prompts. Positional fallback
/// ids are assigned over the truncated window, in original order.
pub const PROMPT_POST_CAP: usize = 100;

const ANALYSIS_TEMPERATURE: f32 = 0.5;
const QUOTE_PREVIEW_CHARS: usize = 100;

const TOPIC_SYSTEM_PROMPT: &str = r#"You are an expert social media analyst. Analyze social media posts and identify key topics, themes, and trends.
Return your analysis as a JSON array of objects, each with:
- "topic": a concise topic name (2-5 words)
- "summary": a brief explanation (1-2 sentences)
- "score": a relevance score from 0.0 to 1.0
- "sentiment": sentiment analysis ("positive", "negative", or "neutral")
- "related_tweet_ids": array of post IDs (from the input) that are most relevant to this topic
- "related_user_ids": array of usernames who actively discussed this topic

Focus on identifying meaningful themes, not just hashtags. Consider context and member descriptions when available.
For related_tweet_ids, select the most representative posts (5-10 per topic)."#;

const KEY_PERSON_SYSTEM_PROMPT: &str = r#"You are an expert network analyst. Analyze social media posts to identify key persons (users) and their relationships/interactions.
Return your analysis as a JSON object with:
- "key_persons": array of objects with "username", "role_description", "importance_score" (0.0-1.0)
- "relationships": array of objects with:
  - "source": source username
  - "target": target username or topic name
  - "relationship_type": one of "retweet", "reply", "quote", "mention", "topic_discussion", "collaboration"
  - "strength": relationship strength (0.0-1.0)
  - "sentiment": optional sentiment ("support", "oppose", "neutral")
  - "related_tweet_ids": array of post IDs that establish this relationship

Relationship types:
- "retweet": direct repost relationship
- "reply": direct reply relationship
- "quote": quote relationship
- "mention": user mentioned in a post
- "topic_discussion": users discussing the same topic (indirect relationship)
- "collaboration": users showing collaborative behavior

For topic_discussion relationships, connect users who discuss the same topics, especially if they show agreement or disagreement."#;

/// A user the analyzer considers central to the window
#[derive(Debug, Clone)]
pub struct KeyPerson {
    pub handle: String,
    pub role: String,
    /// Importance score, [0, 1] for analyzer output
    pub importance: f64,
}

/// An analyzer-reported relationship between two endpoints. Endpoints are
/// raw strings (handles or topic names); the graph builder resolves them
/// to namespaced node ids.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub relationship_type: Option<RelationshipKind>,
    pub strength: f64,
    pub sentiment: Option<EdgeSentiment>,
    pub related_post_ids: Vec<String>,
}

/// Result of the key-person analysis operation
#[derive(Debug, Clone, Default)]
pub struct KeyPersonAnalysis {
    pub key_persons: Vec<KeyPerson>,
    pub relationships: Vec<Relationship>,
}

/// Outcome of parsing a provider completion. Malformed payloads are never
/// errors; they route to the deterministic fallback.
enum LlmParse<T> {
    Parsed(T),
    Malformed,
}

/// The post window rendered into prompts: the first [`PROMPT_POST_CAP`]
/// posts in original order.
pub fn prompt_window(posts: &[Post]) -> &[Post] {
    &posts[..posts.len().min(PROMPT_POST_CAP)]
}

/// Stable identifiers for the prompt window, positionally synthesized when
/// the native id is absent.
pub fn assign_post_ids(window: &[Post]) -> Vec<String> {
    window
        .iter()
        .enumerate()
        .map(|(index, post)| post.identifier_at(index))
        .collect()
}

/// Text analyzer over a provider gateway
pub struct TextAnalyzer<'a> {
    llm: &'a dyn TextCompletion,
}

impl<'a> TextAnalyzer<'a> {
    pub fn new(llm: &'a dyn TextCompletion) -> Self {
        Self { llm }
    }

    /// Extract topic summaries from the post window.
    ///
    /// Pure function of (posts, member context) modulo the provider call.
    /// Falls back to hashtag frequency on any provider or parse failure.
    pub async fn analyze_topics(
        &self,
        posts: &[Post],
        members: &MemberContext,
    ) -> Vec<TopicSummary> {
        let window = prompt_window(posts);
        let ids = assign_post_ids(window);
        let id_set: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let lines = render_post_lines(window, &ids, members, false);
        let prompt = format!(
            "Analyze the following social media posts and identify the top 5-8 key topics:\n\n{}\n\nReturn only valid JSON array, no additional text.",
            lines.join("\n")
        );

        let raw = match self
            .llm
            .complete(&prompt, Some(TOPIC_SYSTEM_PROMPT), ANALYSIS_TEMPERATURE)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "topic analysis provider call failed, using frequency fallback");
                return fallback::topics(posts);
            }
        };

        match parse_topic_payload(&raw) {
            LlmParse::Parsed(raw_topics) => raw_topics
                .into_iter()
                .map(|t| TopicSummary {
                    topic: t.topic,
                    summary: t.summary,
                    score: t.score,
                    sentiment: t.sentiment,
                    related_post_ids: retain_known_ids(t.related_tweet_ids, &id_set),
                    related_handles: t.related_user_ids,
                })
                .collect(),
            LlmParse::Malformed => {
                tracing::warn!("topic analysis returned malformed payload, using frequency fallback");
                fallback::topics(posts)
            }
        }
    }

    /// Identify key persons and relationships in the post window.
    ///
    /// Falls back to author frequency (with an empty relationship list) on
    /// any provider or parse failure.
    pub async fn analyze_key_persons(
        &self,
        posts: &[Post],
        members: &MemberContext,
    ) -> KeyPersonAnalysis {
        let window = prompt_window(posts);
        let ids = assign_post_ids(window);
        let id_set: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let lines = render_post_lines(window, &ids, members, true);
        let prompt = format!(
            "Analyze the following social media posts to identify key persons and their relationships.\n\
             Pay special attention to:\n\
             1. Repost relationships: who reposts whom (indicates support/amplification)\n\
             2. Reply relationships: who replies to whom (indicates engagement/discussion)\n\
             3. Quote relationships: who quotes whom (indicates commentary/response)\n\
             4. Topic connections: users discussing the same topics\n\
             5. Sentiment: identify if relationships show support, opposition, or neutral stance\n\n\
             {}\n\nReturn only valid JSON object, no additional text.",
            lines.join("\n")
        );

        let raw = match self
            .llm
            .complete(&prompt, Some(KEY_PERSON_SYSTEM_PROMPT), ANALYSIS_TEMPERATURE)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "key-person analysis provider call failed, using frequency fallback");
                return fallback::key_persons(posts);
            }
        };

        match parse_key_person_payload(&raw) {
            LlmParse::Parsed(payload) => KeyPersonAnalysis {
                key_persons: payload
                    .key_persons
                    .into_iter()
                    .map(|p| KeyPerson {
                        handle: p.username,
                        role: p.role_description,
                        importance: p.importance_score,
                    })
                    .collect(),
                relationships: payload
                    .relationships
                    .into_iter()
                    .map(|r| Relationship {
                        source: r.source,
                        target: r.target,
                        relationship_type: r.relationship_type,
                        strength: r.strength,
                        sentiment: r.sentiment,
                        related_post_ids: retain_known_ids(r.related_tweet_ids, &id_set),
                    })
                    .collect(),
            },
            LlmParse::Malformed => {
                tracing::warn!("key-person analysis returned malformed payload, using frequency fallback");
                fallback::key_persons(posts)
            }
        }
    }
}

/// Keep only identifiers that exist among the supplied posts; anything
/// else is silently discarded.
fn retain_known_ids(ids: Vec<String>, known: &HashSet<&str>) -> Vec<String> {
    let (kept, dropped): (Vec<String>, Vec<String>) =
        ids.into_iter().partition(|id| known.contains(id.as_str()));
    if !dropped.is_empty() {
        tracing::debug!(count = dropped.len(), "discarded unknown post ids from analysis payload");
    }
    kept
}

/// Render each post into one prompt line: bracketed id, handle with an
/// optional member description, optional interaction annotations, content.
fn render_post_lines(
    window: &[Post],
    ids: &[String],
    members: &MemberContext,
    with_interactions: bool,
) -> Vec<String> {
    window
        .iter()
        .zip(ids)
        .map(|(post, id)| {
            let who = match members.get(&post.handle) {
                Some(desc) if !desc.is_empty() => format!("{} ({desc})", post.handle),
                _ => post.handle.clone(),
            };

            let mut annotations = Vec::new();
            if with_interactions {
                if post.is_retweet {
                    let original = post.original_author.as_deref().unwrap_or("unknown");
                    annotations.push(format!("RETWEETED from @{original}"));
                }
                if post.is_reply {
                    annotations.push(String::from("REPLY"));
                }
                if post.is_quoted {
                    let original = post.original_author.as_deref().unwrap_or("unknown");
                    let preview: String = post
                        .original_content
                        .as_deref()
                        .unwrap_or("")
                        .chars()
                        .take(QUOTE_PREVIEW_CHARS)
                        .collect();
                    annotations.push(format!("QUOTED @{original}: {preview}"));
                }
            }

            if annotations.is_empty() {
                format!("[ID:{id}] [{who}]: {}", post.content)
            } else {
                format!("[ID:{id}] [{who}] {} : {}", annotations.join(" | "), post.content)
            }
        })
        .collect()
}

/// Strip optional Markdown code-fence wrapping, with or without a "json"
/// language tag.
fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn parse_topic_payload(raw: &str) -> LlmParse<Vec<RawTopic>> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "topic payload is not valid JSON");
            return LlmParse::Malformed;
        }
    };

    // A lone object is treated as a one-element array.
    let value = if value.is_object() {
        serde_json::Value::Array(vec![value])
    } else {
        value
    };

    match serde_json::from_value(value) {
        Ok(topics) => LlmParse::Parsed(topics),
        Err(err) => {
            tracing::debug!(error = %err, "topic payload did not match expected shape");
            LlmParse::Malformed
        }
    }
}

fn parse_key_person_payload(raw: &str) -> LlmParse<RawKeyPersonPayload> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(cleaned) {
        Ok(payload) => LlmParse::Parsed(payload),
        Err(err) => {
            tracing::debug!(error = %err, "key-person payload did not match expected shape");
            LlmParse::Malformed
        }
    }
}

fn default_topic_name() -> String {
    String::from("Unknown")
}

fn default_score() -> f64 {
    0.5
}

fn default_handle() -> String {
    String::from("unknown")
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    #[serde(default = "default_topic_name")]
    topic: String,

    #[serde(default)]
    summary: String,

    #[serde(default = "default_score")]
    score: f64,

    #[serde(default, deserialize_with = "lenient_topic_sentiment")]
    sentiment: Option<TopicSentiment>,

    #[serde(default, deserialize_with = "lenient_string_seq")]
    related_tweet_ids: Vec<String>,

    #[serde(default, deserialize_with = "lenient_string_seq")]
    related_user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawKeyPersonPayload {
    #[serde(default)]
    key_persons: Vec<RawKeyPerson>,

    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct RawKeyPerson {
    #[serde(default = "default_handle")]
    username: String,

    #[serde(default)]
    role_description: String,

    #[serde(default = "default_score")]
    importance_score: f64,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(default)]
    source: String,

    #[serde(default)]
    target: String,

    #[serde(default, deserialize_with = "lenient_relationship_kind")]
    relationship_type: Option<RelationshipKind>,

    #[serde(default = "default_score")]
    strength: f64,

    #[serde(default, deserialize_with = "lenient_edge_sentiment")]
    sentiment: Option<EdgeSentiment>,

    #[serde(default, deserialize_with = "lenient_string_seq")]
    related_tweet_ids: Vec<String>,
}

/// Accept a value only if it is a sequence; keep its string elements and
/// silently discard everything else.
fn lenient_string_seq<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_topic_sentiment<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<TopicSentiment>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => TopicSentiment::parse(&s),
        _ => None,
    })
}

fn lenient_edge_sentiment<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EdgeSentiment>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => EdgeSentiment::parse(&s),
        _ => None,
    })
}

fn lenient_relationship_kind<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RelationshipKind>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => RelationshipKind::parse(&s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted completion returning queued responses in order.
    struct Scripted {
        responses: Mutex<Vec<Result<String>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl TextCompletion for Scripted {
        async fn complete(&self, _: &str, _: Option<&str>, _: f32) -> Result<String> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(Error::provider("script exhausted"));
            }
            responses.remove(0)
        }
    }

    fn post(handle: &str, content: &str) -> Post {
        Post {
            handle: handle.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn test_render_lines_with_description_and_interactions() {
        let posts = vec![Post {
            handle: "alice".to_string(),
            content: "shipping".to_string(),
            is_retweet: true,
            original_author: Some("bob".to_string()),
            ..Default::default()
        }];
        let ids = assign_post_ids(&posts);
        let mut members = HashMap::new();
        members.insert("alice".to_string(), "CTO".to_string());

        let lines = render_post_lines(&posts, &ids, &members, true);
        assert_eq!(
            lines[0],
            "[ID:tweet_0] [alice (CTO)] RETWEETED from @bob : shipping"
        );

        let plain = render_post_lines(&posts, &ids, &members, false);
        assert_eq!(plain[0], "[ID:tweet_0] [alice (CTO)]: shipping");
    }

    #[test]
    fn test_quote_preview_truncated() {
        let posts = vec![Post {
            handle: "alice".to_string(),
            content: "thoughts".to_string(),
            is_quoted: true,
            original_author: Some("bob".to_string()),
            original_content: Some("x".repeat(500)),
            ..Default::default()
        }];
        let ids = assign_post_ids(&posts);
        let lines = render_post_lines(&posts, &ids, &HashMap::new(), true);
        assert!(lines[0].contains(&format!("QUOTED @bob: {}", "x".repeat(QUOTE_PREVIEW_CHARS))));
        assert!(!lines[0].contains(&"x".repeat(QUOTE_PREVIEW_CHARS + 1)));
    }

    #[test]
    fn test_prompt_window_truncation() {
        let posts: Vec<Post> = (0..150).map(|i| post("alice", &format!("p{i}"))).collect();
        assert_eq!(prompt_window(&posts).len(), PROMPT_POST_CAP);
    }

    #[test]
    fn test_topic_payload_defaults() {
        let parsed = parse_topic_payload(r#"[{"summary": "a theme"}]"#);
        let LlmParse::Parsed(topics) = parsed else {
            panic!("expected parsed payload");
        };
        assert_eq!(topics[0].topic, "Unknown");
        assert_eq!(topics[0].score, 0.5);
        assert!(topics[0].sentiment.is_none());
    }

    #[test]
    fn test_topic_payload_lone_object_wrapped() {
        let parsed = parse_topic_payload(r#"{"topic": "ai", "score": 0.9}"#);
        let LlmParse::Parsed(topics) = parsed else {
            panic!("expected parsed payload");
        };
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].topic, "ai");
    }

    #[test]
    fn test_wrong_typed_related_ids_discarded() {
        let parsed = parse_topic_payload(r#"[{"topic": "ai", "related_tweet_ids": "not-a-list"}]"#);
        let LlmParse::Parsed(topics) = parsed else {
            panic!("expected parsed payload");
        };
        assert!(topics[0].related_tweet_ids.is_empty());
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            parse_topic_payload("I could not produce JSON, sorry"),
            LlmParse::Malformed
        ));
        assert!(matches!(
            parse_key_person_payload("[1, 2, 3]"),
            LlmParse::Malformed
        ));
    }

    #[tokio::test]
    async fn test_analyze_topics_validates_ids() {
        let response = r#"```json
[{"topic": "launch chatter", "summary": "s", "score": 0.8,
  "related_tweet_ids": ["tweet_0", "tweet_99", "bogus"],
  "related_user_ids": ["alice"]}]
```"#;
        let llm = Scripted::new(vec![Ok(response.to_string())]);
        let analyzer = TextAnalyzer::new(&llm);

        let posts = vec![post("alice", "#launch"), post("bob", "hello")];
        let topics = analyzer.analyze_topics(&posts, &HashMap::new()).await;

        assert_eq!(topics.len(), 1);
        // tweet_99 is outside the two-post window, bogus never existed
        assert_eq!(topics[0].related_post_ids, vec!["tweet_0".to_string()]);
        assert_eq!(topics[0].related_handles, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn test_analyze_topics_synthesized_id_validates() {
        let response = r#"[{"topic": "t", "related_tweet_ids": ["tweet_1"]}]"#;
        let llm = Scripted::new(vec![Ok(response.to_string())]);
        let analyzer = TextAnalyzer::new(&llm);

        // Second post has no native id; tweet_1 is its synthesized form.
        let posts = vec![
            Post {
                id: Some("native".to_string()),
                handle: "alice".to_string(),
                ..Default::default()
            },
            post("bob", "no id here"),
        ];
        let topics = analyzer.analyze_topics(&posts, &HashMap::new()).await;
        assert_eq!(topics[0].related_post_ids, vec!["tweet_1".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let llm = Scripted::new(vec![Err(Error::provider("503"))]);
        let analyzer = TextAnalyzer::new(&llm);

        let posts = vec![post("alice", "#launch"), post("alice", "#launch again")];
        let topics = analyzer.analyze_topics(&posts, &HashMap::new()).await;

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].topic, "#launch");
        assert_eq!(topics[0].score, 0.2);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let llm = Scripted::new(vec![Ok("no json today".to_string())]);
        let analyzer = TextAnalyzer::new(&llm);

        let posts = vec![post("alice", "x"), post("alice", "y"), post("bob", "z")];
        let analysis = analyzer.analyze_key_persons(&posts, &HashMap::new()).await;

        assert_eq!(analysis.key_persons[0].handle, "alice");
        assert_eq!(analysis.key_persons[0].importance, 0.1);
        assert!(analysis.relationships.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_key_persons_parses_relationships() {
        let response = r#"{
            "key_persons": [
                {"username": "alice", "role_description": "Driver", "importance_score": 0.9},
                {"username": "bob", "importance_score": 0.4}
            ],
            "relationships": [
                {"source": "bob", "target": "alice", "relationship_type": "retweet",
                 "strength": 0.7, "sentiment": "support", "related_tweet_ids": ["tweet_0"]},
                {"source": "alice", "target": "bob", "relationship_type": "follows",
                 "strength": 0.2}
            ]
        }"#;
        let llm = Scripted::new(vec![Ok(response.to_string())]);
        let analyzer = TextAnalyzer::new(&llm);

        let posts = vec![post("alice", "x"), post("bob", "y")];
        let analysis = analyzer.analyze_key_persons(&posts, &HashMap::new()).await;

        assert_eq!(analysis.key_persons.len(), 2);
        assert_eq!(analysis.key_persons[1].role, "");

        assert_eq!(analysis.relationships.len(), 2);
        let first = &analysis.relationships[0];
        assert_eq!(first.relationship_type, Some(RelationshipKind::Retweet));
        assert_eq!(first.sentiment, Some(EdgeSentiment::Support));
        assert_eq!(first.related_post_ids, vec!["tweet_0".to_string()]);
        // unknown relationship type degrades to None, not an error
        assert_eq!(analysis.relationships[1].relationship_type, None);
    }
}
