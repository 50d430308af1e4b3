//! Core data structures for the pulse insights engine

use chrono::{DateTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A single social-media post fetched from the external document store.
///
/// Posts are immutable once fetched. Upstream documents are only partially
/// shaped, so every field except the author handle carries a serde default.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Post {
    /// Native post identifier. May be absent; the analyzer synthesizes a
    /// positional `tweet_<index>` id in that case.
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    /// Author handle (the source system's username).
    #[serde(alias = "username", alias = "author")]
    pub handle: String,

    /// Free-text content.
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub is_retweet: bool,

    #[serde(default)]
    pub is_reply: bool,

    #[serde(default)]
    pub is_quoted: bool,

    /// Original author for reposts and quotes.
    #[serde(default)]
    pub original_author: Option<String>,

    /// Original content preview for quotes.
    #[serde(default)]
    pub original_content: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Stable identifier for prompt rendering and id validation: the native
    /// id when present, else the positional fallback `tweet_<index>`.
    pub fn identifier_at(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("tweet_{index}"))
    }
}

/// Mapping from author handle to an optional free-text description supplied
/// by business-line configuration. Used only to enrich prompts.
pub type MemberContext = HashMap<String, String>;

/// A configured group of tracked social-media authors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessLine {
    pub id: String,
    pub name: String,
    /// Member handles tracked by this line.
    pub members: Vec<String>,
}

/// Sentiment tag attached to a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicSentiment {
    Positive,
    Negative,
    Neutral,
}

impl TopicSentiment {
    /// Parse a free-form tag, tolerating case. Unknown tags map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// Stance carried by a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSentiment {
    Support,
    Oppose,
    Neutral,
}

impl EdgeSentiment {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "support" => Some(Self::Support),
            "oppose" => Some(Self::Oppose),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// Typed relationship between two graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Retweet,
    Reply,
    Quote,
    Mention,
    TopicDiscussion,
    Collaboration,
}

impl RelationshipKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "retweet" => Some(Self::Retweet),
            "reply" => Some(Self::Reply),
            "quote" => Some(Self::Quote),
            "mention" => Some(Self::Mention),
            "topic_discussion" => Some(Self::TopicDiscussion),
            "collaboration" => Some(Self::Collaboration),
            _ => None,
        }
    }
}

/// Topic extracted from a post window, with its relevance and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    /// Topic name, unique within a result.
    pub topic: String,

    /// Brief free-text explanation.
    pub summary: String,

    /// Relevance score. Analyzer output is normalized to [0, 1]; the
    /// whole-pipeline frequency path reports raw counts.
    pub score: f64,

    #[serde(default)]
    pub sentiment: Option<TopicSentiment>,

    /// Post identifiers backing this topic, validated against the prompt
    /// window.
    #[serde(default)]
    pub related_post_ids: Vec<String>,

    /// Handles of authors who actively discussed this topic.
    #[serde(default)]
    pub related_handles: Vec<String>,
}

/// Namespaced graph node identifier.
///
/// The canonical string encoding is `user:<handle>` / `topic:<name>`; nodes
/// and edges serialize the id as that string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    User(String),
    Topic(String),
}

impl NodeId {
    pub fn user(handle: impl Into<String>) -> Self {
        Self::User(handle.into())
    }

    pub fn topic(name: impl Into<String>) -> Self {
        Self::Topic(name.into())
    }

    /// Decode a canonical `user:`/`topic:` string.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(handle) = s.strip_prefix("user:") {
            Some(Self::User(handle.to_string()))
        } else if let Some(name) = s.strip_prefix("topic:") {
            Some(Self::Topic(name.to_string()))
        } else {
            None
        }
    }

    /// The un-namespaced label (handle or topic name).
    pub fn label(&self) -> &str {
        match self {
            Self::User(handle) => handle,
            Self::Topic(name) => name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::User(_) => NodeKind::User,
            Self::Topic(_) => NodeKind::Topic,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(handle) => write!(f, "user:{handle}"),
            Self::Topic(name) => write!(f, "topic:{name}"),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid node id namespace: {s}")))
    }
}

/// Node type discriminator on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Topic,
}

/// A user or topic node in the insights graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Non-negative importance weight.
    pub weight: f64,
}

/// A typed, weighted relationship between two nodes.
///
/// Invariant: `source` and `target` reference node ids present in the node
/// set of the same result. The graph builder enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,

    #[serde(default)]
    pub relationship_type: Option<RelationshipKind>,

    #[serde(default)]
    pub sentiment: Option<EdgeSentiment>,

    #[serde(default)]
    pub related_post_ids: Vec<String>,
}

/// Terminal, read-only artifact of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InsightsResult {
    pub topics: Vec<TopicSummary>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl InsightsResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// A persisted, timestamped InsightsResult. Storage is owned by an external
/// collaborator behind [`crate::store::SnapshotStore`]; only the wire shape
/// lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub business_line_id: String,

    #[serde(default)]
    pub business_line_name: Option<String>,

    /// When the analyzed window ended.
    pub analysis_date: DateTime<Utc>,

    #[serde(flatten)]
    pub result: InsightsResult,

    #[serde(default)]
    pub raw_data_summary: Option<String>,

    /// Snapshots are private until explicitly published.
    #[serde(default)]
    pub is_public: bool,

    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Wrap a pipeline result for persistence.
    pub fn new(line: &BusinessLine, analysis_date: DateTime<Utc>, result: InsightsResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_line_id: line.id.clone(),
            business_line_name: Some(line.name.clone()),
            analysis_date,
            result,
            raw_data_summary: None,
            is_public: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.raw_data_summary = Some(summary.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_prefers_native_id() {
        let post = Post {
            id: Some("12345".to_string()),
            handle: "alice".to_string(),
            ..Default::default()
        };
        assert_eq!(post.identifier_at(7), "12345");
    }

    #[test]
    fn test_identifier_positional_fallback() {
        let post = Post {
            handle: "alice".to_string(),
            ..Default::default()
        };
        assert_eq!(post.identifier_at(7), "tweet_7");
    }

    #[test]
    fn test_post_deserializes_partial_document() {
        let post: Post = serde_json::from_str(r#"{"username": "bob", "content": "hi"}"#).unwrap();
        assert_eq!(post.handle, "bob");
        assert!(post.id.is_none());
        assert!(!post.is_retweet);
    }

    #[test]
    fn test_node_id_roundtrip() {
        let id = NodeId::user("alice");
        assert_eq!(id.to_string(), "user:alice");
        assert_eq!(NodeId::parse("user:alice"), Some(id));

        let id = NodeId::topic("#launch");
        assert_eq!(id.to_string(), "topic:#launch");
        assert_eq!(NodeId::parse("topic:#launch"), Some(id));

        assert_eq!(NodeId::parse("alice"), None);
    }

    #[test]
    fn test_node_id_serde_as_string() {
        let json = serde_json::to_string(&NodeId::topic("ai")).unwrap();
        assert_eq!(json, r#""topic:ai""#);

        let id: NodeId = serde_json::from_str(r#""user:bob""#).unwrap();
        assert_eq!(id, NodeId::user("bob"));

        assert!(serde_json::from_str::<NodeId>(r#""bogus""#).is_err());
    }

    #[test]
    fn test_result_wire_shape() {
        let result = InsightsResult {
            topics: vec![TopicSummary {
                topic: "#ai".to_string(),
                summary: "#ai".to_string(),
                score: 0.4,
                sentiment: Some(TopicSentiment::Positive),
                related_post_ids: vec!["tweet_0".to_string()],
                related_handles: vec!["alice".to_string()],
            }],
            nodes: vec![GraphNode {
                id: NodeId::user("alice"),
                label: "alice".to_string(),
                kind: NodeKind::User,
                weight: 1.0,
            }],
            edges: vec![GraphEdge {
                source: NodeId::user("alice"),
                target: NodeId::topic("#ai"),
                weight: 0.32,
                relationship_type: Some(RelationshipKind::TopicDiscussion),
                sentiment: None,
                related_post_ids: Vec::new(),
            }],
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["nodes"][0]["id"], "user:alice");
        assert_eq!(value["nodes"][0]["type"], "user");
        assert_eq!(value["edges"][0]["relationship_type"], "topic_discussion");
        assert_eq!(value["topics"][0]["sentiment"], "positive");

        let back: InsightsResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.edges[0].target, NodeId::topic("#ai"));
    }

    #[test]
    fn test_relationship_kind_parse() {
        assert_eq!(
            RelationshipKind::parse("topic_discussion"),
            Some(RelationshipKind::TopicDiscussion)
        );
        assert_eq!(RelationshipKind::parse("Retweet"), Some(RelationshipKind::Retweet));
        assert_eq!(RelationshipKind::parse("follows"), None);
    }

    #[test]
    fn test_snapshot_defaults_private() {
        let line = BusinessLine {
            id: "bl1".to_string(),
            name: "Launch Team".to_string(),
            members: vec!["alice".to_string()],
        };
        let snapshot = Snapshot::new(&line, Utc::now(), InsightsResult::empty());
        assert!(!snapshot.is_public);
        assert_eq!(snapshot.business_line_name.as_deref(), Some("Launch Team"));
    }
}
