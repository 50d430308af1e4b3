//! Graph construction from analysis output
//!
//! Merges topic summaries and key-person analysis into a single consistent
//! node/edge set. The builder's primary responsibility is referential
//! integrity: no edge is ever emitted whose endpoints are not both present
//! in the node set of the same result. Edges are deduplicated on the
//! ordered (source, target) pair across all passes; a later pass never
//! overwrites an edge produced by an earlier one.

use std::collections::{HashMap, HashSet};

use crate::analyzer::{self, KeyPersonAnalysis};
use crate::models::{
    GraphEdge, GraphNode, InsightsResult, NodeId, Post, RelationshipKind, TopicSummary,
};

/// Per-topic cap on post ids attached to synthesized membership edges
const MEMBERSHIP_EDGE_POST_IDS: usize = 5;

/// Weight factor for edges synthesized from a topic's related handles
const MEMBERSHIP_WEIGHT_FACTOR: f64 = 0.8;

/// Build a validated insights graph.
///
/// `posts` is the original (pre-truncation) post list; it drives the
/// co-occurrence pass and the post-id set used to validate edge provenance.
pub fn build_graph(
    topics: Vec<TopicSummary>,
    analysis: KeyPersonAnalysis,
    posts: &[Post],
) -> InsightsResult {
    let mut builder = GraphBuilder::new();

    builder.add_user_nodes(&analysis);
    builder.add_topic_nodes(&topics);
    builder.add_relationship_edges(&analysis, &topics, posts);
    builder.add_membership_edges(&topics);
    builder.add_cooccurrence_edges(&topics, posts);

    builder.finish(topics)
}

/// Accumulates nodes and edges for one result, tracking the running node-id
/// and edge-pair sets.
struct GraphBuilder {
    nodes: Vec<GraphNode>,
    node_ids: HashSet<NodeId>,
    edges: Vec<GraphEdge>,
    edge_pairs: HashSet<(NodeId, NodeId)>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_ids: HashSet::new(),
            edges: Vec::new(),
            edge_pairs: HashSet::new(),
        }
    }

    fn push_node(&mut self, id: NodeId, weight: f64) {
        // At most one node per id; the first occurrence wins.
        if self.node_ids.insert(id.clone()) {
            self.nodes.push(GraphNode {
                label: id.label().to_string(),
                kind: id.kind(),
                id,
                weight,
            });
        }
    }

    fn push_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.node_ids.contains(&edge.source) || !self.node_ids.contains(&edge.target) {
            tracing::debug!(
                source = %edge.source,
                target = %edge.target,
                "dropping edge with unknown endpoint"
            );
            return false;
        }
        if !self
            .edge_pairs
            .insert((edge.source.clone(), edge.target.clone()))
        {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// One `user:` node per key person, weighted by importance.
    fn add_user_nodes(&mut self, analysis: &KeyPersonAnalysis) {
        for person in &analysis.key_persons {
            self.push_node(NodeId::user(&person.handle), person.importance);
        }
    }

    /// One `topic:` node per topic, weighted by its score.
    fn add_topic_nodes(&mut self, topics: &[TopicSummary]) {
        for topic in topics {
            self.push_node(NodeId::topic(&topic.topic), topic.score);
        }
    }

    /// Edges reported by the analyzer. Endpoint strings resolve to topic
    /// ids when they match a known topic name (or carry the `topic:`
    /// prefix), and to user ids otherwise. Edges referencing out-of-set
    /// endpoints are dropped entirely.
    fn add_relationship_edges(
        &mut self,
        analysis: &KeyPersonAnalysis,
        topics: &[TopicSummary],
        posts: &[Post],
    ) {
        let topic_names: HashSet<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
        let known_post_ids: HashSet<String> =
            analyzer::assign_post_ids(analyzer::prompt_window(posts))
                .into_iter()
                .collect();

        for rel in &analysis.relationships {
            if rel.source.is_empty() || rel.target.is_empty() {
                continue;
            }

            let source = resolve_endpoint(&rel.source, &topic_names);
            let target = resolve_endpoint(&rel.target, &topic_names);

            let related_post_ids = rel
                .related_post_ids
                .iter()
                .filter(|id| known_post_ids.contains(*id))
                .cloned()
                .collect();

            self.push_edge(GraphEdge {
                source,
                target,
                weight: rel.strength,
                relationship_type: rel.relationship_type,
                sentiment: rel.sentiment,
                related_post_ids,
            });
        }
    }

    /// Synthesized `topic_discussion` edges connecting each topic to the
    /// users the analyzer associated with it.
    fn add_membership_edges(&mut self, topics: &[TopicSummary]) {
        for topic in topics {
            let target = NodeId::topic(&topic.topic);
            for handle in &topic.related_handles {
                self.push_edge(GraphEdge {
                    source: NodeId::user(handle),
                    target: target.clone(),
                    weight: topic.score * MEMBERSHIP_WEIGHT_FACTOR,
                    relationship_type: Some(RelationshipKind::TopicDiscussion),
                    sentiment: None,
                    related_post_ids: topic
                        .related_post_ids
                        .iter()
                        .take(MEMBERSHIP_EDGE_POST_IDS)
                        .cloned()
                        .collect(),
                });
            }
        }
    }

    /// Frequency pass: count case-insensitive substring co-occurrence of
    /// every topic name in every post, then emit `topic_discussion` edges
    /// for pairs not already present. Matches against all topics, including
    /// analyzer-sourced names.
    fn add_cooccurrence_edges(&mut self, topics: &[TopicSummary], posts: &[Post]) {
        let mut counts: HashMap<(String, String), u32> = HashMap::new();
        for post in posts {
            let content = post.content.to_lowercase();
            for topic in topics {
                if content.contains(&topic.topic.to_lowercase()) {
                    *counts
                        .entry((post.handle.clone(), topic.topic.clone()))
                        .or_default() += 1;
                }
            }
        }

        // Stable emission order for deterministic output.
        let mut pairs: Vec<((String, String), u32)> = counts.into_iter().collect();
        pairs.sort();

        for ((handle, topic_name), count) in pairs {
            let source = NodeId::user(&handle);
            if !self.node_ids.contains(&source) {
                continue;
            }
            self.push_edge(GraphEdge {
                source,
                target: NodeId::topic(&topic_name),
                weight: (f64::from(count) / 5.0).min(1.0),
                relationship_type: Some(RelationshipKind::TopicDiscussion),
                sentiment: None,
                related_post_ids: Vec::new(),
            });
        }
    }

    fn finish(self, topics: Vec<TopicSummary>) -> InsightsResult {
        InsightsResult {
            topics,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// Resolve an analyzer-reported endpoint string to a namespaced node id. A
/// bare string matching a known topic name (or already prefixed `topic:`)
/// resolves to a topic id; anything else resolves to a user id.
fn resolve_endpoint(raw: &str, topic_names: &HashSet<&str>) -> NodeId {
    if let Some(name) = raw.strip_prefix("topic:") {
        NodeId::topic(name)
    } else if topic_names.contains(raw) {
        NodeId::topic(raw)
    } else {
        NodeId::user(raw)
    }
}
