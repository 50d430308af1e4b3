//! Property tests for graph construction invariants

use std::collections::HashSet;

use proptest::prelude::*;
use pulse::analyzer::{KeyPerson, KeyPersonAnalysis, Relationship};
use pulse::graph::build_graph;
use pulse::models::{NodeId, Post, TopicSummary};

fn handle_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,3}"
}

fn topic_strategy() -> impl Strategy<Value = TopicSummary> {
    ("[f-j]{1,3}", 0.0..10.0f64).prop_map(|(name, score)| TopicSummary {
        topic: name.clone(),
        summary: name,
        score,
        sentiment: None,
        related_post_ids: Vec::new(),
        related_handles: Vec::new(),
    })
}

fn person_strategy() -> impl Strategy<Value = KeyPerson> {
    (handle_strategy(), 0.0..1.0f64).prop_map(|(handle, importance)| KeyPerson {
        handle,
        role: String::from("Active contributor"),
        importance,
    })
}

fn relationship_strategy() -> impl Strategy<Value = Relationship> {
    ("[a-j]{0,3}", "[a-j]{0,3}", 0.0..1.0f64).prop_map(|(source, target, strength)| {
        Relationship {
            source,
            target,
            relationship_type: None,
            strength,
            sentiment: None,
            related_post_ids: Vec::new(),
        }
    })
}

fn post_strategy() -> impl Strategy<Value = Post> {
    (handle_strategy(), "[a-j ]{0,20}").prop_map(|(handle, content)| Post {
        handle,
        content,
        ..Default::default()
    })
}

proptest! {
    #[test]
    fn prop_no_dangling_edges(
        topics in proptest::collection::vec(topic_strategy(), 0..6),
        persons in proptest::collection::vec(person_strategy(), 0..6),
        relationships in proptest::collection::vec(relationship_strategy(), 0..12),
        posts in proptest::collection::vec(post_strategy(), 0..10),
    ) {
        let analysis = KeyPersonAnalysis { key_persons: persons, relationships };
        let result = build_graph(topics, analysis, &posts);

        let ids: HashSet<&NodeId> = result.nodes.iter().map(|n| &n.id).collect();
        for edge in &result.edges {
            prop_assert!(ids.contains(&edge.source));
            prop_assert!(ids.contains(&edge.target));
        }
    }

    #[test]
    fn prop_node_ids_unique(
        topics in proptest::collection::vec(topic_strategy(), 0..6),
        persons in proptest::collection::vec(person_strategy(), 0..6),
    ) {
        let analysis = KeyPersonAnalysis { key_persons: persons, relationships: Vec::new() };
        let result = build_graph(topics, analysis, &[]);

        let mut seen = HashSet::new();
        for node in &result.nodes {
            prop_assert!(seen.insert(node.id.clone()), "duplicate node id {}", node.id);
        }
    }

    #[test]
    fn prop_edge_pairs_unique(
        topics in proptest::collection::vec(topic_strategy(), 0..6),
        persons in proptest::collection::vec(person_strategy(), 0..6),
        relationships in proptest::collection::vec(relationship_strategy(), 0..12),
        posts in proptest::collection::vec(post_strategy(), 0..10),
    ) {
        let analysis = KeyPersonAnalysis { key_persons: persons, relationships };
        let result = build_graph(topics, analysis, &posts);

        let mut seen = HashSet::new();
        for edge in &result.edges {
            prop_assert!(
                seen.insert((edge.source.clone(), edge.target.clone())),
                "duplicate edge {} -> {}", edge.source, edge.target
            );
        }
    }
}
