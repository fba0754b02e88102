/// Taxonomy Engine — Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing of a graph's
/// registries. Independent of insertion order and of internal index
/// assignment; adjacency is derived state and is not hashed.
///
/// Rules:
///   - engine_version first
///   - nodes sorted ascending
///   - edges sorted by id, destinations sorted ascending
///   - UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::graph::TaxonomyGraph;
use crate::ENGINE_VERSION;

/// Canonical serialization of a graph to compact UTF-8 JSON.
pub fn canonical_serialize(graph: &TaxonomyGraph) -> String {
    build_canonical_value(graph).to_string()
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(graph: &TaxonomyGraph) -> String {
    sha256_hex(canonical_serialize(graph).as_bytes())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Field order: engine_version, nodes, edges.
/// Edge field order: id, source, destinations.
fn build_canonical_value(graph: &TaxonomyGraph) -> Value {
    let mut nodes: Vec<u64> = graph.node_ids().collect();
    nodes.sort_unstable();

    // EdgeRegistry iterates in id order; destinations are already canonical.
    let edges: Vec<Value> = graph
        .edges()
        .iter()
        .map(|(id, edge)| {
            let mut m = Map::new();
            m.insert("id".to_string(), Value::String(id.as_str().to_string()));
            m.insert("source".to_string(), Value::from(edge.source()));
            m.insert(
                "destinations".to_string(),
                Value::Array(edge.destinations().iter().map(|&d| Value::from(d)).collect()),
            );
            Value::Object(m)
        })
        .collect();

    let mut root = Map::new();
    root.insert("engine_version".to_string(), Value::from(ENGINE_VERSION));
    root.insert(
        "nodes".to_string(),
        Value::Array(nodes.into_iter().map(Value::from).collect()),
    );
    root.insert("edges".to_string(), Value::Array(edges));
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_stable() {
        let mut g = TaxonomyGraph::new();
        g.add_node(2);
        g.add_node(1);
        g.add_edge("r1", 1, [2]);
        assert_eq!(
            canonical_serialize(&g),
            r#"{"engine_version":1,"nodes":[1,2],"edges":[{"id":"r1","source":1,"destinations":[2]}]}"#
        );
    }

    #[test]
    fn hash_ignores_insertion_order() {
        let mut a = TaxonomyGraph::new();
        a.add_node(1);
        a.add_node(2);
        a.add_node(3);
        a.add_edge("x", 1, [3, 2]);
        a.add_edge("y", 2, [3]);

        let mut b = TaxonomyGraph::new();
        b.add_node(3);
        b.add_node(2);
        b.add_node(1);
        b.add_edge("y", 2, [3]);
        b.add_edge("x", 1, [2, 3]);

        assert_eq!(canonical_hash(&a), canonical_hash(&b));
        assert_eq!(canonical_hash(&a).len(), 64);
    }

    #[test]
    fn hash_tracks_destination_changes() {
        let mut a = TaxonomyGraph::new();
        a.add_edge("x", 1, [2]);
        let mut b = a.clone();
        b.add_edge("x", 1, [3]);
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }
}
