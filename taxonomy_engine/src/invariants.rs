/// Taxonomy Engine — Invariant Checks
///
/// Structural validation of a built graph. Returns `Err(message)` on the
/// first failure. Used when restoring state from untrusted sources and in
/// tests; never on the hot query path.

use crate::graph::TaxonomyGraph;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run all checks against a built (clean) graph.
pub fn validate_invariants(graph: &TaxonomyGraph) -> Result<(), String> {
    check_clean(graph)?;
    check_registry_bijection(graph)?;
    check_edge_destinations(graph)?;
    check_adjacency_indices(graph)?;
    check_adjacency_sizing(graph)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_clean(graph: &TaxonomyGraph) -> Result<(), String> {
    if graph.is_dirty() {
        return Err("[INVARIANT:clean] graph is dirty; adjacency not built".to_string());
    }
    Ok(())
}

/// `id_of(index_of(id)) == id` for every node.
fn check_registry_bijection(graph: &TaxonomyGraph) -> Result<(), String> {
    for id in graph.node_ids() {
        let index = graph
            .internal_index_of(id)
            .map_err(|e| format!("[INVARIANT:registry_bijection] {}", e))?;
        let back = graph
            .id_of(index)
            .map_err(|e| format!("[INVARIANT:registry_bijection] {}", e))?;
        if back != id {
            return Err(format!(
                "[INVARIANT:registry_bijection] concept {} maps to index {} which maps to {}",
                id, index, back
            ));
        }
    }
    Ok(())
}

/// Destination sets are non-empty, sorted and unique.
fn check_edge_destinations(graph: &TaxonomyGraph) -> Result<(), String> {
    for (id, edge) in graph.edges().iter() {
        let destinations = edge.destinations();
        if destinations.is_empty() {
            return Err(format!("[INVARIANT:edge_destinations] edge {} has no destinations", id));
        }
        if destinations.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!(
                "[INVARIANT:edge_destinations] edge {} destinations not canonical: {:?}",
                id, destinations
            ));
        }
    }
    Ok(())
}

/// Every adjacency entry is a valid internal index.
fn check_adjacency_indices(graph: &TaxonomyGraph) -> Result<(), String> {
    let adjacency = graph.adjacency();
    let count = graph.node_count();
    if adjacency.node_count() != count {
        return Err(format!(
            "[INVARIANT:adjacency_indices] adjacency built for {} nodes, registry has {}",
            adjacency.node_count(),
            count
        ));
    }
    for (label, rows) in [
        ("ancestors", adjacency.ancestors()),
        ("descendants", adjacency.descendants()),
    ] {
        for (i, row) in rows.iter().enumerate() {
            if let Some(bad) = row.iter().find(|&&j| j as usize >= count) {
                return Err(format!(
                    "[INVARIANT:adjacency_indices] {} row {} references index {} (node count {})",
                    label, i, bad, count
                ));
            }
        }
    }
    Ok(())
}

/// Row lengths equal the valid out/in degrees.
fn check_adjacency_sizing(graph: &TaxonomyGraph) -> Result<(), String> {
    let count = graph.node_count();
    let mut out_degree = vec![0usize; count];
    let mut in_degree = vec![0usize; count];

    for (_, edge) in graph.edges().iter() {
        for (source, destination) in edge.pairs() {
            let (Ok(s), Ok(d)) = (
                graph.internal_index_of(source),
                graph.internal_index_of(destination),
            ) else {
                continue;
            };
            out_degree[s as usize] += 1;
            in_degree[d as usize] += 1;
        }
    }

    let adjacency = graph.adjacency();
    for i in 0..count {
        let index = i as u32;
        if adjacency.ancestors_of(index).len() != out_degree[i]
            || adjacency.descendants_of(index).len() != in_degree[i]
        {
            return Err(format!(
                "[INVARIANT:adjacency_sizing] node index {} has {}/{} entries, expected {}/{}",
                i,
                adjacency.ancestors_of(index).len(),
                adjacency.descendants_of(index).len(),
                out_degree[i],
                in_degree[i]
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_graph_passes() {
        let mut g = TaxonomyGraph::new();
        for id in [1, 2, 3] {
            g.add_node(id);
        }
        g.add_edge("a", 1, [2, 3]);
        g.add_edge("dangling", 2, [404]);
        g.update();
        assert_eq!(validate_invariants(&g), Ok(()));
    }

    #[test]
    fn dirty_graph_fails() {
        let mut g = TaxonomyGraph::new();
        g.add_node(1);
        let err = validate_invariants(&g).unwrap_err();
        assert!(err.contains("clean"), "got: {}", err);
    }

    #[test]
    fn node_removal_then_rebuild_passes() {
        let mut g = TaxonomyGraph::new();
        g.add_node(1);
        g.add_node(2);
        g.add_edge("a", 1, [2]);
        g.update();
        g.remove_node(2);
        assert!(validate_invariants(&g).is_err());
        g.update();
        assert_eq!(validate_invariants(&g), Ok(()));
    }
}
