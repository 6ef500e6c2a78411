use std::collections::HashMap;

use serde::Serialize;
use shared_types::{ActiveEdge, GraphData, GraphNode};

// ── Edge grouping ────────────────────────────────────────────────────────────

/// All parallel edges between one `(source, target)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub labels: Vec<String>,
    /// `labels` joined one per line, as drawn on the edge
    pub label: String,
    pub self_loop: bool,
}

impl GroupedEdge {
    pub fn matches(&self, edge: &ActiveEdge) -> bool {
        self.source == edge.source && self.target == edge.target
    }
}

/// Group edges by `(source, target)` in order of first appearance.
pub fn group_edges(graph: &GraphData) -> Vec<GroupedEdge> {
    let mut groups: Vec<GroupedEdge> = Vec::new();
    let mut by_pair: HashMap<(&str, &str), usize> = HashMap::new();

    for edge in &graph.edges {
        let key = (edge.source.as_str(), edge.target.as_str());
        match by_pair.get(&key) {
            Some(&slot) => groups[slot].labels.push(edge.label.clone()),
            None => {
                by_pair.insert(key, groups.len());
                groups.push(GroupedEdge {
                    id: format!("e{}", groups.len()),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    labels: vec![edge.label.clone()],
                    label: String::new(),
                    self_loop: edge.source == edge.target,
                });
            }
        }
    }
    for group in &mut groups {
        group.label = group.labels.join(",\n");
    }
    groups
}

/// Grouped edge to draw as active, if the active edge exists in the graph.
pub fn find_active_edge<'a>(
    groups: &'a [GroupedEdge],
    active: Option<&ActiveEdge>,
) -> Option<&'a GroupedEdge> {
    let active = active?;
    groups.iter().find(|group| group.matches(active))
}

// ── Node helpers ─────────────────────────────────────────────────────────────

/// Start node, or the first node when none is marked.
pub fn start_node(graph: &GraphData) -> Option<&GraphNode> {
    graph
        .nodes
        .iter()
        .find(|node| node.is_start)
        .or_else(|| graph.nodes.first())
}

pub fn is_accepting(graph: &GraphData, node_id: &str) -> bool {
    graph
        .nodes
        .iter()
        .any(|node| node.id == node_id && node.is_accepting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::GraphEdge;

    fn node(id: &str, is_start: bool, is_accepting: bool) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_uppercase(),
            is_accepting,
            is_start,
        }
    }

    fn edge(source: &str, target: &str, label: &str) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
        }
    }

    fn sample_graph() -> GraphData {
        GraphData {
            nodes: vec![
                node("s0", false, false),
                node("s4", true, false),
                node("s9", false, true),
            ],
            edges: vec![
                edge("s4", "s0", "tcp"),
                edge("s0", "s9", "http"),
                edge("s4", "s0", "udp"),
                edge("s9", "s9", "SF"),
            ],
        }
    }

    #[test]
    fn test_parallel_edges_are_grouped_in_order() {
        let groups = group_edges(&sample_graph());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].id, "e0");
        assert_eq!(groups[0].labels, vec!["tcp", "udp"]);
        assert_eq!(groups[0].label, "tcp,\nudp");
        assert!(!groups[0].self_loop);
        assert_eq!(groups[1].source, "s0");
        assert_eq!(groups[1].label, "http");
        assert!(groups[2].self_loop);
    }

    #[test]
    fn test_active_edge_lookup() {
        let groups = group_edges(&sample_graph());
        let active = ActiveEdge {
            source: "s4".to_string(),
            target: "s0".to_string(),
        };
        assert_eq!(
            find_active_edge(&groups, Some(&active)).map(|g| g.id.as_str()),
            Some("e0")
        );

        let missing = ActiveEdge {
            source: "s0".to_string(),
            target: "s4".to_string(),
        };
        assert!(find_active_edge(&groups, Some(&missing)).is_none());
        assert!(find_active_edge(&groups, None).is_none());
    }

    #[test]
    fn test_start_node_prefers_flagged_node() {
        let graph = sample_graph();
        assert_eq!(start_node(&graph).map(|n| n.id.as_str()), Some("s4"));

        let unflagged = GraphData {
            nodes: vec![node("a", false, false), node("b", false, false)],
            edges: vec![],
        };
        assert_eq!(start_node(&unflagged).map(|n| n.id.as_str()), Some("a"));
        assert!(start_node(&GraphData::default()).is_none());
    }

    #[test]
    fn test_accepting_lookup() {
        let graph = sample_graph();
        assert!(is_accepting(&graph, "s9"));
        assert!(!is_accepting(&graph, "s4"));
        assert!(!is_accepting(&graph, "missing"));
    }
}
