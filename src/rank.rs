// src/rank.rs
// =============================================================================
// Orders nodes by (location bucket, latency).
//
// Bucket = position of the node's location in the priority list, compared
// case-insensitively. Nodes without a location, or with one that is not in
// the list, all share the last bucket.
//
// Inside a bucket, lower latency wins and a measured node beats an unmeasured
// one. When latencies are missing on both sides (probing was skipped) nodes
// compare equal and, because the sort is stable, keep the order they were
// decoded in. That keeps runs without probing reproducible.
// =============================================================================

use std::cmp::Ordering;

use crate::node::Node;

// Sorts the nodes and hands them back
//
// Parameters:
//   nodes: decoded (and possibly probed) nodes, in decode order
//   priority: preferred location codes, best first
pub fn rank_nodes(mut nodes: Vec<Node>, priority: &[String]) -> Vec<Node> {
    // slice::sort_by is a stable merge sort
    nodes.sort_by(|a, b| {
        bucket(a, priority)
            .cmp(&bucket(b, priority))
            .then_with(|| compare_latency(a.latency_seconds, b.latency_seconds))
    });
    nodes
}

fn bucket(node: &Node, priority: &[String]) -> usize {
    node.location
        .as_deref()
        .and_then(|loc| priority.iter().position(|code| code.eq_ignore_ascii_case(loc)))
        .unwrap_or(priority.len())
}

// A total order: mixing measured and unmeasured nodes must not break
// transitivity, or sort_by may reorder arbitrarily
fn compare_latency(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
