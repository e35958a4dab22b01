//! The sort pass: push listed tags to the bottom of every sibling list.

use crate::node::Node;

/// Partition each sibling list into unlisted-then-listed and recurse.
///
/// Unlisted nodes (text included) keep their relative order. Listed
/// elements are ordered by their position in `priority`, not by where
/// they appeared in the source; ties keep source order.
pub fn sort_to_bottom(nodes: Vec<Node>, priority: &[String]) -> Vec<Node> {
    let mut unlisted = Vec::new();
    let mut listed: Vec<(usize, Node)> = Vec::new();
    for node in nodes {
        let rank = match &node {
            Node::Element(el) => priority.iter().position(|tag| *tag == el.name),
            Node::Text(_) => None,
        };
        match rank {
            Some(rank) => listed.push((rank, node)),
            None => unlisted.push(node),
        }
    }
    listed.sort_by_key(|(rank, _)| *rank);

    let mut out = unlisted;
    out.extend(listed.into_iter().map(|(_, node)| node));
    for node in &mut out {
        if let Node::Element(el) = node {
            el.children = sort_to_bottom(std::mem::take(&mut el.children), priority);
        }
    }
    out
}
