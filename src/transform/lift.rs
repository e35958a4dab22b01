//! The lift pass: dissolve structural wrappers, promoting content toward
//! the root.

use crate::node::{Element, Node};

/// Flatten the tree so only text-bearing elements and childless markers
/// remain, in depth-first order.
///
/// An element with children but no direct text is a structural wrapper:
/// it dissolves and its lifted children take its place. An element with
/// direct text keeps that text and emits its lifted element children
/// right after itself. A childless element wraps nothing and survives
/// as-is.
pub fn lift_to_root(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Text(_) => out.push(node),
            Node::Element(el) => lift_element(el, &mut out),
        }
    }
    out
}

fn lift_element(el: Element, out: &mut Vec<Node>) {
    if el.children.is_empty() {
        out.push(Node::Element(el));
        return;
    }
    let Element {
        name,
        attrs,
        children,
    } = el;
    let lifted = lift_to_root(children);

    if lifted.iter().any(|n| matches!(n, Node::Text(_))) {
        let mut kept = Element {
            name,
            attrs,
            children: Vec::new(),
        };
        let mut promoted = Vec::new();
        for node in lifted {
            match node {
                Node::Text(_) => kept.children.push(node),
                Node::Element(_) => promoted.push(node),
            }
        }
        out.push(Node::Element(kept));
        out.extend(promoted);
    } else {
        out.extend(lifted);
    }
}
