//! The inline pass: merge same-name sibling elements.

use crate::node::Node;

/// Merge sibling elements that share a tag name into the first
/// occurrence, at its position, then recurse into every surviving
/// element so freshly joined children merge too.
///
/// Attributes come from the first occurrence; children are concatenated
/// in sibling order. Text nodes are never grouped.
pub fn inline_common(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    for node in nodes {
        match node {
            Node::Element(el) => {
                let existing = out.iter_mut().find_map(|n| match n {
                    Node::Element(e) if e.name == el.name => Some(e),
                    _ => None,
                });
                match existing {
                    Some(first) => first.children.extend(el.children),
                    None => out.push(Node::Element(el)),
                }
            }
            text => out.push(text),
        }
    }
    for node in &mut out {
        if let Node::Element(el) = node {
            el.children = inline_common(std::mem::take(&mut el.children));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;

    fn el(name: &str, children: Vec<Node>) -> Node {
        let mut element = Element::new(name);
        element.children = children;
        Node::Element(element)
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn adjacent_siblings_merge() {
        let merged = inline_common(vec![el("a", vec![text("1")]), el("a", vec![text("2")])]);
        assert_eq!(merged, vec![el("a", vec![text("1"), text("2")])]);
    }

    #[test]
    fn merge_happens_at_the_first_position() {
        let merged = inline_common(vec![
            el("a", vec![text("1")]),
            el("b", vec![]),
            el("a", vec![text("2")]),
        ]);
        assert_eq!(
            merged,
            vec![el("a", vec![text("1"), text("2")]), el("b", vec![])]
        );
    }

    #[test]
    fn attributes_come_from_the_first_occurrence() {
        let mut first = Element::new("a");
        first.attrs.push(("keep".to_string(), "yes".to_string()));
        let mut second = Element::new("a");
        second.attrs.push(("drop".to_string(), "yes".to_string()));

        let merged = inline_common(vec![Node::Element(first), Node::Element(second)]);
        let [Node::Element(a)] = &merged[..] else {
            panic!("expected one element");
        };
        assert_eq!(a.attrs, vec![("keep".to_string(), "yes".to_string())]);
    }

    #[test]
    fn joined_children_merge_recursively() {
        let merged = inline_common(vec![
            el("a", vec![el("b", vec![text("1")])]),
            el("a", vec![el("b", vec![text("2")])]),
        ]);
        assert_eq!(
            merged,
            vec![el("a", vec![el("b", vec![text("1"), text("2")])])]
        );
    }

    #[test]
    fn singletons_still_recurse() {
        let merged = inline_common(vec![el(
            "a",
            vec![el("b", vec![text("1")]), el("b", vec![text("2")])],
        )]);
        assert_eq!(merged, vec![el("a", vec![el("b", vec![text("1"), text("2")])])]);
    }

    #[test]
    fn pass_is_idempotent() {
        let tree = vec![
            el("a", vec![el("b", vec![text("1")])]),
            text("between"),
            el("a", vec![el("b", vec![text("2")])]),
        ];
        let once = inline_common(tree);
        let twice = inline_common(once.clone());
        assert_eq!(once, twice);
    }
}
