//! Structural passes over the composed tree.
//!
//! Passes run in a fixed order: lift, inline, sort, tag case, root wrap.
//! Each pass is total and pure; which ones run is decided by the
//! configuration. The root wrap comes last so the synthetic root keeps its
//! configured name verbatim and its children stay where the passes put
//! them.

mod case;
mod inline;
mod lift;
mod sort;

pub use case::rename_tags;
pub use inline::inline_common;
pub use lift::lift_to_root;
pub use sort::sort_to_bottom;

use crate::config::Config;
use crate::node::{Element, Node};

/// Apply every configured pass in order.
pub fn apply(mut nodes: Vec<Node>, config: &Config) -> Vec<Node> {
    if config.structure.lift_all_tags_to_root {
        nodes = lift_to_root(nodes);
    }
    if config.structure.inline_common_tags {
        nodes = inline_common(nodes);
    }
    if !config.structure.sort_tags_to_bottom.is_empty() {
        nodes = sort_to_bottom(nodes, &config.structure.sort_tags_to_bottom);
    }
    nodes = rename_tags(nodes, config.output.tag_case);
    if config.output.include_root_tag {
        let mut root = Element::new(&config.output.root_tag_name);
        root.children = nodes;
        nodes = vec![Node::Element(root)];
    }
    nodes
}
