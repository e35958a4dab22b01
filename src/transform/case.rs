//! The tag-case pass: respell every element name in one style.
//!
//! Only element names change; text content and attributes are never
//! touched. Names split on `-`/`_` and camel boundaries before
//! respelling, so `PipeOperator`, `pipe-operator`, and `pipe_operator`
//! all land on the same spelling.

use crate::config::TagCase;
use crate::node::Node;

/// Recursively rename every element's tag.
pub fn rename_tags(nodes: Vec<Node>, case: TagCase) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Element(mut el) => {
                el.name = convert(&el.name, case);
                el.children = rename_tags(el.children, case);
                Node::Element(el)
            }
            text => text,
        })
        .collect()
}

fn convert(name: &str, case: TagCase) -> String {
    let parts = words(name);
    // A name with no letters or digits has no words to respell.
    if parts.is_empty() && !matches!(case, TagCase::Alternating) {
        return name.to_string();
    }
    match case {
        TagCase::Kebab => parts.join("-"),
        TagCase::Pascal => parts.iter().map(|w| capitalize(w)).collect(),
        TagCase::Shout => parts
            .iter()
            .map(|w| w.to_uppercase())
            .collect::<Vec<_>>()
            .join("-"),
        TagCase::Alternating => alternate(name),
    }
}

/// Split on `-`/`_` and camel boundaries, lowercasing each word. A camel
/// boundary sits before an uppercase letter following a lowercase one, or
/// at the end of an uppercase run followed by a lowercase letter (so
/// `HTTPServer` splits as http/server).
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut parts = Vec::new();
    let mut buf = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '_' {
            if !buf.is_empty() {
                parts.push(std::mem::take(&mut buf));
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 && !buf.is_empty() {
            let prev = chars[i - 1];
            let boundary = prev.is_ascii_lowercase()
                || (prev.is_ascii_uppercase()
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase()));
            if boundary {
                parts.push(std::mem::take(&mut buf));
            }
        }
        buf.extend(c.to_lowercase());
    }
    if !buf.is_empty() {
        parts.push(buf);
    }
    parts
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Toggle letter case along the name, starting lowercase. Separators pass
/// through without resetting the toggle, so the rhythm carries across
/// them.
fn alternate(name: &str) -> String {
    let mut upper = false;
    name.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                let mapped = if upper {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                };
                upper = !upper;
                mapped
            } else {
                c
            }
        })
        .collect()
}
