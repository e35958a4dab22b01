//! The composed document tree: text and element nodes.

/// One node of the composed tree. Child order is rendering order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal character data. Escaping happens at render time.
    Text(String),
    /// An element with ordered attributes and children.
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An element containing a single text child.
    pub fn with_text(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: vec![Node::Text(text.to_string())],
        }
    }

    /// True if any direct child is a text node.
    pub fn has_direct_text(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Text(_)))
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}
