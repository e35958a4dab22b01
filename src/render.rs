//! XML serialization of the composed tree.
//!
//! Escaping is handled entirely by quick-xml: node text and attribute
//! values are stored raw and encoded here. Elements without children
//! render self-closing.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::ComposeError;
use crate::node::{Element, Node};

/// Serialize top-level nodes as indented XML.
///
/// Sibling elements each start on their own line; an element whose only
/// children are text renders on one line. The result carries no trailing
/// newline.
pub fn render(nodes: &[Node], indent_width: usize) -> Result<String, ComposeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent_width);
    for node in nodes {
        write_node(&mut writer, node).map_err(ComposeError::Render)?;
    }
    let bytes = writer.into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> io::Result<()> {
    match node {
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        Node::Element(element) => write_element(writer, element),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}
