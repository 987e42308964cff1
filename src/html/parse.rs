//! HTML5 parsing using html5ever.
//!
//! The parser builds an `RcDom` first and then copies it into the
//! [`TagTree`] arena in a single recursive pass.

use crate::html::tree::{Element, NodeId, NodeKind, TagTree};
use anyhow::Context;
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document as parse_rcdom};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parses a complete HTML document into a fresh tag tree.
pub fn parse_document(html: &str) -> anyhow::Result<TagTree> {
    let dom: RcDom = parse_rcdom(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .context("failed to parse HTML document")?;

    let mut tree = TagTree::new();
    let root = tree.root();
    for child in dom.document.children.borrow().iter() {
        convert_node(&mut tree, child, root);
    }

    Ok(tree)
}

fn convert_node(tree: &mut TagTree, handle: &Handle, parent: NodeId) {
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                convert_node(tree, child, parent);
            }
        }

        NodeData::Doctype { name, .. } => {
            tree.append(parent, NodeKind::Doctype(name.to_string()));
        }

        NodeData::Text { contents } => {
            tree.append(parent, NodeKind::Text(contents.borrow().to_string()));
        }

        NodeData::Comment { contents } => {
            tree.append(parent, NodeKind::Comment(contents.to_string()));
        }

        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let mut element = Element::new(name.local.to_string());
            element.attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();

            let node = tree.append(parent, NodeKind::Element(element));
            for child in handle.children.borrow().iter() {
                convert_node(tree, child, node);
            }
            // <template> keeps its children in a separate fragment.
            if let Some(contents) = template_contents.borrow().as_ref() {
                convert_node(tree, contents, node);
            }
        }

        // Not meaningful in an HTML document.
        NodeData::ProcessingInstruction { .. } => {}
    }
}
