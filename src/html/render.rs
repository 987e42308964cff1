//! Per-request rendering over an immutable page.
//!
//! A [`Render`] borrows the tree and its index and collects the dynamic
//! values for one response. Nothing in the page is modified; `finish`
//! serializes the tree with the collected values substituted in.

use std::collections::HashMap;
use std::sync::Arc;

use crate::html::document::Document;
use crate::html::tree::{Element, NodeId, NodeKind, TagTree};

/// Decides how one element is written out.
pub type TagCallback = Arc<dyn Fn(&Element) -> Rendering + Send + Sync>;

/// Changes applied to an element while it is serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendering {
    /// Attribute overrides. Existing attributes are replaced in place,
    /// unknown ones are appended.
    pub attributes: Vec<(String, String)>,
    /// Replaces all children with this text (escaped on output).
    pub text: Option<String>,
}

impl Rendering {
    /// Writes the element exactly as parsed.
    pub fn as_written() -> Self {
        Self::default()
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    fn merge(&mut self, other: &Rendering) {
        for (k, v) in &other.attributes {
            self.set_attr(k.clone(), v.clone());
        }
        if other.text.is_some() {
            self.text = other.text.clone();
        }
    }
}

/// Default policy: leave every element untouched.
pub fn as_written() -> TagCallback {
    Arc::new(|_: &Element| Rendering::as_written())
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Elements written without children or an end tag. Text set on one of
/// these is never written.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub struct Render<'p> {
    tree: &'p TagTree,
    document: &'p Document,
    overrides: HashMap<NodeId, Rendering>,
    callbacks: HashMap<NodeId, TagCallback>,
}

impl<'p> Render<'p> {
    pub(crate) fn new(tree: &'p TagTree, document: &'p Document) -> Self {
        debug_assert_eq!(tree.id(), document.tree_id());
        Self {
            tree,
            document,
            overrides: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }

    pub fn document(&self) -> &'p Document {
        self.document
    }

    pub fn tree(&self) -> &'p TagTree {
        self.tree
    }

    /// Replaces the children of `node` with escaped text.
    ///
    /// Has no effect on void elements such as `<input>` or `<meta>`, which
    /// have no children to replace; use [`set_attr`](Self::set_attr) there.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> &mut Self {
        self.overrides.entry(node).or_default().text = Some(text.into());
        self
    }

    pub fn set_attr(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.overrides.entry(node).or_default().set_attr(name, value);
        self
    }

    /// Registers a callback for `node`, used instead of the document's
    /// default callback. Explicit `set_text`/`set_attr` values still win.
    pub fn with_callback(&mut self, node: NodeId, callback: TagCallback) -> &mut Self {
        self.callbacks.insert(node, callback);
        self
    }

    /// Serializes the page with all substitutions applied.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.tree.len() * 16);
        for child in self.tree.children(self.tree.root()) {
            self.write_node(*child, false, &mut out);
        }
        out
    }

    fn rendering_for(&self, node: NodeId, el: &Element) -> Rendering {
        let mut rendering = match self.callbacks.get(&node) {
            Some(callback) => callback(el),
            None => (self.document.default_callback())(el),
        };
        if let Some(explicit) = self.overrides.get(&node) {
            rendering.merge(explicit);
        }
        rendering
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        let Some(node) = self.tree.get(id) else {
            return;
        };

        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.write_node(*child, raw_text, out);
                }
            }
            NodeKind::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeKind::Element(el) => self.write_element(id, el, &node.children, out),
        }
    }

    fn write_element(&self, id: NodeId, el: &Element, children: &[NodeId], out: &mut String) {
        let rendering = self.rendering_for(id, el);

        out.push('<');
        out.push_str(&el.name);
        for (name, value) in &el.attributes {
            let value = rendering
                .attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v)
                .unwrap_or(value);
            write_attr(name, value, out);
        }
        for (name, value) in &rendering.attributes {
            if el.attr(name).is_none() {
                write_attr(name, value, out);
            }
        }
        out.push('>');

        if is_void_element(&el.name) {
            return;
        }

        match &rendering.text {
            Some(text) => escape_text(text, out),
            None => {
                let raw_text = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
                for child in children {
                    self.write_node(*child, raw_text, out);
                }
            }
        }

        out.push_str("</");
        out.push_str(&el.name);
        out.push('>');
    }
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_handles_markup() {
        let mut out = String::new();
        escape_text("a < b & c > d", &mut out);
        assert_eq!(out, "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn rendering_set_attr_replaces_existing() {
        let mut r = Rendering::default();
        r.set_attr("value", "1");
        r.set_attr("value", "2");
        assert_eq!(r.attributes, vec![("value".to_string(), "2".to_string())]);
    }

    #[test]
    fn void_elements_are_recognised() {
        assert!(is_void_element("input"));
        assert!(is_void_element("meta"));
        assert!(!is_void_element("textarea"));
    }
}
