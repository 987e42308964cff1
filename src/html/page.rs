use std::path::Path;

use anyhow::Context;

use crate::html::document::Document;
use crate::html::parse::parse_document;
use crate::html::render::{Render, TagCallback};
use crate::html::tree::TagTree;

/// A loaded template: the parsed tree together with its index.
///
/// Keeping both in one value ties the index to the tree it points into.
/// Reloading a template means building a new `Page`.
#[derive(Debug)]
pub struct Page {
    tree: TagTree,
    document: Document,
}

impl Page {
    pub fn from_html(html: &str, default_callback: TagCallback) -> anyhow::Result<Self> {
        let tree = parse_document(html)?;
        let document = Document::build(&tree, default_callback);
        Ok(Self { tree, document })
    }

    pub fn load(path: impl AsRef<Path>, default_callback: TagCallback) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display()))?;

        let page = Self::from_html(&html, default_callback)?;
        tracing::info!(template = %path.display(), nodes = page.tree.len(), "Template loaded");
        Ok(page)
    }

    pub fn tree(&self) -> &TagTree {
        &self.tree
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Starts a render overlay for one response.
    pub fn render(&self) -> Render<'_> {
        Render::new(&self.tree, &self.document)
    }
}
