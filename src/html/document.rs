//! Lookup index over a parsed page.
//!
//! A [`Document`] is built once per loaded template and never changes
//! afterwards, so it can be shared by every session without locking. It
//! stores [`NodeId`]s into the tree it was built from and does not own any
//! node. Resolving an id against a different tree is refused.
//!
//! Keyed tables hold one entry per key. When a template declares the same
//! key twice, the entry written last in document order wins.

use std::collections::HashMap;

use thiserror::Error;

use crate::html::render::TagCallback;
use crate::html::tree::{Element, NodeId, TagTree, TreeId};

/// Failure of a lookup that must succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No element declared this `id` attribute.
    #[error("tag with id \"{0}\" not found")]
    IdNotFound(String),

    /// A node id was resolved against a tree other than the indexed one.
    #[error("node does not belong to the indexed tree")]
    ForeignTree,
}

pub struct Document {
    tree: TreeId,

    head: Option<NodeId>,
    title: Option<NodeId>,
    description: Option<NodeId>,
    canonical_link: Option<NodeId>,

    by_id: HashMap<String, NodeId>,
    by_name: HashMap<String, NodeId>,
    by_form_action: HashMap<String, NodeId>,

    default_callback: TagCallback,
}

impl Document {
    /// Indexes `tree` in one depth-first pass.
    pub fn build(tree: &TagTree, default_callback: TagCallback) -> Self {
        let mut doc = Self {
            tree: tree.id(),
            head: None,
            title: None,
            description: None,
            canonical_link: None,
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            by_form_action: HashMap::new(),
            default_callback,
        };

        // (node, inside <head>)
        let mut stack = vec![(tree.root(), false)];
        while let Some((id, in_head)) = stack.pop() {
            let mut child_in_head = in_head;

            if let Some(el) = tree.element(id) {
                doc.record(id, el, in_head);
                child_in_head |= el.is("head");
            }

            stack.extend(
                tree.children(id)
                    .iter()
                    .rev()
                    .map(|child| (*child, child_in_head)),
            );
        }

        tracing::debug!(
            nodes = tree.len(),
            ids = doc.by_id.len(),
            names = doc.by_name.len(),
            forms = doc.by_form_action.len(),
            "Document indexed"
        );

        doc
    }

    fn record(&mut self, id: NodeId, el: &Element, in_head: bool) {
        match el.name.as_str() {
            "head" => self.head = Some(id),
            "title" if in_head => self.title = Some(id),
            "meta" if in_head && is_description(el) => self.description = Some(id),
            "link" if in_head && is_canonical(el) => self.canonical_link = Some(id),
            "form" => {
                if let Some(action) = el.attr("action") {
                    self.by_form_action.insert(action.to_string(), id);
                }
            }
            _ => {}
        }

        if let Some(key) = el.attr("id") {
            self.by_id.insert(key.to_string(), id);
        }
        if let Some(key) = el.attr("name") {
            self.by_name.insert(key.to_string(), id);
        }
    }

    /// Element declaring `id="..."`.
    ///
    /// An unknown id means the handler and the template disagree, so this
    /// is an error rather than `None`.
    pub fn tag_by_id(&self, id: &str) -> Result<NodeId, LookupError> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| LookupError::IdNotFound(id.to_string()))
    }

    pub fn tag_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn tag_by_form_action(&self, action: &str) -> Option<NodeId> {
        self.by_form_action.get(action).copied()
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn title(&self) -> Option<NodeId> {
        self.title
    }

    /// `<meta name="description">` inside `<head>`.
    pub fn description(&self) -> Option<NodeId> {
        self.description
    }

    /// `<link rel="canonical">` inside `<head>`.
    pub fn canonical_link(&self) -> Option<NodeId> {
        self.canonical_link
    }

    pub fn default_callback(&self) -> &TagCallback {
        &self.default_callback
    }

    pub fn tree_id(&self) -> TreeId {
        self.tree
    }

    /// Resolves `id` to its element in `tree`, which must be the tree this
    /// index was built from.
    pub fn element<'t>(
        &self,
        tree: &'t TagTree,
        id: NodeId,
    ) -> Result<Option<&'t Element>, LookupError> {
        if tree.id() != self.tree {
            return Err(LookupError::ForeignTree);
        }
        Ok(tree.element(id))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("tree", &self.tree)
            .field("head", &self.head)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("canonical_link", &self.canonical_link)
            .field("by_id", &self.by_id)
            .field("by_name", &self.by_name)
            .field("by_form_action", &self.by_form_action)
            .finish_non_exhaustive()
    }
}

fn is_canonical(el: &Element) -> bool {
    el.attr("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("canonical"))
        })
        .unwrap_or(false)
}

/// `<meta name>` values compare ASCII case-insensitively.
fn is_description(el: &Element) -> bool {
    el.attr("name")
        .is_some_and(|name| name.eq_ignore_ascii_case("description"))
}
