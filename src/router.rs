//! Request routing.
//!
//! The listener hands every session a shared handle to one [`Router`]. The
//! page router serves loaded templates and is the only path by which
//! request handling reaches a [`Document`](crate::html::Document).

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PageConfig;
use crate::html::{Page, Render};
use crate::http::request::{Method, Request};
use crate::http::response::Response;

/// Maps a parsed request to a response.
///
/// Called concurrently from every session, so implementations must not
/// need `&mut self`.
pub trait Router: Send + Sync + 'static {
    fn route(&self, request: &Request) -> Response;
}

impl<F> Router for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn route(&self, request: &Request) -> Response {
        self(request)
    }
}

/// Fills the dynamic parts of a page for one request.
pub type PageHandler =
    Arc<dyn Fn(&Request, &mut Render<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Wraps a closure as a [`PageHandler`].
pub fn handler<F>(f: F) -> PageHandler
where
    F: Fn(&Request, &mut Render<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

struct Route {
    page: Arc<Page>,
    handler: PageHandler,
}

/// Serves templates by exact path.
#[derive(Default)]
pub struct PageRouter {
    routes: HashMap<String, Route>,
}

impl PageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `page` at `path`. A later registration for the same path
    /// replaces the earlier one.
    pub fn page(mut self, path: impl Into<String>, page: Arc<Page>, handler: PageHandler) -> Self {
        self.routes.insert(path.into(), Route { page, handler });
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Router for PageRouter {
    fn route(&self, request: &Request) -> Response {
        let Some(route) = self.routes.get(request.path_only()) else {
            return Response::not_found();
        };

        if !request.method.is_read() {
            return Response::method_not_allowed();
        }

        let mut render = route.page.render();
        if let Err(e) = (route.handler)(request, &mut render) {
            tracing::error!(
                path = %request.path,
                error = %e,
                "Page handler failed"
            );
            return Response::internal_error();
        }

        let response = Response::html(render.finish());
        match request.method {
            Method::HEAD => response.without_body(),
            _ => response,
        }
    }
}

/// Handler driven by a page's configuration.
///
/// Fills the title and description slots, points the canonical link at the
/// request path, writes the configured text into elements by id, and copies
/// query parameters into the `input`, `select` or `textarea` carrying the
/// same `name`. Slots the template lacks are skipped.
pub fn page_handler(cfg: &PageConfig) -> PageHandler {
    let cfg = cfg.clone();

    handler(move |req, render| {
        let doc = render.document();

        if let (Some(node), Some(title)) = (doc.title(), &cfg.title) {
            render.set_text(node, title.clone());
        }
        if let (Some(node), Some(description)) = (doc.description(), &cfg.description) {
            render.set_attr(node, "content", description.clone());
        }
        if let (Some(node), Some(base)) = (doc.canonical_link(), &cfg.canonical_base) {
            let href = format!("{}{}", base.trim_end_matches('/'), req.path_only());
            render.set_attr(node, "href", href);
        }

        for (id, text) in &cfg.text {
            let node = doc.tag_by_id(id)?;
            render.set_text(node, text.clone());
        }

        for (name, value) in req.query_pairs() {
            let Some(node) = doc.tag_by_name(&name) else {
                continue;
            };
            match render.tree().element(node) {
                Some(el) if el.is("textarea") => render.set_text(node, value.into_owned()),
                Some(el) if el.is("input") || el.is("select") => {
                    render.set_attr(node, "value", value.into_owned())
                }
                // Other named elements (meta, iframe, ...) are not fields.
                _ => continue,
            };
        }

        Ok(())
    })
}
