use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use vein::config::Config;
use vein::html::{Page, render};
use vein::router::{PageRouter, page_handler};
use vein::server::Listener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let router = load_pages(&cfg)?;
    if router.is_empty() {
        warn!("No pages configured, every request will get 404");
    }

    let listener = Listener::bind(cfg.listen_addr()?, router, cfg.server.backlog)?;
    let accept = listener.run();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    listener.shutdown();
    accept.await?;

    let grace = Duration::from_secs(cfg.server.shutdown_grace_secs);
    if tokio::time::timeout(grace, listener.drained()).await.is_err() {
        warn!(
            active = listener.active_sessions(),
            "Sessions still open after the grace period, closing them"
        );
    }

    Ok(())
}

fn load_pages(cfg: &Config) -> anyhow::Result<PageRouter> {
    let mut router = PageRouter::new();

    for page_cfg in &cfg.pages {
        let page = Page::load(&page_cfg.template, render::as_written())?;

        // Catch template/config mismatches before serving anything.
        for id in page_cfg.text.keys() {
            let node = page
                .document()
                .tag_by_id(id)
                .with_context(|| format!("route {}", page_cfg.route))?;
            let void = page
                .tree()
                .element(node)
                .filter(|el| render::is_void_element(&el.name));
            if let Some(el) = void {
                warn!(
                    route = %page_cfg.route,
                    id = %id,
                    tag = %el.name,
                    "Configured text targets a void element and will not be rendered"
                );
            }
        }

        router = router.page(page_cfg.route.clone(), Arc::new(page), page_handler(page_cfg));
        info!(route = %page_cfg.route, "Page registered");
    }

    Ok(router)
}
