//! HTTP server for the dashboard page

use crate::config::DashboardConfig;
use crate::render::render_page;
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::response::Html;
use service_catalog::{CatalogWatcher, ConsulCatalog, ViewStore};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router: every path and method renders the dashboard
pub fn router(store: Arc<ViewStore>) -> Router {
    Router::new()
        .fallback(dashboard)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn dashboard(State(store): State<Arc<ViewStore>>) -> Html<String> {
    Html(render_page(&store.snapshot()))
}

/// Serve the dashboard on `listener` until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, store: Arc<ViewStore>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Watch Consul and serve the dashboard until Ctrl-C
pub async fn run(config: DashboardConfig) -> Result<()> {
    let addr = config.resolve_listen_addr()?;
    let watcher_config = config.watch.watcher_config()?;
    let source = ConsulCatalog::new(config.consul.clone())
        .context("Failed to create Consul client")?;
    info!("Watching Consul at {}", source.base_url());

    let store = Arc::new(ViewStore::new());
    let watcher = CatalogWatcher::new(source, store.clone(), watcher_config);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let watcher_task = tokio::spawn(watcher.run_until(async move {
        let _ = stop_rx.await;
    }));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);

    let served = serve(listener, store, shutdown_signal()).await;

    let _ = stop_tx.send(());
    if let Err(e) = watcher_task.await {
        error!("Catalog watcher task failed: {}", e);
    }
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            // Without a signal handler, run until killed
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
