//! Service dashboard
//!
//! Serves a single HTML page linking to every Consul service that carries
//! `dashboard.service.name` and `dashboard.service.address` tags. The list
//! is kept current by a [`service_catalog::CatalogWatcher`] long-polling
//! the Consul catalog in the background.
//!
//! # Example
//!
//! ```no_run
//! use dashboard::config::DashboardConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     dashboard::logging::init();
//!     dashboard::server::run(DashboardConfig::default()).await
//! }
//! ```

pub mod config;
pub mod logging;
pub mod render;
pub mod server;

pub use config::{DashboardConfig, Overrides};
pub use render::render_page;
pub use server::{router, run, serve};

// Re-export commonly used error types
pub use anyhow::{Error, Result};
