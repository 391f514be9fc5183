//! Runtime-agnostic live view of a service catalog
//!
//! This crate keeps an in-memory list of "named, addressable services" in
//! sync with an external registry. Services opt in by carrying two tags:
//! one with a display name and one with an address. Everything else in the
//! registry is ignored.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is a registry that can be long-polled for its full
//!   service listing ([`ConsulCatalog`], [`MemoryCatalog`]).
//! - [`CatalogWatcher`] drives the long-poll loop and reconciles a
//!   [`ViewStore`] after every answer.
//! - [`ViewStore`] is shared between the watcher (the only writer) and any
//!   number of readers taking sorted snapshots.
//!
//! The watcher only needs an executor to be polled on; it sleeps with
//! `async-io` timers, so it runs on tokio, smol or async-std alike.
//!
//! # Example
//!
//! ```no_run
//! use service_catalog::{CatalogWatcher, ConsulCatalog, ConsulConfig, ViewStore, WatcherConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> service_catalog::Result<()> {
//! let store = Arc::new(ViewStore::new());
//! let source = ConsulCatalog::new(ConsulConfig::default())?;
//! let watcher = CatalogWatcher::new(source, store.clone(), WatcherConfig::default());
//!
//! // User chooses how to run the watcher
//! // e.g., tokio::spawn(watcher.run()), smol::spawn(watcher.run()).detach()
//! # drop(watcher);
//! for service in store.snapshot() {
//!     println!("{} -> {}", service.name, service.address);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod attributes;
pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod store;
pub mod watcher;

pub use attributes::AttributeKeys;
pub use config::{ConsulConfig, WatcherConfig};
pub use error::{Error, Result};
pub use models::{CatalogListing, DisplayAttributes, ServiceEntry};
pub use source::{CatalogSource, ConsulCatalog, MemoryCatalog};
pub use store::{ReconcileSummary, ViewStore};
pub use watcher::{CatalogWatcher, WatchState};

/// Re-export key types for convenience
pub mod prelude {
    pub use crate::{
        CatalogSource,
        CatalogWatcher,
        ServiceEntry,
        ViewStore,
        WatcherConfig,
        Error,
        Result,
    };
}
