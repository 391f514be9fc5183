//! Long-poll loop keeping a [`ViewStore`] in sync with a registry
//!
//! The watcher cycles through three states:
//!
//! - `Polling`: blocked in [`CatalogSource::list_services`] with the last
//!   known index.
//! - `Processing`: extracting display attributes from the listing and
//!   reconciling the store.
//! - `Backoff`: sleeping for the retry interval after a failed call. The
//!   index is kept, so the next call resumes where the last good one ended.

use crate::{
    config::WatcherConfig,
    error::Result,
    models::{CatalogListing, DisplayAttributes},
    source::CatalogSource,
    store::{ReconcileSummary, ViewStore},
};
use async_io::Timer;
use futures::future::{self, Either};
use std::collections::HashMap;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Current phase of the watch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting on the registry
    Polling,
    /// Applying a listing to the store
    Processing,
    /// Pausing after a failed call
    Backoff,
}

/// Watches a catalog source and reconciles a shared view store
pub struct CatalogWatcher<S> {
    source: S,
    store: Arc<ViewStore>,
    config: WatcherConfig,
    last_index: u64,
    state: WatchState,
}

impl<S: CatalogSource> CatalogWatcher<S> {
    /// Create a watcher starting from index zero
    pub fn new(source: S, store: Arc<ViewStore>, config: WatcherConfig) -> Self {
        Self {
            source,
            store,
            config,
            last_index: 0,
            state: WatchState::Polling,
        }
    }

    /// Index the next poll will wait on
    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    /// Current phase
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Store being reconciled
    pub fn store(&self) -> &Arc<ViewStore> {
        &self.store
    }

    /// Run one poll and apply its result.
    ///
    /// On failure the store and index are left untouched and the watcher
    /// is left in `Backoff`; the caller decides whether to sleep.
    pub async fn poll_once(&mut self) -> Result<ReconcileSummary> {
        self.state = WatchState::Polling;

        let listing = match self
            .source
            .list_services(self.last_index, self.config.wait_time)
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                self.state = WatchState::Backoff;
                return Err(e);
            }
        };

        self.state = WatchState::Processing;
        let index = listing.index;
        let summary = self.store.reconcile(self.live_records(listing));

        if summary.has_changes() {
            info!(
                "Catalog index {}: {} services ({} added, {} updated, {} removed)",
                index,
                summary.total(),
                summary.created,
                summary.updated,
                summary.removed
            );
        } else {
            debug!("Catalog index {}: no changes", index);
        }

        // Advance even when unchanged so the next call blocks
        self.last_index = index;
        self.state = WatchState::Polling;
        Ok(summary)
    }

    /// Run one poll, sleeping for the retry interval if it failed
    pub async fn step(&mut self) -> Result<ReconcileSummary> {
        let result = self.poll_once().await;
        if let Err(e) = &result {
            warn!(
                "Listing catalog services failed: {}; retrying in {:?}",
                e, self.config.retry_interval
            );
            Timer::after(self.config.retry_interval).await;
            self.state = WatchState::Polling;
        }
        result
    }

    /// Watch forever
    pub async fn run(mut self) {
        info!("Watching catalog for services");
        loop {
            let _ = self.step().await;
        }
    }

    /// Watch until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let run = pin!(self.run());
        let shutdown = pin!(shutdown);
        if let Either::Right(_) = future::select(run, shutdown).await {
            info!("Catalog watcher stopped");
        }
    }

    fn live_records(&self, listing: CatalogListing) -> HashMap<String, DisplayAttributes> {
        listing
            .services
            .into_iter()
            .filter_map(|(key, tags)| {
                let attrs = self.config.keys.extract(&tags);
                attrs.is_complete().then_some((key, attrs))
            })
            .collect()
    }
}
