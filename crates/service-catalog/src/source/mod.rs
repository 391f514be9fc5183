//! Registry sources the watcher can long-poll

pub mod consul;
pub mod memory;

use crate::{error::Result, models::CatalogListing};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use consul::ConsulCatalog;
pub use memory::MemoryCatalog;

/// Trait for registries that can list services with long-poll semantics
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every registered service with its tags.
    ///
    /// Returns promptly when the registry changed since `wait_index`,
    /// otherwise blocks for up to `wait_time` and returns the unchanged
    /// listing. A `wait_index` of zero never blocks.
    async fn list_services(&self, wait_index: u64, wait_time: Duration) -> Result<CatalogListing>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn list_services(&self, wait_index: u64, wait_time: Duration) -> Result<CatalogListing> {
        (**self).list_services(wait_index, wait_time).await
    }
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    async fn list_services(&self, wait_index: u64, wait_time: Duration) -> Result<CatalogListing> {
        (**self).list_services(wait_index, wait_time).await
    }
}
