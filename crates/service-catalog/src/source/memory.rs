//! In-memory registry with long-poll semantics

use super::CatalogSource;
use crate::{
    error::{Error, Result},
    models::CatalogListing,
};
use async_io::Timer;
use async_trait::async_trait;
use futures::future::{self, Either};
use std::collections::HashMap;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// In-memory registry.
///
/// Every mutation bumps the index and wakes blocked pollers, so watchers
/// see the same behavior they would against a real registry.
pub struct MemoryCatalog {
    inner: Mutex<Inner>,
}

struct Inner {
    services: HashMap<String, Vec<String>>,
    index: u64,
    unavailable: Option<String>,
    waiters: Vec<async_channel::Sender<()>>,
    calls: usize,
    last_wait_index: Option<u64>,
}

impl Inner {
    fn listing(&self) -> CatalogListing {
        CatalogListing::new(self.services.clone(), self.index)
    }

    fn bump(&mut self) {
        self.index += 1;
        for waiter in self.waiters.drain(..) {
            let _ = waiter.try_send(());
        }
    }
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                services: HashMap::new(),
                index: 1,
                unavailable: None,
                waiters: Vec::new(),
                calls: 0,
                last_wait_index: None,
            }),
        }
    }

    /// Register or replace a service and its tags
    pub fn register<I, S>(&self, id: impl Into<String>, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let tags = tags.into_iter().map(Into::into).collect();
        let mut inner = self.lock();
        debug!("Registering {} in memory catalog", id);
        inner.services.insert(id, tags);
        inner.bump();
    }

    /// Remove a service. Returns whether it was registered.
    pub fn deregister(&self, id: &str) -> bool {
        let mut inner = self.lock();
        let removed = inner.services.remove(id).is_some();
        if removed {
            debug!("Deregistering {} from memory catalog", id);
            inner.bump();
        }
        removed
    }

    /// Make every call fail with the given reason, or recover with `None`
    pub fn set_unavailable(&self, reason: Option<impl Into<String>>) {
        self.lock().unavailable = reason.map(Into::into);
    }

    /// Current index
    pub fn index(&self) -> u64 {
        self.lock().index
    }

    /// Number of `list_services` calls so far
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Wait index passed to the most recent `list_services` call
    pub fn last_wait_index(&self) -> Option<u64> {
        self.lock().last_wait_index
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn list_services(&self, wait_index: u64, wait_time: Duration) -> Result<CatalogListing> {
        let changed = {
            let mut inner = self.lock();
            inner.calls += 1;
            inner.last_wait_index = Some(wait_index);

            if let Some(reason) = &inner.unavailable {
                return Err(Error::Unavailable(reason.clone()));
            }
            if wait_index == 0 || wait_index < inner.index {
                return Ok(inner.listing());
            }

            // Pollers that timed out dropped their receiver
            inner.waiters.retain(|w| !w.is_closed());
            let (tx, rx) = async_channel::bounded(1);
            inner.waiters.push(tx);
            rx
        };

        let recv = pin!(changed.recv());
        match future::select(recv, Timer::after(wait_time)).await {
            Either::Left(_) => debug!("Memory catalog changed past index {}", wait_index),
            Either::Right(_) => debug!("Memory catalog wait at index {} timed out", wait_index),
        }

        Ok(self.lock().listing())
    }
}
