//! In-memory view of the services currently shown on the dashboard

use crate::models::{DisplayAttributes, ServiceEntry};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Outcome of a single reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Entries that did not exist before
    pub created: usize,
    /// Existing entries whose name or address changed
    pub updated: usize,
    /// Existing entries that stayed identical
    pub unchanged: usize,
    /// Entries that were dropped
    pub removed: usize,
}

impl ReconcileSummary {
    /// Whether the pass changed the visible membership or any field
    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0 || self.removed > 0
    }

    /// Number of entries in the store after the pass
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// Shared view of the registry, keyed by registry service identifier.
///
/// The watcher is the only writer. Readers take snapshots, which are
/// independent copies sorted by display name.
#[derive(Debug, Default)]
pub struct ViewStore {
    entries: RwLock<HashMap<String, ServiceEntry>>,
}

impl ViewStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the store's membership match `live` exactly.
    ///
    /// Records that are not complete count as absent. The whole pass runs
    /// under one write lock, so readers see either the state before or the
    /// state after it.
    pub fn reconcile(&self, live: HashMap<String, DisplayAttributes>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let live: HashMap<String, DisplayAttributes> = live
            .into_iter()
            .filter(|(_, attrs)| attrs.is_complete())
            .collect();

        let mut entries = self.write();

        entries.retain(|key, _| {
            let keep = live.contains_key(key);
            if !keep {
                trace!("Removing service {}", key);
                summary.removed += 1;
            }
            keep
        });

        for (key, attrs) in live {
            match entries.get_mut(&key) {
                Some(entry) => {
                    if entry.name == attrs.name && entry.address == attrs.address {
                        summary.unchanged += 1;
                    } else {
                        trace!("Updating service {}", key);
                        entry.name = attrs.name;
                        entry.address = attrs.address;
                        summary.updated += 1;
                    }
                }
                None => {
                    trace!("Adding service {}", key);
                    let entry = ServiceEntry::new(key.clone(), attrs.name, attrs.address);
                    entries.insert(key, entry);
                    summary.created += 1;
                }
            }
        }

        summary
    }

    /// Copy out every entry, ordered by name.
    ///
    /// Names compare byte-wise, so uppercase sorts before lowercase. Equal
    /// names fall back to the registry key.
    pub fn snapshot(&self) -> Vec<ServiceEntry> {
        let mut services: Vec<ServiceEntry> = self.read().values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
        services
    }

    /// Get a copy of the entry for a registry key
    pub fn get(&self, key: &str) -> Option<ServiceEntry> {
        self.read().get(key).cloned()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking reader cannot leave the map half-written, so a poisoned
    // lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ServiceEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ServiceEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
