//! Common test utilities for catalog watcher integration tests

use async_io::Timer;
use service_catalog::{CatalogWatcher, MemoryCatalog, ServiceEntry, ViewStore, WatcherConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Test timeout for async operations
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A memory catalog watched by a background watcher task
pub struct WatchedCatalog {
    /// Registry the test mutates
    pub catalog: Arc<MemoryCatalog>,
    /// Store the watcher reconciles
    pub store: Arc<ViewStore>,
    stop: async_channel::Sender<()>,
    task: smol::Task<()>,
}

impl WatchedCatalog {
    /// Start watching an empty catalog with short timings
    pub fn start() -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let store = Arc::new(ViewStore::new());
        let config = WatcherConfig::default()
            .with_wait_time(Duration::from_millis(200))
            .with_retry_interval(Duration::from_millis(50));

        let watcher = CatalogWatcher::new(catalog.clone(), store.clone(), config);
        let (stop, stopped) = async_channel::bounded::<()>(1);
        let task = smol::spawn(watcher.run_until(async move {
            let _ = stopped.recv().await;
        }));

        Self {
            catalog,
            store,
            stop,
            task,
        }
    }

    /// Register a service carrying dashboard tags
    pub fn register(&self, id: &str, name: &str, address: &str) {
        self.catalog.register(
            id,
            [
                format!("dashboard.service.name={}", name),
                format!("dashboard.service.address={}", address),
            ],
        );
    }

    /// Wait until the store satisfies `check` or the test timeout expires
    pub async fn wait_for<F>(&self, what: &str, check: F)
    where
        F: Fn(&[ServiceEntry]) -> bool,
    {
        let start = Instant::now();
        loop {
            if check(&self.store.snapshot()) {
                return;
            }
            if start.elapsed() > TEST_TIMEOUT {
                panic!("timed out waiting for {}: {:?}", what, self.store.snapshot());
            }
            Timer::after(Duration::from_millis(10)).await;
        }
    }

    /// Stop the watcher and wait for it to exit
    pub async fn stop(self) {
        let _ = self.stop.send(()).await;
        self.task.await;
    }
}

/// Names in snapshot order
pub fn names(services: &[ServiceEntry]) -> Vec<&str> {
    services.iter().map(|s| s.name.as_str()).collect()
}
