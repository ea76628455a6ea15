//! Table Ordering Service
//!
//! Main service implementing TableOrderingApi. Owns the published snapshot
//! and serializes loads.

use crate::algorithms::order_resolver::saturating_millis;
use crate::algorithms::{build_graph, read_descriptor, resolve_descendants, resolve_order};
use crate::config::OrderingConfig;
use crate::domain::entities::{RelationDescriptor, TableOrder, TableOrderSnapshot};
use crate::domain::errors::OrderingError;
use crate::domain::value_objects::TableName;
use crate::ports::inbound::TableOrderingApi;
use crate::ports::outbound::DependencySorter;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Table Ordering Service
///
/// Orchestrates the load pipeline:
/// 1. Read and parse the relation descriptor
/// 2. Build the dependency graph
/// 3. Resolve descendant families
/// 4. Sort every family through one sorter session
/// 5. Swap the published snapshot
///
/// Readers clone the current `Arc<TableOrderSnapshot>` and never see a
/// partially built map. A failed load leaves the previous snapshot in place.
pub struct TableOrderingService<S: DependencySorter> {
    config: OrderingConfig,
    sorter: Arc<S>,
    published: RwLock<Option<Arc<TableOrderSnapshot>>>,
    /// Held for the whole load so sorter sessions never overlap
    load_lock: Mutex<()>,
}

impl<S: DependencySorter> TableOrderingService<S> {
    /// Create a new service with default config
    pub fn new(sorter: Arc<S>) -> Self {
        Self::with_config(OrderingConfig::default(), sorter)
    }

    /// Create a new service with custom config
    pub fn with_config(config: OrderingConfig, sorter: Arc<S>) -> Self {
        Self {
            config,
            sorter,
            published: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.published.read().is_some()
    }

    /// Version of the published snapshot, 0 before the first load
    pub fn version(&self) -> u64 {
        self.published
            .read()
            .as_ref()
            .map(|snapshot| snapshot.version)
            .unwrap_or(0)
    }

    async fn load_inner(
        &self,
        descriptor: &RelationDescriptor,
    ) -> Result<Arc<TableOrderSnapshot>, OrderingError> {
        let _guard = self.load_lock.lock().await;
        let start_time = Instant::now();

        let result = self.build_snapshot(descriptor).await;

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.published.write() = Some(Arc::clone(&snapshot));

                info!(
                    version = snapshot.version,
                    tables = snapshot.table_count(),
                    elapsed_ms = saturating_millis(start_time.elapsed()),
                    "[table-order] Published table order"
                );
                Ok(snapshot)
            }
            Err(err) => {
                warn!(
                    current_version = self.version(),
                    "[table-order] Load failed, keeping previous table order: {}", err
                );
                Err(err)
            }
        }
    }

    async fn build_snapshot(
        &self,
        descriptor: &RelationDescriptor,
    ) -> Result<TableOrderSnapshot, OrderingError> {
        info!(
            relations = descriptor.relations.len(),
            "[table-order] Loading table relations"
        );

        let graph = build_graph(descriptor, self.config.max_tables)?;
        let descendants = resolve_descendants(&graph, self.config.cycle_policy)?;
        let orders = resolve_order(
            &graph,
            &descendants,
            self.sorter.as_ref(),
            self.config.sort_timeout(),
        )
        .await?;

        Ok(TableOrderSnapshot {
            version: self.version() + 1,
            descendants,
            orders,
        })
    }

    fn current(&self) -> Result<Arc<TableOrderSnapshot>, OrderingError> {
        self.snapshot().ok_or(OrderingError::NotLoaded)
    }
}

#[async_trait]
impl<S: DependencySorter> TableOrderingApi for TableOrderingService<S> {
    async fn load(&self) -> Result<Arc<TableOrderSnapshot>, OrderingError> {
        let descriptor = match read_descriptor(&self.config.descriptor_path) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(
                    path = %self.config.descriptor_path.display(),
                    "[table-order] Cannot load relation descriptor: {}", err
                );
                return Err(err);
            }
        };
        self.load_inner(&descriptor).await
    }

    async fn load_descriptor(
        &self,
        descriptor: &RelationDescriptor,
    ) -> Result<Arc<TableOrderSnapshot>, OrderingError> {
        self.load_inner(descriptor).await
    }

    fn snapshot(&self) -> Option<Arc<TableOrderSnapshot>> {
        self.published.read().clone()
    }

    fn table_order(&self, table: &str) -> Result<Option<TableOrder>, OrderingError> {
        Ok(self.current()?.order(table).cloned())
    }

    fn descendants(&self, table: &str) -> Result<Option<Vec<TableName>>, OrderingError> {
        Ok(self.current()?.descendants(table).map(<[TableName]>::to_vec))
    }
}
