//! # Load Scenario Tests for Table Ordering
//!
//! End-to-end loads through `TableOrderingService` with the bundled schema
//! sorter and with failure-injecting sorters.
//!
//! ## Test Categories
//!
//! 1. **Descendant Families** - chains, siblings, isolated tables
//! 2. **Final Order** - creation/deletion direction against schema rules
//! 3. **Cycles** - both cycle policies
//! 4. **Failure Isolation** - no partial publish, session always released

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use table_ordering::domain::invariants::{
    invariant_family_closure, invariant_no_self_descendant, invariant_order_completeness,
    invariant_unique_descendants,
};
use table_ordering::{
    algorithms::{build_graph, resolve_descendants, resolve_order},
    CyclePolicy, DependencySorter, OrderingConfig, OrderingError,
    RelationDescriptor, SchemaRuleSorter, SessionHandle, SorterError, TableName,
    TableOrderingApi, TableOrderingService, TableRelation,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

fn descriptor(relations: &[(&str, &str)]) -> RelationDescriptor {
    RelationDescriptor::new(
        relations
            .iter()
            .map(|(table, parent)| TableRelation::child(*table, *parent))
            .collect(),
    )
}

fn names(list: &[&str]) -> Vec<TableName> {
    list.iter().map(|n| n.to_string()).collect()
}

fn schema_service(
    rules: &[(&str, &str)],
) -> (Arc<SchemaRuleSorter>, TableOrderingService<SchemaRuleSorter>) {
    let sorter = Arc::new(SchemaRuleSorter::from_rules(rules.iter().copied()));
    let service = TableOrderingService::new(Arc::clone(&sorter));
    (sorter, service)
}

/// Sorter that fails every call after the first `healthy_calls` sorts and
/// counts session traffic.
struct FlakySorter {
    inner: SchemaRuleSorter,
    healthy_calls: usize,
    calls: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl FlakySorter {
    fn new(healthy_calls: usize) -> Self {
        Self {
            inner: SchemaRuleSorter::new(),
            healthy_calls,
            calls: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DependencySorter for FlakySorter {
    async fn open_session(&self) -> Result<SessionHandle, SorterError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open_session().await
    }

    async fn sort_tables(
        &self,
        session: &SessionHandle,
        tables: &[TableName],
    ) -> Result<Vec<TableName>, SorterError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.healthy_calls {
            return Err(SorterError::Unavailable("connection reset".into()));
        }
        self.inner.sort_tables(session, tables).await
    }

    async fn close_session(&self, session: SessionHandle) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close_session(session).await
    }
}

/// Sorter that records how many sessions are open at once. Each sort call
/// sleeps so that concurrent loads get a chance to interleave.
struct OverlapSorter {
    inner: SchemaRuleSorter,
    live: AtomicUsize,
    max_live: AtomicUsize,
    opened: AtomicUsize,
}

impl OverlapSorter {
    fn new(rules: &[(&str, &str)]) -> Self {
        Self {
            inner: SchemaRuleSorter::from_rules(rules.iter().copied()),
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
        }
    }

    fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependencySorter for OverlapSorter {
    async fn open_session(&self) -> Result<SessionHandle, SorterError> {
        let session = self.inner.open_session().await?;
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(session)
    }

    async fn sort_tables(
        &self,
        session: &SessionHandle,
        tables: &[TableName],
    ) -> Result<Vec<TableName>, SorterError> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.inner.sort_tables(session, tables).await
    }

    async fn close_session(&self, session: SessionHandle) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.inner.close_session(session).await
    }
}

// =============================================================================
// DESCENDANT FAMILIES
// =============================================================================

#[tokio::test]
async fn test_chain_families() {
    let (_, service) = schema_service(&[]);

    service
        .load_descriptor(&descriptor(&[("B", "A"), ("C", "B")]))
        .await
        .unwrap();

    assert_eq!(service.descendants("A").unwrap(), Some(names(&["B", "C"])));
    assert_eq!(service.descendants("B").unwrap(), Some(names(&["C"])));
    assert_eq!(service.descendants("C").unwrap(), Some(vec![]));
}

#[tokio::test]
async fn test_sibling_families() {
    let (_, service) = schema_service(&[]);

    service
        .load_descriptor(&descriptor(&[("M", "P"), ("N", "P")]))
        .await
        .unwrap();

    assert_eq!(service.descendants("P").unwrap(), Some(names(&["M", "N"])));
    assert_eq!(service.descendants("M").unwrap(), Some(vec![]));
    assert_eq!(service.descendants("N").unwrap(), Some(vec![]));
}

#[tokio::test]
async fn test_isolated_table_is_singleton() {
    let (_, service) = schema_service(&[]);
    let mut desc = descriptor(&[("B", "A")]);
    desc.relations.push(TableRelation::root("PORT"));

    service.load_descriptor(&desc).await.unwrap();

    let order = service.table_order("PORT").unwrap().unwrap();
    assert_eq!(order.as_slice(), ["PORT"]);
    assert_eq!(service.descendants("PORT").unwrap(), Some(vec![]));
}

#[tokio::test]
async fn test_empty_descriptor_publishes_empty_snapshot() {
    let (_, service) = schema_service(&[]);

    let snapshot = service
        .load_descriptor(&RelationDescriptor::default())
        .await
        .unwrap();

    assert_eq!(snapshot.table_count(), 0);
    assert!(service.is_loaded());
}

// =============================================================================
// FINAL ORDER
// =============================================================================

#[tokio::test]
async fn test_vlan_family_creation_and_deletion_order() {
    let (sorter, service) = schema_service(&[
        ("VLAN_MEMBER", "VLAN"),
        ("VLAN_INTERFACE", "VLAN"),
        ("VLAN_MEMBER", "PORT"),
    ]);

    service
        .load_descriptor(&descriptor(&[
            ("VLAN_MEMBER", "VLAN"),
            ("VLAN_INTERFACE", "VLAN"),
        ]))
        .await
        .unwrap();

    let order = service.table_order("VLAN").unwrap().unwrap();
    let create: Vec<_> = order.creation_order().map(String::as_str).collect();
    let delete: Vec<_> = order.deletion_order().map(String::as_str).collect();

    assert_eq!(create, vec!["VLAN", "VLAN_INTERFACE", "VLAN_MEMBER"]);
    assert_eq!(delete, vec!["VLAN_MEMBER", "VLAN_INTERFACE", "VLAN"]);
    assert_eq!(sorter.open_sessions(), 0);
}

#[tokio::test]
async fn test_schema_rules_override_declared_relations() {
    // Declared as children of A, but C references B in the schema
    let (_, service) = schema_service(&[("C", "B")]);

    service
        .load_descriptor(&descriptor(&[("C", "A"), ("B", "A")]))
        .await
        .unwrap();

    let order = service.table_order("A").unwrap().unwrap();
    let create: Vec<_> = order.creation_order().map(String::as_str).collect();
    let b = create.iter().position(|t| *t == "B").unwrap();
    let c = create.iter().position(|t| *t == "C").unwrap();
    assert!(b < c);
}

#[tokio::test]
async fn test_snapshot_properties_hold() {
    let relations = [
        ("VLAN_MEMBER", "VLAN"),
        ("VLAN_INTERFACE", "VLAN"),
        ("VLAN_SUB_INTERFACE", "VLAN_INTERFACE"),
        ("ACL_RULE", "ACL_TABLE"),
        ("VLAN_SUB_INTERFACE", "ACL_TABLE"),
    ];
    let (_, service) = schema_service(&[("VLAN_MEMBER", "VLAN"), ("ACL_RULE", "ACL_TABLE")]);
    let desc = descriptor(&relations);

    let snapshot = service.load_descriptor(&desc).await.unwrap();
    let graph = build_graph(&desc, 64).unwrap();

    assert!(invariant_family_closure(&graph, &snapshot.descendants));
    assert!(invariant_no_self_descendant(&snapshot.descendants));
    assert!(invariant_unique_descendants(&snapshot.descendants));
    assert!(invariant_order_completeness(&snapshot));
    for (child, parent) in relations {
        assert!(snapshot.descendants(parent).unwrap().iter().any(|t| t == child));
    }
}

#[tokio::test]
async fn test_reload_same_descriptor_is_equivalent() {
    let (_, service) = schema_service(&[("VLAN_MEMBER", "VLAN")]);
    let desc = descriptor(&[("VLAN_MEMBER", "VLAN"), ("VLAN_INTERFACE", "VLAN")]);

    let first = service.load_descriptor(&desc).await.unwrap();
    let second = service.load_descriptor(&desc).await.unwrap();

    assert_eq!(second.version, first.version + 1);
    assert_eq!(first.descendants, second.descendants);
    for (table, order) in &first.orders {
        let a: HashSet<_> = order.as_slice().iter().collect();
        let b: HashSet<_> = second.orders[table].as_slice().iter().collect();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_load_from_descriptor_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "relations": [
                {{"table": "VLAN_MEMBER", "parent": "VLAN"}},
                {{"table": "PORT"}}
            ]
        }}"#
    )
    .unwrap();
    let config = OrderingConfig::default().with_descriptor_path(file.path());
    let service = TableOrderingService::with_config(config, Arc::new(SchemaRuleSorter::new()));

    let snapshot = service.load().await.unwrap();

    assert_eq!(snapshot.table_count(), 3);
    assert_eq!(
        service.descendants("VLAN").unwrap(),
        Some(names(&["VLAN_MEMBER"]))
    );
}

#[tokio::test]
async fn test_malformed_descriptor_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{\"relations\": [").unwrap();
    let config = OrderingConfig::default().with_descriptor_path(file.path());
    let service = TableOrderingService::with_config(config, Arc::new(SchemaRuleSorter::new()));

    let result = service.load().await;

    assert!(matches!(result, Err(OrderingError::DescriptorParse(_))));
    assert!(!service.is_loaded());
}

// =============================================================================
// CYCLES
// =============================================================================

#[tokio::test]
async fn test_cycle_rejected_by_default() {
    let (sorter, service) = schema_service(&[]);

    let result = service
        .load_descriptor(&descriptor(&[("X", "Y"), ("Y", "X")]))
        .await;

    assert!(matches!(result, Err(OrderingError::CycleDetected { .. })));
    assert!(!service.is_loaded());
    // Rejected before any sorter session was opened
    assert_eq!(sorter.open_sessions(), 0);
}

#[tokio::test]
async fn test_cycle_best_effort_terminates() {
    let config = OrderingConfig::default().with_cycle_policy(CyclePolicy::BestEffort);
    let service = TableOrderingService::with_config(config, Arc::new(SchemaRuleSorter::new()));

    let snapshot = service
        .load_descriptor(&descriptor(&[("X", "Y"), ("Y", "X")]))
        .await
        .unwrap();

    assert_eq!(snapshot.descendants("X").unwrap(), names(&["Y"]).as_slice());
    assert!(snapshot.descendants("Y").unwrap().is_empty());
    assert!(invariant_no_self_descendant(&snapshot.descendants));
    assert!(invariant_order_completeness(&snapshot));
}

// =============================================================================
// FAILURE ISOLATION
// =============================================================================

#[tokio::test]
async fn test_mid_batch_sorter_failure_keeps_previous_snapshot() {
    // Three tables load fine, the reload with four fails on its third sort
    let sorter = Arc::new(FlakySorter::new(5));
    let service = TableOrderingService::new(Arc::clone(&sorter));

    let first = service
        .load_descriptor(&descriptor(&[("B", "A"), ("C", "B")]))
        .await
        .unwrap();

    let result = service
        .load_descriptor(&descriptor(&[("B", "A"), ("C", "B"), ("D", "C")]))
        .await;

    match result {
        Err(OrderingError::SortFailed { source, .. }) => {
            assert!(matches!(source, SorterError::Unavailable(_)));
        }
        other => panic!("expected sort failure, got {other:?}"),
    }
    assert_eq!(sorter.calls.load(Ordering::SeqCst), 6);
    assert_eq!(sorter.opened.load(Ordering::SeqCst), 2);
    assert_eq!(sorter.closed.load(Ordering::SeqCst), 2);
    assert_eq!(sorter.inner.open_sessions(), 0);

    let current = service.snapshot().unwrap();
    assert!(Arc::ptr_eq(&first, &current));
    assert_eq!(service.version(), 1);
    assert!(service.table_order("D").unwrap().is_none());
}

#[tokio::test]
async fn test_failure_before_first_load_leaves_service_unloaded() {
    let sorter = Arc::new(FlakySorter::new(0));
    let service = TableOrderingService::new(Arc::clone(&sorter));

    let result = service
        .load_descriptor(&descriptor(&[("B", "A")]))
        .await;

    assert!(matches!(result, Err(OrderingError::SortFailed { .. })));
    assert!(matches!(
        service.table_order("A"),
        Err(OrderingError::NotLoaded)
    ));
    assert_eq!(sorter.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_overlap_sorter_detects_unserialized_batches() {
    let sorter = OverlapSorter::new(&[("VLAN_MEMBER", "VLAN")]);
    let graph = build_graph(&descriptor(&[("VLAN_MEMBER", "VLAN")]), 16).unwrap();
    let families = resolve_descendants(&graph, CyclePolicy::Reject).unwrap();
    let timeout = Duration::from_secs(1);

    let (first, second) = tokio::join!(
        resolve_order(&graph, &families, &sorter, timeout),
        resolve_order(&graph, &families, &sorter, timeout),
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(sorter.max_live(), 2);
    assert_eq!(sorter.live.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reloads_never_overlap_sessions() {
    let sorter = Arc::new(OverlapSorter::new(&[("VLAN_MEMBER", "VLAN")]));
    let service = Arc::new(TableOrderingService::new(Arc::clone(&sorter)));
    let desc = descriptor(&[("VLAN_MEMBER", "VLAN"), ("VLAN_INTERFACE", "VLAN")]);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let desc = desc.clone();
        handles.push(tokio::spawn(async move {
            service.load_descriptor(&desc).await.map(|s| s.version)
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap());
    }
    versions.sort_unstable();

    assert_eq!(versions, (1..=8).collect::<Vec<u64>>());
    assert_eq!(sorter.opened.load(Ordering::SeqCst), 8);
    assert_eq!(sorter.max_live(), 1);
    assert_eq!(sorter.inner.open_sessions(), 0);
}
