use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    catalog::{filter::exclusion_reason, QueryPage, TypeDescriptor, TypeQuery},
    reflection::ReflectionRegistry,
    CatalogConfig,
};

/// One immutable generation of the catalog.
#[derive(Default)]
struct Snapshot {
    generation: u64,
    types: Vec<TypeDescriptor>,
    by_path: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

/// Counters of the last rebuild.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BuildStats {
    /// Types enumerated from the registry
    pub scanned: usize,
    /// Types dropped by the exclusion filter
    pub excluded: usize,
    /// Oldest entries dropped to honor the size cap
    pub trimmed: usize,
    /// Wall time of the rebuild in microseconds
    pub duration_us: u128,
}

/// Point-in-time view of the catalog state, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    /// The catalog has been built at least once
    pub initialized: bool,
    /// The catalog was invalidated since the last rebuild
    pub stale: bool,
    /// Reason given to the last [`TypeCatalog::invalidate`] call
    pub invalidation_reason: Option<String>,
    /// Generation of the current snapshot
    pub generation: u64,
    /// Number of cached descriptors
    pub type_count: usize,
    /// Number of distinct simple names
    pub name_count: usize,
    /// Milliseconds since the last rebuild
    pub age_ms: Option<u128>,
    /// Counters of the last rebuild
    pub last_build: BuildStats,
}

struct CatalogState {
    snapshot: Arc<Snapshot>,
    initialized: bool,
    stale: bool,
    invalidation_reason: Option<String>,
    last_refresh: Option<Instant>,
    last_build: BuildStats,
}

impl CatalogState {
    fn should_refresh(&self, ttl: Duration) -> bool {
        !self.initialized
            || self.stale
            || self
                .last_refresh
                .map_or(true, |refreshed| refreshed.elapsed() > ttl)
    }
}

/// Cached, searchable index of all reflected types visible to the host.
///
/// The catalog owns an immutable snapshot of [`TypeDescriptor`]s together with a path index
/// and a name index. A rebuild re-scans the whole [`ReflectionRegistry`] and swaps snapshot and
/// indices in one step, so a reader works on exactly one generation.
///
/// # Thread Safety
///
/// A single mutex guards the read path and the rebuild path. A reader arriving during a rebuild
/// blocks until the new snapshot is published; it then releases the lock and evaluates its
/// query against the `Arc` of that snapshot.
///
/// # Failure Semantics
///
/// No operation fails. Lookups return `None`, queries return empty pages, and a poisoned lock
/// is recovered rather than propagated.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use propscope::{
///     catalog::{TypeCatalog, TypeQuery},
///     reflection::{ReflectedType, ReflectionRegistry},
///     CatalogConfig,
/// };
///
/// let registry = Arc::new(ReflectionRegistry::new());
/// registry.register(ReflectedType::structure("/Script/CoreUObject", "Vector"));
///
/// let catalog = TypeCatalog::new(registry, CatalogConfig::default());
/// catalog.force_refresh();
///
/// let found = catalog.query(&TypeQuery::new().with_search_text("vec"));
/// assert_eq!(found[0].canonical_path, "/Script/CoreUObject.Vector");
/// ```
pub struct TypeCatalog {
    registry: Arc<ReflectionRegistry>,
    config: CatalogConfig,
    state: Mutex<CatalogState>,
}

impl TypeCatalog {
    /// Create an empty, uninitialized catalog over a registry
    pub fn new(registry: Arc<ReflectionRegistry>, config: CatalogConfig) -> Self {
        TypeCatalog {
            registry,
            config,
            state: Mutex::new(CatalogState {
                snapshot: Arc::new(Snapshot::default()),
                initialized: false,
                stale: false,
                invalidation_reason: None,
                last_refresh: None,
                last_build: BuildStats::default(),
            }),
        }
    }

    /// Build the cache if it was never built or was invalidated; idempotent otherwise
    pub fn initialize(&self) {
        let mut state = self.lock();
        if !state.initialized || state.stale {
            self.rebuild(&mut state);
        }
    }

    /// Rebuild unconditionally, ignoring the staleness flag and the TTL
    pub fn force_refresh(&self) {
        let mut state = self.lock();
        self.rebuild(&mut state);
    }

    /// Returns `true` if never initialized, invalidated, or older than the TTL
    pub fn should_refresh(&self) -> bool {
        self.lock().should_refresh(self.config.ttl)
    }

    /// Mark the cache stale without rebuilding it
    pub fn invalidate(&self, reason: &str) {
        let mut state = self.lock();
        state.stale = true;
        state.invalidation_reason = Some(reason.to_string());
        log::debug!("type catalog invalidated: {reason}");
    }

    /// Look up a descriptor by canonical path
    pub fn find_by_path(&self, path: &str) -> Option<TypeDescriptor> {
        let snapshot = self.current();
        snapshot
            .by_path
            .get(path)
            .map(|&index| snapshot.types[index].clone())
    }

    /// Look up a descriptor by simple name.
    ///
    /// Several types may share a simple name across modules; this returns the first one
    /// discovered, not a best match.
    pub fn find_by_name(&self, name: &str) -> Option<TypeDescriptor> {
        let snapshot = self.current();
        snapshot
            .by_name
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&index| snapshot.types[index].clone())
    }

    /// All descriptors sharing a simple name, in discovery order
    pub fn find_all_by_name(&self, name: &str) -> Vec<TypeDescriptor> {
        let snapshot = self.current();
        snapshot
            .by_name
            .get(name)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| snapshot.types[index].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Filtered and paginated list of descriptors
    pub fn query(&self, query: &TypeQuery) -> Vec<TypeDescriptor> {
        self.query_page(query).types
    }

    /// Filtered and paginated list of descriptors with the total match count.
    ///
    /// Filtering and pagination happen in one linear pass over the snapshot in stored order.
    /// Offsets are only stable while the snapshot is not rebuilt.
    pub fn query_page(&self, query: &TypeQuery) -> QueryPage {
        let snapshot = self.current();
        let matcher = query.matcher();
        let limit = query.max_results.unwrap_or(usize::MAX);

        let mut types = Vec::new();
        let mut total_count = 0;
        for descriptor in &snapshot.types {
            if !matcher.matches(descriptor) {
                continue;
            }
            if total_count >= query.page_offset && types.len() < limit {
                types.push(descriptor.clone());
            }
            total_count += 1;
        }

        QueryPage {
            types,
            total_count,
            generation: snapshot.generation,
        }
    }

    /// Number of cached descriptors, refreshing first if needed
    pub fn len(&self) -> usize {
        self.current().types.len()
    }

    /// Returns `true` if the cache holds no descriptor
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostics view of the catalog; does not trigger a rebuild
    pub fn stats(&self) -> CatalogStats {
        let state = self.lock();
        CatalogStats {
            initialized: state.initialized,
            stale: state.stale,
            invalidation_reason: state.invalidation_reason.clone(),
            generation: state.snapshot.generation,
            type_count: state.snapshot.types.len(),
            name_count: state.snapshot.by_name.len(),
            age_ms: state.last_refresh.map(|refreshed| refreshed.elapsed().as_millis()),
            last_build: state.last_build,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot to read from, rebuilding first when a refresh is due
    fn current(&self) -> Arc<Snapshot> {
        let mut state = self.lock();
        if state.should_refresh(self.config.ttl) {
            self.rebuild(&mut state);
        }
        state.snapshot.clone()
    }

    fn rebuild(&self, state: &mut CatalogState) {
        let started = Instant::now();
        let registered = self.registry.all_types();
        let scanned = registered.len();

        let mut types: Vec<TypeDescriptor> = registered
            .par_iter()
            .filter_map(|ty| match exclusion_reason(ty) {
                Some(_) => None,
                None => Some(TypeDescriptor::from_reflected(ty)),
            })
            .collect();
        let excluded = scanned - types.len();

        let mut trimmed = 0;
        if types.len() > self.config.max_entries {
            trimmed = types.len() - self.config.max_entries;
            types.drain(..trimmed);
            log::warn!(
                "type catalog capped at {} entries, dropped {trimmed} oldest",
                self.config.max_entries
            );
        }

        let mut by_path = HashMap::with_capacity(types.len());
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, descriptor) in types.iter().enumerate() {
            by_path
                .entry(descriptor.canonical_path.clone())
                .or_insert(index);
            by_name
                .entry(descriptor.name.clone())
                .or_default()
                .push(index);
        }

        let generation = state.snapshot.generation + 1;
        let last_build = BuildStats {
            scanned,
            excluded,
            trimmed,
            duration_us: started.elapsed().as_micros(),
        };
        log::info!(
            "type catalog generation {generation}: {} types ({excluded} excluded, {trimmed} trimmed) in {}us",
            types.len(),
            last_build.duration_us
        );

        state.snapshot = Arc::new(Snapshot {
            generation,
            types,
            by_path,
            by_name,
        });
        state.initialized = true;
        state.stale = false;
        state.invalidation_reason = None;
        state.last_refresh = Some(Instant::now());
        state.last_build = last_build;
    }
}
