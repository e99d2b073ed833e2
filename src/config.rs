//! Configuration types.
//!
//! - [`CatalogConfig`] - Type catalog cache lifetime and size cap
//! - [`ServiceConfig`] - Command facade behavior, embedding a [`CatalogConfig`]
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use propscope::{CatalogConfig, ServiceConfig};
//!
//! let config = ServiceConfig::default()
//!     .with_catalog(CatalogConfig::default().with_ttl(Duration::from_secs(30)))
//!     .with_auto_grow_arrays(false);
//! assert_eq!(config.catalog.ttl, Duration::from_secs(30));
//! ```

use std::time::Duration;

/// Default age after which the catalog snapshot is rebuilt on the next access
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(5);

/// Default maximum number of cached type descriptors
pub const DEFAULT_MAX_CATALOG_ENTRIES: usize = 50_000;

/// Type catalog settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Snapshot age after which [`crate::catalog::TypeCatalog::should_refresh`] returns `true`
    pub ttl: Duration,
    /// Maximum number of descriptors kept; the oldest discovered are trimmed first
    pub max_entries: usize,
}

impl CatalogConfig {
    /// Set the snapshot time-to-live
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the size cap
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            ttl: DEFAULT_CATALOG_TTL,
            max_entries: DEFAULT_MAX_CATALOG_ENTRIES,
        }
    }
}

/// Command facade settings.
///
/// The defaults match the host editor: arrays addressed past their end on a top-level
/// `set_property` are grown, every successful write is followed by a compile, and type
/// searches return 100 results per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Type catalog settings
    pub catalog: CatalogConfig,
    /// Grow top-level arrays when `set_property` addresses an index past the end
    pub auto_grow_arrays: bool,
    /// Largest array length auto-growth may produce
    pub max_auto_grow_len: usize,
    /// Compile the owner after a successful `set_property`; variable changes always compile
    pub compile_after_write: bool,
    /// Page size of `search_types` when the request does not specify one
    pub default_page_size: usize,
}

impl ServiceConfig {
    /// Set the catalog settings
    #[must_use]
    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// Enable or disable array auto-growth
    #[must_use]
    pub fn with_auto_grow_arrays(mut self, enabled: bool) -> Self {
        self.auto_grow_arrays = enabled;
        self
    }

    /// Set the auto-growth length cap
    #[must_use]
    pub fn with_max_auto_grow_len(mut self, len: usize) -> Self {
        self.max_auto_grow_len = len;
        self
    }

    /// Enable or disable compiling after writes
    #[must_use]
    pub fn with_compile_after_write(mut self, enabled: bool) -> Self {
        self.compile_after_write = enabled;
        self
    }

    /// Set the default search page size
    #[must_use]
    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            catalog: CatalogConfig::default(),
            auto_grow_arrays: true,
            max_auto_grow_len: 65_536,
            compile_after_write: true,
            default_page_size: 100,
        }
    }
}
