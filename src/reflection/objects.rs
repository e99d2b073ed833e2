//! Object identities and live instance storage.
//!
//! The [`ObjectDirectory`] knows every object of the host by its textual identifier
//! (`<outer>.<name>`), including objects that exist on disk but are not loaded yet. Live field
//! storage is held separately in [`Instance`]s owned by [`crate::host::World`], so that a
//! mutable borrow of one instance can coexist with shared access to the directory while an
//! object reference is being marshalled.
//!
//! # Loading
//!
//! [`ObjectDirectory::load`] resolves an identifier and marks the object loaded, mirroring
//! what assigning a hard reference does in the host. [`ObjectDirectory::find`] resolves without
//! touching the loaded state; soft references never go through `load`.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use crate::{reflection::Data, Error::LockError, Result};

/// Opaque handle of an object known to the [`ObjectDirectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Raw id value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object#{}", self.0)
    }
}

/// Directory record of one object.
#[derive(Debug)]
pub struct ObjectEntry {
    /// Handle of the object
    pub id: ObjectId,
    /// Owning container (package or outer object)
    pub outer: String,
    /// Local name within the outer
    pub name: String,
    /// Canonical path of the object's class
    pub class_path: String,
    loaded: AtomicBool,
}

impl ObjectEntry {
    /// Stable textual identifier, `<outer>.<name>`
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}.{}", self.outer, self.name)
    }

    /// Returns `true` once the object has been loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

/// A reference-counted pointer to an [`ObjectEntry`]
pub type ObjectEntryRc = Arc<ObjectEntry>;

#[derive(Default)]
struct DirectoryState {
    entries: HashMap<ObjectId, ObjectEntryRc>,
    by_path: HashMap<String, ObjectId>,
}

/// Thread-safe index of object identities.
pub struct ObjectDirectory {
    state: RwLock<DirectoryState>,
    next_id: AtomicU64,
}

impl ObjectDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        ObjectDirectory {
            state: RwLock::new(DirectoryState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an object identity.
    ///
    /// Registering an identifier that already exists returns the existing handle.
    ///
    /// ## Arguments
    /// * 'outer'      - Owning container
    /// * 'name'       - Local name
    /// * 'class_path' - Class of the object
    /// * 'loaded'     - Whether the object starts out loaded
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the directory lock is poisoned.
    pub fn insert(&self, outer: &str, name: &str, class_path: &str, loaded: bool) -> Result<ObjectId> {
        let mut state = self.state.write().map_err(|_| LockError)?;
        let path = format!("{outer}.{name}");
        if let Some(id) = state.by_path.get(&path) {
            return Ok(*id);
        }

        let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        state.entries.insert(
            id,
            Arc::new(ObjectEntry {
                id,
                outer: outer.to_string(),
                name: name.to_string(),
                class_path: class_path.to_string(),
                loaded: AtomicBool::new(loaded),
            }),
        );
        state.by_path.insert(path, id);
        Ok(id)
    }

    /// Look up an object by handle
    pub fn get(&self, id: ObjectId) -> Option<ObjectEntryRc> {
        let state = self.state.read().ok()?;
        state.entries.get(&id).cloned()
    }

    /// Resolve a textual identifier without loading the object
    pub fn find(&self, path: &str) -> Option<ObjectEntryRc> {
        let state = self.state.read().ok()?;
        let id = state.by_path.get(path)?;
        state.entries.get(id).cloned()
    }

    /// Resolve a textual identifier and mark the object loaded
    pub fn load(&self, path: &str) -> Option<ObjectEntryRc> {
        let entry = self.find(path)?;
        if !entry.loaded.swap(true, Ordering::AcqRel) {
            log::debug!("loaded object {path}");
        }
        Some(entry)
    }

    /// Textual identifier of a handle
    pub fn path_of(&self, id: ObjectId) -> Option<String> {
        self.get(id).map(|entry| entry.path())
    }

    /// Number of known objects
    pub fn len(&self) -> usize {
        self.state.read().map(|state| state.entries.len()).unwrap_or(0)
    }

    /// Returns `true` if no object is known
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Live field storage of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Canonical path of the class whose layout `fields` follows
    pub class_path: String,
    /// Values aligned with the class layout
    pub fields: Vec<Data>,
}
