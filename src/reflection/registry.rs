//! Live type registry of the host.
//!
//! This module provides the [`ReflectionRegistry`], the thread-safe store of every reflected
//! type the host currently knows about. It is the source the [`crate::catalog::TypeCatalog`]
//! scans when rebuilding and the lookup the [`crate::fieldtype::FieldTypeResolver`] and the
//! property resolver consult for field layouts.
//!
//! # Registry Architecture
//!
//! - **Primary storage**: lock-free `SkipMap` keyed by [`TypeToken`]. Tokens are allocated
//!   monotonically, so iteration order is registration (discovery) order.
//! - **Path index**: `DashMap` from canonical path to token.
//!
//! Re-registering an existing canonical path keeps the token and therefore the position of
//! the type; only the stored `Arc` is replaced.
//!
//! # Examples
//!
//! ```rust
//! use propscope::reflection::{FieldKind, ReflectedType, ReflectionRegistry};
//!
//! let registry = ReflectionRegistry::new();
//! registry.register(ReflectedType::structure("/Script/Game", "Stats").with_field("Health", FieldKind::Float));
//!
//! let stats = registry.get("/Script/Game.Stats").unwrap();
//! assert_eq!(stats.fields[0].name, "Health");
//! ```

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    reflection::{FieldDescriptor, ReflectedType, ReflectedTypeRc, TypeKind},
    Error::{RecursionLimit, TypeNotFound},
    Result,
};

/// Maximum depth of a parent chain before it is treated as cyclic
pub const RECURSION_LIMIT: usize = 64;

/// Registration token of a type; ordering equals registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeToken(u32);

impl TypeToken {
    /// Raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Central, thread-safe registry of reflected types.
pub struct ReflectionRegistry {
    /// Registered types in registration order
    types: SkipMap<TypeToken, ReflectedTypeRc>,
    /// Canonical path to token
    paths: DashMap<String, TypeToken>,
    /// Next token to hand out
    next_token: AtomicU32,
}

impl ReflectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ReflectionRegistry {
            types: SkipMap::new(),
            paths: DashMap::new(),
            next_token: AtomicU32::new(1),
        }
    }

    /// Register a type, replacing any previous type with the same canonical path.
    ///
    /// ## Arguments
    /// * 'new_type' - The type to register
    pub fn register(&self, new_type: ReflectedType) -> ReflectedTypeRc {
        let token = *self
            .paths
            .entry(new_type.path().to_string())
            .or_insert_with(|| TypeToken(self.next_token.fetch_add(1, Ordering::Relaxed)));

        let new_type = Arc::new(new_type);
        self.types.insert(token, new_type.clone());
        new_type
    }

    /// Remove a type by canonical path
    pub fn unregister(&self, path: &str) -> Option<ReflectedTypeRc> {
        let (_, token) = self.paths.remove(path)?;
        self.types.remove(&token).map(|entry| entry.value().clone())
    }

    /// Look up a type by canonical path
    pub fn get(&self, path: &str) -> Option<ReflectedTypeRc> {
        let token = *self.paths.get(path)?;
        self.types.get(&token).map(|entry| entry.value().clone())
    }

    /// Look up a type by canonical path, requiring one of the given kinds
    pub fn get_kind(&self, path: &str, kinds: &[TypeKind]) -> Option<ReflectedTypeRc> {
        self.get(path).filter(|ty| kinds.contains(&ty.kind))
    }

    /// Token of a registered path
    pub fn token(&self, path: &str) -> Option<TypeToken> {
        self.paths.get(path).map(|token| *token)
    }

    /// Snapshot of all registered types in registration order
    pub fn all_types(&self) -> Vec<ReflectedTypeRc> {
        self.types.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Full field layout of a class or struct, inherited fields first.
    ///
    /// ## Arguments
    /// * 'path' - Canonical path of the class or struct
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the type or one of its parents is not
    /// registered, and [`crate::Error::RecursionLimit`] for cyclic parent chains.
    pub fn layout(&self, path: &str) -> Result<Vec<FieldDescriptor>> {
        let mut chain = Vec::new();
        let mut current = Some(path.to_string());

        while let Some(current_path) = current {
            if chain.len() >= RECURSION_LIMIT {
                return Err(RecursionLimit(RECURSION_LIMIT));
            }

            let ty = self
                .get(&current_path)
                .ok_or_else(|| TypeNotFound(current_path.clone()))?;
            current = ty.parent.clone();
            chain.push(ty);
        }

        Ok(chain
            .iter()
            .rev()
            .flat_map(|ty| ty.fields.iter().cloned())
            .collect())
    }

    /// Returns `true` if `path` equals `ancestor` or inherits from it
    pub fn is_child_of(&self, path: &str, ancestor: &str) -> bool {
        let mut current = Some(path.to_string());
        let mut depth = 0;

        while let Some(current_path) = current {
            if current_path == ancestor {
                return true;
            }
            if depth >= RECURSION_LIMIT {
                return false;
            }
            depth += 1;
            current = self.get(&current_path).and_then(|ty| ty.parent.clone());
        }

        false
    }
}

impl Default for ReflectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::FieldKind;

    #[test]
    fn test_register_and_replace_keeps_order() {
        let registry = ReflectionRegistry::new();
        registry.register(ReflectedType::class("/Script/Engine", "Actor"));
        registry.register(ReflectedType::class("/Script/Engine", "Pawn"));
        let first = registry.token("/Script/Engine.Actor").unwrap();

        registry.register(
            ReflectedType::class("/Script/Engine", "Actor").with_field("Tick", FieldKind::Bool),
        );

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.token("/Script/Engine.Actor").unwrap(), first);
        let order: Vec<String> = registry
            .all_types()
            .iter()
            .map(|ty| ty.name.clone())
            .collect();
        assert_eq!(order, vec!["Actor", "Pawn"]);
        assert_eq!(registry.get("/Script/Engine.Actor").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_layout_parent_first() {
        let registry = ReflectionRegistry::new();
        registry.register(
            ReflectedType::class("/Script/Engine", "Actor").with_field("Hidden", FieldKind::Bool),
        );
        registry.register(
            ReflectedType::class("/Script/Game", "Hero")
                .with_parent("/Script/Engine.Actor")
                .with_field("Health", FieldKind::Float),
        );

        let names: Vec<String> = registry
            .layout("/Script/Game.Hero")
            .unwrap()
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, vec!["Hidden", "Health"]);
        assert!(registry.is_child_of("/Script/Game.Hero", "/Script/Engine.Actor"));
        assert!(!registry.is_child_of("/Script/Engine.Actor", "/Script/Game.Hero"));
    }

    #[test]
    fn test_layout_errors() {
        let registry = ReflectionRegistry::new();
        assert!(matches!(
            registry.layout("/Script/Game.Missing"),
            Err(crate::Error::TypeNotFound(_))
        ));

        registry.register(ReflectedType::class("/Script/Game", "A").with_parent("/Script/Game.B"));
        registry.register(ReflectedType::class("/Script/Game", "B").with_parent("/Script/Game.A"));
        assert!(matches!(
            registry.layout("/Script/Game.A"),
            Err(crate::Error::RecursionLimit(_))
        ));
        assert!(!registry.is_child_of("/Script/Game.A", "/Script/Game.C"));
    }

    #[test]
    fn test_unregister() {
        let registry = ReflectionRegistry::new();
        registry.register(ReflectedType::enumeration("/Script/Game", "EMood"));
        assert!(registry.unregister("/Script/Game.EMood").is_some());
        assert!(registry.get("/Script/Game.EMood").is_none());
        assert!(registry.is_empty());
    }
}
