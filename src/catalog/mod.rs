//! Type catalog: cached, queryable index of all reflected types.
//!
//! The catalog turns the live [`crate::reflection::ReflectionRegistry`] into a flat list of
//! [`TypeDescriptor`]s that can be searched by editors. Rebuilding is never incremental: every
//! rebuild re-scans the registry, drops synthetic host artifacts (see [`EXCLUDED_PREFIXES`]),
//! classifies the survivors and replaces the snapshot and both indices at once.
//!
//! # Key Components
//!
//! - [`TypeCatalog`]: The cache itself, with staleness flag and TTL
//! - [`TypeDescriptor`]: One cached entry
//! - [`TypeQuery`]: Filter and pagination criteria
//! - [`QueryPage`]: One page of results with the total match count

mod cache;
mod filter;
mod query;

pub use cache::{BuildStats, CatalogStats, TypeCatalog};
pub use filter::{exclusion_reason, EXCLUDED_PREFIXES};
pub use query::{QueryPage, TypeQuery};

use serde::Serialize;

use crate::reflection::{ReflectedType, TypeKind};

/// Category assigned to types generated from user assets
pub const USER_ASSET_CATEGORY: &str = "Blueprint";

/// Cached description of one reflected type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    /// Local name
    pub name: String,
    /// Human readable name
    pub display_name: String,
    /// Globally unique `module.Name` identifier
    pub canonical_path: String,
    /// Type classification
    pub kind: TypeKind,
    /// Canonical path of the direct parent, if any
    pub parent_path: Option<String>,
    /// The type cannot be instantiated
    pub is_abstract: bool,
    /// The type is deprecated
    pub is_deprecated: bool,
    /// The type was generated from a user-authored asset
    pub is_generated_from_user_asset: bool,
    /// Coarse grouping for search
    pub category: String,
}

impl TypeDescriptor {
    /// Classify a registered type.
    ///
    /// The category is the host-assigned one when present, [`USER_ASSET_CATEGORY`] for user
    /// asset types, and the kind name otherwise.
    pub fn from_reflected(ty: &ReflectedType) -> Self {
        let category = if !ty.category.is_empty() {
            ty.category.clone()
        } else if ty.is_user_asset() {
            USER_ASSET_CATEGORY.to_string()
        } else {
            ty.kind.to_string()
        };

        TypeDescriptor {
            name: ty.name.clone(),
            display_name: ty.display_name.clone(),
            canonical_path: ty.path().to_string(),
            kind: ty.kind,
            parent_path: match ty.kind {
                TypeKind::Class | TypeKind::Interface => ty.parent.clone(),
                TypeKind::Struct | TypeKind::Enum => None,
            },
            is_abstract: ty.is_abstract(),
            is_deprecated: ty.is_deprecated(),
            is_generated_from_user_asset: ty.is_user_asset(),
            category,
        }
    }
}
