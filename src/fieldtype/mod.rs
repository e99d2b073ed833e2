//! Field type resolution.
//!
//! Maps a canonical type path plus a container descriptor to the
//! [`FieldKind`](crate::reflection::FieldKind) the host uses
//! when declaring a new field, independent of any live instance.
//!
//! # Key Components
//!
//! - [`FieldTypeSpec`]: Input of the resolution (type path, container, reference mode)
//! - [`ContainerDescriptor`]: None/Array/Set/Map with optional key and value type paths
//! - [`FieldTypeResolver`]: Memoizing resolver over the live registry
//! - [`PrimitiveKind`]: Table of built-in primitive paths
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use propscope::{
//!     fieldtype::{ContainerDescriptor, FieldTypeResolver, FieldTypeSpec},
//!     reflection::{FieldKind, ReflectionRegistry},
//! };
//!
//! let resolver = FieldTypeResolver::new(Arc::new(ReflectionRegistry::new()));
//! let spec = FieldTypeSpec::new("/Script/Core.Int32").with_container(ContainerDescriptor::array());
//!
//! assert_eq!(
//!     resolver.resolve_field_type(&spec)?,
//!     FieldKind::array_of(FieldKind::Int32)
//! );
//! # Ok::<(), propscope::Error>(())
//! ```

mod primitives;
mod resolver;

pub use primitives::{PrimitiveKind, PRIMITIVE_MODULE};
pub use resolver::{split_type_path, FieldTypeResolver, ResolverCacheStats};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Container shape of a declared field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContainerKind {
    /// Single value
    #[default]
    None,
    /// Ordered sequence
    Array,
    /// Unique elements
    Set,
    /// Key/value association
    Map,
}

/// Container descriptor of a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerDescriptor {
    /// Container shape
    pub kind: ContainerKind,
    /// Map key type; falls back to `FieldTypeSpec::type_path` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type_path: Option<String>,
    /// Map value type; falls back to `FieldTypeSpec::type_path` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type_path: Option<String>,
}

impl ContainerDescriptor {
    /// No container
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Array container
    #[must_use]
    pub fn array() -> Self {
        ContainerDescriptor {
            kind: ContainerKind::Array,
            ..Self::default()
        }
    }

    /// Set container
    #[must_use]
    pub fn set() -> Self {
        ContainerDescriptor {
            kind: ContainerKind::Set,
            ..Self::default()
        }
    }

    /// Map container with explicit key and value types
    #[must_use]
    pub fn map(key_type_path: impl Into<String>, value_type_path: impl Into<String>) -> Self {
        ContainerDescriptor {
            kind: ContainerKind::Map,
            key_type_path: Some(key_type_path.into()),
            value_type_path: Some(value_type_path.into()),
        }
    }
}

/// How a class-typed field refers to its target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReferenceMode {
    /// Hard object reference
    #[default]
    Object,
    /// Hard class reference
    Class,
    /// Lazy object reference
    SoftObject,
    /// Lazy class reference
    SoftClass,
}

/// Input of [`FieldTypeResolver::resolve_field_type`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldTypeSpec {
    /// Canonical type path of the (element) type
    pub type_path: String,
    /// Container shape
    #[serde(default)]
    pub container: ContainerDescriptor,
    /// Reference mode for class types
    #[serde(default)]
    pub reference: ReferenceMode,
}

impl FieldTypeSpec {
    /// Spec for a single value of `type_path`
    pub fn new(type_path: impl Into<String>) -> Self {
        FieldTypeSpec {
            type_path: type_path.into(),
            container: ContainerDescriptor::none(),
            reference: ReferenceMode::Object,
        }
    }

    /// Set the container descriptor
    #[must_use]
    pub fn with_container(mut self, container: ContainerDescriptor) -> Self {
        self.container = container;
        self
    }

    /// Set the reference mode
    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceMode) -> Self {
        self.reference = reference;
        self
    }
}
