//! # propscope Prelude
//!
//! Re-exports of the types most applications need: the registry to describe types, the
//! world to hold live objects, and the command service or property scope to access them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all propscope operations
pub use crate::Error;

/// The result type used throughout propscope
pub use crate::Result;

/// Configuration of the catalog and the command facade
pub use crate::{CatalogConfig, ServiceConfig};

// ================================================================================================
// Reflection Model
// ================================================================================================

/// Type registry and reflected type descriptions
pub use crate::reflection::{
    FieldDescriptor, FieldFlags, ReflectedType, ReflectionRegistry, TypeFlags, TypeKind,
};

/// Field kinds and slot storage
pub use crate::reflection::{Data, FieldKind, Instance};

/// Object identities
pub use crate::reflection::{ObjectDirectory, ObjectId};

// ================================================================================================
// Components
// ================================================================================================

/// Type catalog
pub use crate::catalog::{TypeCatalog, TypeDescriptor, TypeQuery};

/// Field type resolution
pub use crate::fieldtype::{
    ContainerDescriptor, ContainerKind, FieldTypeResolver, FieldTypeSpec, ReferenceMode,
};

/// Property paths and access
pub use crate::property::{PropertyPath, PropertyScope, PropertyValue};

/// Host model
pub use crate::host::{Owner, VariableDefinition, World};

/// Command facade
pub use crate::commands::{CommandService, FailureCode, Response};
