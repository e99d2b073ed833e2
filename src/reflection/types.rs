use std::{collections::BTreeMap, sync::Arc};

use bitflags::bitflags;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::reflection::FieldKind;

/// A reference-counted pointer to a [`ReflectedType`]
pub type ReflectedTypeRc = Arc<ReflectedType>;

/// Coarse classification of a reflected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TypeKind {
    /// Reference type with single inheritance
    Class,
    /// Inline value type
    Struct,
    /// Enumeration
    Enum,
    /// Interface implemented by classes
    Interface,
}

bitflags! {
    /// Type-level flags reported by the host registry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// The type cannot be instantiated
        const ABSTRACT = 0x0001;
        /// The type is deprecated and kept for compatibility
        const DEPRECATED = 0x0002;
        /// The type was generated from a user-authored asset
        const USER_ASSET = 0x0004;
        /// A newer version of this type has been registered (stale duplicate)
        const NEWER_VERSION_EXISTS = 0x0008;
    }
}

bitflags! {
    /// Field-level flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u32 {
        /// Only visible to the declaring type
        const PRIVATE = 0x0001;
        /// Exposed as a construction parameter when spawning instances
        const EXPOSE_ON_SPAWN = 0x0002;
        /// Editable in the host editor
        const EDITABLE = 0x0004;
    }
}

/// One named, typed slot declared on a class or struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, unique within the declaring type's layout
    pub name: String,
    /// Reflected kind of the field
    pub kind: FieldKind,
    /// Field flags
    pub flags: FieldFlags,
    /// Free-form metadata (category, tooltip, ...)
    pub metadata: BTreeMap<String, String>,
}

impl FieldDescriptor {
    /// Create a new field descriptor without flags or metadata
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDescriptor {
            name: name.into(),
            kind,
            flags: FieldFlags::EDITABLE,
            metadata: BTreeMap::new(),
        }
    }
}

/// One named value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Symbolic name
    pub name: String,
    /// Raw integer value
    pub value: i64,
}

/// A reflected type as known to the host registry.
///
/// Types are immutable once registered; changing a type means registering a replacement under
/// the same canonical path (see [`crate::reflection::ReflectionRegistry::register`]).
#[derive(Debug, Clone)]
pub struct ReflectedType {
    /// Local name, e.g. `Vector`
    pub name: String,
    /// Owning module or package, e.g. `/Script/CoreUObject`
    pub module: String,
    /// Human readable name
    pub display_name: String,
    /// Type classification
    pub kind: TypeKind,
    /// Canonical path of the parent type (classes and interfaces only)
    pub parent: Option<String>,
    /// Type flags
    pub flags: TypeFlags,
    /// Coarse grouping for search; empty when the host does not assign one
    pub category: String,
    /// Fields declared on this type, excluding inherited ones
    pub fields: Vec<FieldDescriptor>,
    /// Values of an enum type
    pub enum_entries: Vec<EnumEntry>,
    path: String,
}

impl ReflectedType {
    /// Create a new type of the given kind.
    ///
    /// ## Arguments
    /// * 'kind'   - Type classification
    /// * 'module' - Owning module or package
    /// * 'name'   - Local name
    pub fn new(kind: TypeKind, module: impl Into<String>, name: impl Into<String>) -> Self {
        let module = module.into();
        let name = name.into();
        ReflectedType {
            path: format!("{module}.{name}"),
            display_name: name.clone(),
            name,
            module,
            kind,
            parent: None,
            flags: TypeFlags::empty(),
            category: String::new(),
            fields: Vec::new(),
            enum_entries: Vec::new(),
        }
    }

    /// Shortcut for [`ReflectedType::new`] with [`TypeKind::Class`]
    pub fn class(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, module, name)
    }

    /// Shortcut for [`ReflectedType::new`] with [`TypeKind::Struct`]
    pub fn structure(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Struct, module, name)
    }

    /// Shortcut for [`ReflectedType::new`] with [`TypeKind::Enum`]
    pub fn enumeration(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Enum, module, name)
    }

    /// Shortcut for [`ReflectedType::new`] with [`TypeKind::Interface`]
    pub fn interface(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, module, name)
    }

    /// Set the parent type
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add type flags
    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the display name
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the search category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Append a declared field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind));
        self
    }

    /// Append a fully described field
    #[must_use]
    pub fn with_descriptor(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Append an enum value
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, value: i64) -> Self {
        self.enum_entries.push(EnumEntry {
            name: name.into(),
            value,
        });
        self
    }

    /// Returns the canonical path (`module.Name`) of this type
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if the type carries [`TypeFlags::ABSTRACT`]
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Returns `true` if the type carries [`TypeFlags::DEPRECATED`]
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.flags.contains(TypeFlags::DEPRECATED)
    }

    /// Returns `true` if the type was generated from a user-authored asset
    #[must_use]
    pub fn is_user_asset(&self) -> bool {
        self.flags.contains(TypeFlags::USER_ASSET)
    }

    /// Looks up the symbolic name of a raw enum value
    #[must_use]
    pub fn enum_name_of(&self, value: i64) -> Option<&str> {
        self.enum_entries
            .iter()
            .find(|entry| entry.value == value)
            .map(|entry| entry.name.as_str())
    }
}
