use std::fmt;

use serde::Serialize;
use strum::IntoStaticStr;

/// Reflected kind of a single field.
///
/// `FieldKind` is computed once per field and is the only discriminant the resolver and the
/// marshaller dispatch on. Container kinds box their element kinds, so a `FieldKind` fully
/// describes the storage shape of a slot without consulting the owning type again.
///
/// | Kind | Storage ([`crate::reflection::Data`]) | JSON |
/// |------|-----------|------|
/// | `Bool` | `Bool` | boolean |
/// | `Int32` / `Int64` | `Int32` / `Int64` | number |
/// | `Float` / `Double` | `Float` / `Double` | number |
/// | `Str` / `Name` / `Text` | `Str` / `Name` / `Text` | string |
/// | `Enum` | `Enum` (raw value) | number |
/// | `Struct` | `Struct` | object |
/// | `Array` / `Set` | `Array` / `Set` | array |
/// | `Map` | `Map` | array of `{key, value}` |
/// | `Object` | `Object` | string or null |
/// | `SoftObject` / `SoftClass` | `SoftPath` | string or null |
/// | `Class` / `Interface` / `Delegate` | - | unsupported |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Boolean flag
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// Mutable string
    Str,
    /// Interned, case-insensitive identifier
    Name,
    /// Localizable display text
    Text,
    /// Enumeration stored as its raw integer value
    Enum {
        /// Canonical path of the enum type
        enum_path: String,
        /// Legacy byte-backed enum (values restricted to `0..=255`)
        byte_backed: bool,
    },
    /// Inline struct
    Struct {
        /// Canonical path of the struct type
        struct_path: String,
    },
    /// Hard object reference, loaded on assignment
    Object {
        /// Declared class of the referenced object
        class_path: String,
    },
    /// Hard class reference
    Class {
        /// Declared base class of the referenced class
        meta_class: String,
    },
    /// Lazy object reference, never loaded by the marshaller
    SoftObject {
        /// Declared class of the referenced object
        class_path: String,
    },
    /// Lazy class reference, never loaded by the marshaller
    SoftClass {
        /// Declared base class of the referenced class
        meta_class: String,
    },
    /// Interface reference
    Interface {
        /// Canonical path of the interface type
        class_path: String,
    },
    /// Bound delegate
    Delegate {
        /// Signature identifier of the delegate
        signature: String,
    },
    /// Ordered, growable sequence
    Array {
        /// Element kind
        element: Box<FieldKind>,
    },
    /// Unordered collection of unique elements
    Set {
        /// Element kind
        element: Box<FieldKind>,
    },
    /// Key/value association
    Map {
        /// Key kind
        key: Box<FieldKind>,
        /// Value kind
        value: Box<FieldKind>,
    },
}

impl FieldKind {
    /// Wraps `element` into an array kind.
    #[must_use]
    pub fn array_of(element: FieldKind) -> Self {
        FieldKind::Array {
            element: Box::new(element),
        }
    }

    /// Wraps `element` into a set kind.
    #[must_use]
    pub fn set_of(element: FieldKind) -> Self {
        FieldKind::Set {
            element: Box::new(element),
        }
    }

    /// Builds a map kind from independent key and value kinds.
    #[must_use]
    pub fn map_of(key: FieldKind, value: FieldKind) -> Self {
        FieldKind::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Returns `true` for array, set and map kinds.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            FieldKind::Array { .. } | FieldKind::Set { .. } | FieldKind::Map { .. }
        )
    }

    /// Returns `true` for kinds whose value is a string in the host.
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        matches!(self, FieldKind::Str | FieldKind::Name | FieldKind::Text)
    }

    /// Canonical path of the object, struct or enum type this kind is bound to.
    ///
    /// Containers report their element (or map value) type. Primitives have no associated
    /// type and return `None`.
    #[must_use]
    pub fn type_path(&self) -> Option<&str> {
        match self {
            FieldKind::Enum { enum_path, .. } => Some(enum_path),
            FieldKind::Struct { struct_path } => Some(struct_path),
            FieldKind::Object { class_path }
            | FieldKind::SoftObject { class_path }
            | FieldKind::Interface { class_path } => Some(class_path),
            FieldKind::Class { meta_class } | FieldKind::SoftClass { meta_class } => {
                Some(meta_class)
            }
            FieldKind::Array { element } | FieldKind::Set { element } => element.type_path(),
            FieldKind::Map { value, .. } => value.type_path(),
            _ => None,
        }
    }

    /// Short kind label, e.g. `"Int32"` or `"Array"`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Array { element } => write!(f, "Array<{element}>"),
            FieldKind::Set { element } => write!(f, "Set<{element}>"),
            FieldKind::Map { key, value } => write!(f, "Map<{key}, {value}>"),
            FieldKind::Enum { enum_path, .. } => write!(f, "Enum({enum_path})"),
            FieldKind::Struct { struct_path } => write!(f, "Struct({struct_path})"),
            FieldKind::Object { class_path } => write!(f, "Object({class_path})"),
            FieldKind::Class { meta_class } => write!(f, "Class({meta_class})"),
            FieldKind::SoftObject { class_path } => write!(f, "SoftObject({class_path})"),
            FieldKind::SoftClass { meta_class } => write!(f, "SoftClass({meta_class})"),
            FieldKind::Interface { class_path } => write!(f, "Interface({class_path})"),
            FieldKind::Delegate { signature } => write!(f, "Delegate({signature})"),
            other => f.write_str(other.label()),
        }
    }
}
