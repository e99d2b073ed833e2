use std::fmt;

use strum::{EnumIter, IntoEnumIterator};

use crate::reflection::FieldKind;

/// Module that owns the built-in primitive type paths
pub const PRIMITIVE_MODULE: &str = "/Script/Core";

/// Built-in field categories that resolve without a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Mutable string
    String,
    /// Interned name
    Name,
    /// Localizable text
    Text,
}

impl PrimitiveKind {
    /// Local name within [`PRIMITIVE_MODULE`]
    #[must_use]
    pub fn local_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "Bool",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::String => "String",
            PrimitiveKind::Name => "Name",
            PrimitiveKind::Text => "Text",
        }
    }

    /// Canonical path, e.g. `/Script/Core.Int32`
    #[must_use]
    pub fn path(self) -> String {
        format!("{PRIMITIVE_MODULE}.{}", self.local_name())
    }

    /// Look up a primitive by canonical path
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let (module, name) = path.rsplit_once('.')?;
        if module != PRIMITIVE_MODULE {
            return None;
        }
        PrimitiveKind::iter().find(|kind| kind.local_name() == name)
    }

    /// Field kind this primitive maps to
    #[must_use]
    pub fn field_kind(self) -> FieldKind {
        match self {
            PrimitiveKind::Bool => FieldKind::Bool,
            PrimitiveKind::Int32 => FieldKind::Int32,
            PrimitiveKind::Int64 => FieldKind::Int64,
            PrimitiveKind::Float => FieldKind::Float,
            PrimitiveKind::Double => FieldKind::Double,
            PrimitiveKind::String => FieldKind::Str,
            PrimitiveKind::Name => FieldKind::Name,
            PrimitiveKind::Text => FieldKind::Text,
        }
    }

    /// Inverse of [`PrimitiveKind::field_kind`]
    #[must_use]
    pub fn from_field_kind(kind: &FieldKind) -> Option<Self> {
        Some(match kind {
            FieldKind::Bool => PrimitiveKind::Bool,
            FieldKind::Int32 => PrimitiveKind::Int32,
            FieldKind::Int64 => PrimitiveKind::Int64,
            FieldKind::Float => PrimitiveKind::Float,
            FieldKind::Double => PrimitiveKind::Double,
            FieldKind::Str => PrimitiveKind::String,
            FieldKind::Name => PrimitiveKind::Name,
            FieldKind::Text => PrimitiveKind::Text,
            _ => return None,
        })
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
