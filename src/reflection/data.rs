//! Owned storage of reflected slots.

use std::fmt;

use crate::{
    reflection::{FieldKind, ObjectId, ReflectionRegistry, TypeKind, RECURSION_LIMIT},
    Error::{RecursionLimit, TypeNotFound},
    Result,
};

/// Field values of one struct instance, in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructData {
    /// Canonical path of the struct type
    pub type_path: String,
    /// Values aligned with [`ReflectionRegistry::layout`] of `type_path`
    pub fields: Vec<Data>,
}

/// Runtime value of one slot.
///
/// `Data` mirrors [`FieldKind`]: every kind has exactly one storage variant, and the owning
/// object exclusively owns the whole tree. Equality is structural and is what map key lookups
/// compare with.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// [`FieldKind::Bool`]
    Bool(bool),
    /// [`FieldKind::Int32`]
    Int32(i32),
    /// [`FieldKind::Int64`]
    Int64(i64),
    /// [`FieldKind::Float`]
    Float(f32),
    /// [`FieldKind::Double`]
    Double(f64),
    /// [`FieldKind::Str`]
    Str(String),
    /// [`FieldKind::Name`]
    Name(String),
    /// [`FieldKind::Text`]
    Text(String),
    /// [`FieldKind::Enum`], raw value
    Enum(i64),
    /// [`FieldKind::Struct`]
    Struct(StructData),
    /// [`FieldKind::Array`]
    Array(Vec<Data>),
    /// [`FieldKind::Set`]
    Set(Vec<Data>),
    /// [`FieldKind::Map`], insertion ordered
    Map(Vec<(Data, Data)>),
    /// [`FieldKind::Object`] and [`FieldKind::Interface`]
    Object(Option<ObjectId>),
    /// [`FieldKind::Class`], canonical class path
    Class(Option<String>),
    /// [`FieldKind::SoftObject`] and [`FieldKind::SoftClass`], unresolved textual identifier
    SoftPath(Option<String>),
    /// [`FieldKind::Delegate`], bound function name
    Delegate(Option<String>),
}

impl Data {
    /// Default-construct the value of a slot.
    ///
    /// Struct defaults recurse through the struct's layout, enum defaults take the first
    /// declared value (or `0` for an empty enum).
    ///
    /// ## Arguments
    /// * 'kind'     - Kind of the slot
    /// * 'registry' - Registry used to look up struct layouts and enum values
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if a referenced struct is not registered, and
    /// [`crate::Error::RecursionLimit`] for structs that contain themselves by value.
    pub fn default_for(kind: &FieldKind, registry: &ReflectionRegistry) -> Result<Data> {
        Self::default_at_depth(kind, registry, 0)
    }

    fn default_at_depth(
        kind: &FieldKind,
        registry: &ReflectionRegistry,
        depth: usize,
    ) -> Result<Data> {
        Ok(match kind {
            FieldKind::Bool => Data::Bool(false),
            FieldKind::Int32 => Data::Int32(0),
            FieldKind::Int64 => Data::Int64(0),
            FieldKind::Float => Data::Float(0.0),
            FieldKind::Double => Data::Double(0.0),
            FieldKind::Str => Data::Str(String::new()),
            FieldKind::Name => Data::Name(String::new()),
            FieldKind::Text => Data::Text(String::new()),
            FieldKind::Enum { enum_path, .. } => Data::Enum(
                registry
                    .get_kind(enum_path, &[TypeKind::Enum])
                    .and_then(|ty| ty.enum_entries.first().map(|entry| entry.value))
                    .unwrap_or(0),
            ),
            FieldKind::Struct { struct_path } => {
                if registry.get_kind(struct_path, &[TypeKind::Struct]).is_none() {
                    return Err(TypeNotFound(struct_path.clone()));
                }
                if depth >= RECURSION_LIMIT {
                    return Err(RecursionLimit(RECURSION_LIMIT));
                }

                let fields = registry
                    .layout(struct_path)?
                    .iter()
                    .map(|field| Data::default_at_depth(&field.kind, registry, depth + 1))
                    .collect::<Result<Vec<_>>>()?;

                Data::Struct(StructData {
                    type_path: struct_path.clone(),
                    fields,
                })
            }
            FieldKind::Array { .. } => Data::Array(Vec::new()),
            FieldKind::Set { .. } => Data::Set(Vec::new()),
            FieldKind::Map { .. } => Data::Map(Vec::new()),
            FieldKind::Object { .. } | FieldKind::Interface { .. } => Data::Object(None),
            FieldKind::Class { .. } => Data::Class(None),
            FieldKind::SoftObject { .. } | FieldKind::SoftClass { .. } => Data::SoftPath(None),
            FieldKind::Delegate { .. } => Data::Delegate(None),
        })
    }

    /// Storage variant name, used in layout mismatch diagnostics
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Data::Bool(_) => "Bool",
            Data::Int32(_) => "Int32",
            Data::Int64(_) => "Int64",
            Data::Float(_) => "Float",
            Data::Double(_) => "Double",
            Data::Str(_) => "Str",
            Data::Name(_) => "Name",
            Data::Text(_) => "Text",
            Data::Enum(_) => "Enum",
            Data::Struct(_) => "Struct",
            Data::Array(_) => "Array",
            Data::Set(_) => "Set",
            Data::Map(_) => "Map",
            Data::Object(_) => "Object",
            Data::Class(_) => "Class",
            Data::SoftPath(_) => "SoftPath",
            Data::Delegate(_) => "Delegate",
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Bool(value) => write!(f, "{value}"),
            Data::Int32(value) => write!(f, "{value}"),
            Data::Int64(value) | Data::Enum(value) => write!(f, "{value}"),
            Data::Float(value) => write!(f, "{value}"),
            Data::Double(value) => write!(f, "{value}"),
            Data::Str(value) | Data::Name(value) | Data::Text(value) => write!(f, "\"{value}\""),
            Data::Struct(data) => write!(f, "{}{{..}}", data.type_path),
            Data::Array(items) | Data::Set(items) => write!(f, "[{} items]", items.len()),
            Data::Map(entries) => write!(f, "{{{} entries}}", entries.len()),
            Data::Object(Some(id)) => write!(f, "{id}"),
            Data::Class(Some(path)) | Data::SoftPath(Some(path)) | Data::Delegate(Some(path)) => {
                f.write_str(path)
            }
            Data::Object(None) | Data::Class(None) | Data::SoftPath(None) | Data::Delegate(None) => {
                f.write_str("None")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ReflectedType;

    #[test]
    fn test_struct_defaults_recurse() {
        let registry = ReflectionRegistry::new();
        registry.register(
            ReflectedType::enumeration("/Script/Game", "EMood")
                .with_entry("Calm", 3)
                .with_entry("Angry", 4),
        );
        registry.register(
            ReflectedType::structure("/Script/Game", "Stats")
                .with_field("Health", FieldKind::Float)
                .with_field(
                    "Mood",
                    FieldKind::Enum {
                        enum_path: "/Script/Game.EMood".into(),
                        byte_backed: false,
                    },
                )
                .with_field("Tags", FieldKind::array_of(FieldKind::Name)),
        );

        let data = Data::default_for(
            &FieldKind::Struct {
                struct_path: "/Script/Game.Stats".into(),
            },
            &registry,
        )
        .unwrap();

        assert_eq!(
            data,
            Data::Struct(StructData {
                type_path: "/Script/Game.Stats".into(),
                fields: vec![Data::Float(0.0), Data::Enum(3), Data::Array(vec![])],
            })
        );
    }

    #[test]
    fn test_missing_struct() {
        let registry = ReflectionRegistry::new();
        let result = Data::default_for(
            &FieldKind::Struct {
                struct_path: "/Script/Game.Nope".into(),
            },
            &registry,
        );
        assert!(matches!(result, Err(crate::Error::TypeNotFound(_))));
    }

    #[test]
    fn test_self_containing_struct() {
        let registry = ReflectionRegistry::new();
        registry.register(ReflectedType::structure("/Script/Game", "Node").with_field(
            "Next",
            FieldKind::Struct {
                struct_path: "/Script/Game.Node".into(),
            },
        ));

        let result = Data::default_for(
            &FieldKind::Struct {
                struct_path: "/Script/Game.Node".into(),
            },
            &registry,
        );
        assert!(matches!(
            result,
            Err(crate::Error::RecursionLimit(RECURSION_LIMIT))
        ));
    }
}
