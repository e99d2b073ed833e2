//! Walks a [`PropertyPath`] against live instance data.

use crate::{
    property::{IndexToken, PathSegment, PropertyPath},
    reflection::{Data, FieldDescriptor, FieldKind, Instance, ReflectionRegistry, TypeKind},
    Error::{
        ArrayIndexMissing, ArrayIndexNotNumeric, CannotTraverseNonStruct, ContainerRequiresIndex,
        LayoutMismatch, MapKeyConvertFailed, MapKeyNotFound, PropertyNotFound,
        PropertyOutOfRange, SetIndexUnsupported, VariableNotFound,
    },
    Result,
};

/// Terminal slot of a resolved path.
///
/// Holds a mutable view into the owning [`Instance`]; the borrow ends with the current
/// operation and nothing about the resolution is cached.
#[derive(Debug)]
pub struct ResolvedProperty<'a> {
    /// Descriptor of the last named field on the path
    pub field: FieldDescriptor,
    /// Kind of the terminal slot (the element kind when the last segment is indexed)
    pub kind: FieldKind,
    /// Class of the owning instance
    pub owner_class: String,
    /// The resolved path in normalized form
    pub path: String,
    /// The terminal slot
    pub slot: &'a mut Data,
}

/// Resolve `path` against `instance`.
///
/// The first segment names a top-level field of the instance's class. Every following
/// segment names a field of the struct reached so far. A bracket token indexes the field it
/// is attached to: arrays by number, maps by a key converted to the declared key kind.
///
/// ## Arguments
/// * 'registry' - Registry holding the instance's class and all nested struct layouts
/// * 'instance' - Live data to walk
/// * 'path'     - Parsed path
///
/// # Errors
/// Returns the first failure encountered, qualified with the offending segment:
/// [`crate::Error::VariableNotFound`] for the first segment, [`crate::Error::PropertyNotFound`]
/// for later ones, and the container errors documented on [`crate::Error`].
pub fn resolve<'a>(
    registry: &ReflectionRegistry,
    instance: &'a mut Instance,
    path: &PropertyPath,
) -> Result<ResolvedProperty<'a>> {
    let owner_class = instance.class_path.clone();
    let layout = registry.layout(&owner_class)?;

    let root = path.root();
    let position = layout
        .iter()
        .position(|field| field.name == root.name)
        .ok_or_else(|| VariableNotFound(root.name.clone()))?;

    let mut field = layout[position].clone();
    let mut slot = instance
        .fields
        .get_mut(position)
        .ok_or_else(|| LayoutMismatch(owner_class.clone()))?;
    let mut kind = field.kind.clone();
    if let Some(token) = &root.index {
        (kind, slot) = index_into(registry, root, kind, slot, token)?;
    }

    let mut previous = root;
    for segment in &path.segments()[1..] {
        let struct_path = match &kind {
            FieldKind::Struct { struct_path } => struct_path.clone(),
            other if other.is_container() => {
                return Err(ContainerRequiresIndex(previous.to_string()))
            }
            _ => return Err(CannotTraverseNonStruct(previous.to_string())),
        };

        let layout = registry.layout(&struct_path)?;
        let position = layout
            .iter()
            .position(|candidate| candidate.name == segment.name)
            .ok_or_else(|| PropertyNotFound {
                field: segment.name.clone(),
                owner: struct_path.clone(),
            })?;

        field = layout[position].clone();
        kind = field.kind.clone();
        slot = struct_field(slot, position, &struct_path)?;
        if let Some(token) = &segment.index {
            (kind, slot) = index_into(registry, segment, kind, slot, token)?;
        }
        previous = segment;
    }

    Ok(ResolvedProperty {
        field,
        kind,
        owner_class,
        path: path.to_string(),
        slot,
    })
}

fn struct_field<'a>(slot: &'a mut Data, position: usize, struct_path: &str) -> Result<&'a mut Data> {
    match slot {
        Data::Struct(data) => data
            .fields
            .get_mut(position)
            .ok_or_else(|| LayoutMismatch(struct_path.to_string())),
        _ => Err(LayoutMismatch(struct_path.to_string())),
    }
}

fn index_into<'a>(
    registry: &ReflectionRegistry,
    segment: &PathSegment,
    kind: FieldKind,
    slot: &'a mut Data,
    token: &IndexToken,
) -> Result<(FieldKind, &'a mut Data)> {
    match (kind, slot) {
        (FieldKind::Array { element }, Data::Array(items)) => {
            let index = match token {
                IndexToken::Bare(text) if text.is_empty() => {
                    return Err(ArrayIndexMissing(segment.name.clone()))
                }
                IndexToken::Bare(text) => text.parse::<i64>().map_err(|_| ArrayIndexNotNumeric {
                    segment: segment.name.clone(),
                    token: text.clone(),
                })?,
                IndexToken::Quoted(_) => {
                    return Err(ArrayIndexNotNumeric {
                        segment: segment.name.clone(),
                        token: token.to_string(),
                    })
                }
            };

            let len = items.len();
            let item = usize::try_from(index)
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(|| PropertyOutOfRange {
                    segment: segment.name.clone(),
                    index,
                    len,
                })?;
            Ok((*element, item))
        }
        (FieldKind::Map { key, value }, Data::Map(entries)) => {
            let wanted = convert_key(registry, &key, token)?;
            let (_, entry) = entries
                .iter_mut()
                .find(|(candidate, _)| *candidate == wanted)
                .ok_or_else(|| MapKeyNotFound {
                    segment: segment.name.clone(),
                    key: token.to_string(),
                })?;
            Ok((*value, entry))
        }
        (FieldKind::Set { .. }, _) => Err(SetIndexUnsupported(segment.name.clone())),
        (kind, _) if kind.is_container() => Err(LayoutMismatch(segment.name.clone())),
        _ => Err(CannotTraverseNonStruct(segment.to_string())),
    }
}

/// Convert a bracket token into a key of the declared key kind.
///
/// Bare tokens convert to any supported key kind; quoted tokens only to string-like kinds.
/// Enum keys accept the raw value or the symbolic entry name.
///
/// # Errors
/// Returns [`crate::Error::MapKeyConvertFailed`] describing the token and the key kind.
pub fn convert_key(registry: &ReflectionRegistry, key: &FieldKind, token: &IndexToken) -> Result<Data> {
    let failed = || MapKeyConvertFailed(format!("cannot convert {token} to a {key} key"));

    if token.is_missing() {
        return Err(MapKeyConvertFailed("missing map key".to_string()));
    }

    let text = match token {
        IndexToken::Quoted(text) => {
            return match key {
                FieldKind::Str => Ok(Data::Str(text.clone())),
                FieldKind::Name => Ok(Data::Name(text.clone())),
                FieldKind::Text => Ok(Data::Text(text.clone())),
                _ => Err(failed()),
            }
        }
        IndexToken::Bare(text) => text.as_str(),
    };

    Ok(match key {
        FieldKind::Bool => match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Data::Bool(true),
            "false" | "0" => Data::Bool(false),
            _ => return Err(failed()),
        },
        FieldKind::Int32 => Data::Int32(text.parse().map_err(|_| failed())?),
        FieldKind::Int64 => Data::Int64(text.parse().map_err(|_| failed())?),
        FieldKind::Float => Data::Float(text.parse().map_err(|_| failed())?),
        FieldKind::Double => Data::Double(text.parse().map_err(|_| failed())?),
        FieldKind::Str => Data::Str(text.to_string()),
        FieldKind::Name => Data::Name(text.to_string()),
        FieldKind::Text => Data::Text(text.to_string()),
        FieldKind::Enum { enum_path, .. } => match text.parse::<i64>() {
            Ok(value) => Data::Enum(value),
            Err(_) => registry
                .get_kind(enum_path, &[TypeKind::Enum])
                .and_then(|ty| {
                    ty.enum_entries
                        .iter()
                        .find(|entry| entry.name == text)
                        .map(|entry| Data::Enum(entry.value))
                })
                .ok_or_else(failed)?,
        },
        _ => return Err(failed()),
    })
}
