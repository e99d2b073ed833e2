//! Conversion between slot [`Data`] and JSON values.
//!
//! | Kind | Read | Write |
//! |------|------|-------|
//! | primitives | scalar | scalar, with lenient coercion |
//! | enum | raw integer | raw integer, or entry name |
//! | struct | object in layout order | object, unknown keys ignored |
//! | array | array | array, replaces the contents |
//! | set | array | `SET_SET_UNSUPPORTED` |
//! | map | array of `{key, value}` | `MAP_SET_UNSUPPORTED` |
//! | object | identifier or null | identifier (loaded) or null |
//! | soft object / soft class | identifier or null | identifier (not loaded) or null |
//! | class / interface / delegate | `UNSUPPORTED_PROPERTY_TYPE` | `UNSUPPORTED_PROPERTY_TYPE` |

use serde_json::{Map, Number, Value};

use crate::{
    reflection::{Data, FieldKind, ObjectDirectory, ReflectionRegistry, StructData, TypeKind},
    Error::{
        LayoutMismatch, MapSetUnsupported, ObjectLoadFailed, ObjectTypeMismatch,
        SetSetUnsupported, UnsupportedPropertyType, ValueOutOfRange,
    },
    Result,
};

/// Registry and object directory a conversion runs against.
#[derive(Clone, Copy)]
pub struct MarshalContext<'r> {
    registry: &'r ReflectionRegistry,
    objects: &'r ObjectDirectory,
}

impl<'r> MarshalContext<'r> {
    /// Create a context
    pub fn new(registry: &'r ReflectionRegistry, objects: &'r ObjectDirectory) -> Self {
        MarshalContext { registry, objects }
    }

    /// Serialize a slot.
    ///
    /// ## Arguments
    /// * 'kind' - Reflected kind of the slot
    /// * 'data' - Current slot value
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedPropertyType`] for kinds outside the allow-list and
    /// [`crate::Error::LayoutMismatch`] if `data` does not have the shape `kind` describes.
    /// A hard reference to an object missing from the directory fails with
    /// [`crate::Error::ObjectLoadFailed`].
    pub fn to_value(&self, kind: &FieldKind, data: &Data) -> Result<Value> {
        Ok(match (kind, data) {
            (FieldKind::Bool, Data::Bool(value)) => Value::Bool(*value),
            (FieldKind::Int32, Data::Int32(value)) => Value::from(*value),
            (FieldKind::Int64, Data::Int64(value)) => Value::from(*value),
            (FieldKind::Float, Data::Float(value)) => float_value(f64::from(*value), || {
                value.to_string().parse::<f64>().ok()
            }),
            (FieldKind::Double, Data::Double(value)) => float_value(*value, || Some(*value)),
            (FieldKind::Str, Data::Str(text))
            | (FieldKind::Name, Data::Name(text))
            | (FieldKind::Text, Data::Text(text)) => Value::String(text.clone()),
            (FieldKind::Enum { .. }, Data::Enum(value)) => Value::from(*value),
            (FieldKind::Struct { struct_path }, Data::Struct(data)) => {
                let layout = self.registry.layout(struct_path)?;
                if layout.len() != data.fields.len() {
                    return Err(LayoutMismatch(struct_path.clone()));
                }

                let mut object = Map::with_capacity(layout.len());
                for (field, value) in layout.iter().zip(&data.fields) {
                    object.insert(field.name.clone(), self.to_value(&field.kind, value)?);
                }
                Value::Object(object)
            }
            (FieldKind::Array { element }, Data::Array(items))
            | (FieldKind::Set { element }, Data::Set(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| self.to_value(element, item))
                    .collect::<Result<_>>()?,
            ),
            (FieldKind::Map { key, value }, Data::Map(entries)) => Value::Array(
                entries
                    .iter()
                    .map(|(entry_key, entry_value)| {
                        let mut pair = Map::with_capacity(2);
                        pair.insert("key".to_string(), self.to_value(key, entry_key)?);
                        pair.insert("value".to_string(), self.to_value(value, entry_value)?);
                        Ok(Value::Object(pair))
                    })
                    .collect::<Result<_>>()?,
            ),
            (FieldKind::Object { .. }, Data::Object(None)) => Value::Null,
            (FieldKind::Object { .. }, Data::Object(Some(id))) => Value::String(
                self.objects
                    .path_of(*id)
                    .ok_or_else(|| ObjectLoadFailed(id.to_string()))?,
            ),
            (FieldKind::SoftObject { .. } | FieldKind::SoftClass { .. }, Data::SoftPath(path)) => {
                path.clone().map_or(Value::Null, Value::String)
            }
            (
                FieldKind::Class { .. } | FieldKind::Interface { .. } | FieldKind::Delegate { .. },
                _,
            ) => return Err(UnsupportedPropertyType(kind.to_string())),
            (kind, data) => {
                return Err(LayoutMismatch(format!(
                    "{kind} slot holds {}",
                    data.variant_name()
                )))
            }
        })
    }

    /// Deserialize a JSON value into a new slot value.
    ///
    /// Nothing is written: the caller commits the returned value, so a failed conversion
    /// leaves the slot untouched. `current` seeds fields a partial struct object does not
    /// mention.
    ///
    /// ## Arguments
    /// * 'kind'    - Reflected kind of the slot
    /// * 'value'   - Incoming JSON value
    /// * 'current' - Current slot value
    ///
    /// # Errors
    /// Returns [`crate::Error::ValueTypeMismatch`] or [`crate::Error::ValueOutOfRange`] for
    /// values the kind cannot hold, the container write errors for sets and maps, and the
    /// object errors for hard references that fail to load or have an incompatible class.
    pub fn from_value(&self, kind: &FieldKind, value: &Value, current: &Data) -> Result<Data> {
        Ok(match kind {
            FieldKind::Bool => Data::Bool(to_bool(value)?),
            FieldKind::Int32 => {
                let raw = to_integer(value)?;
                Data::Int32(i32::try_from(raw).map_err(|_| out_of_range(raw, "Int32"))?)
            }
            FieldKind::Int64 => Data::Int64(to_integer(value)?),
            FieldKind::Float => {
                let raw = to_float(value)?;
                if raw.abs() > f64::from(f32::MAX) {
                    return Err(out_of_range(raw, "Float"));
                }
                Data::Float(raw as f32)
            }
            FieldKind::Double => Data::Double(to_float(value)?),
            FieldKind::Str => Data::Str(to_text(value)?),
            FieldKind::Name => Data::Name(to_text(value)?),
            FieldKind::Text => Data::Text(to_text(value)?),
            FieldKind::Enum {
                enum_path,
                byte_backed,
            } => {
                let raw = match value {
                    Value::String(name) if name.trim().parse::<i64>().is_err() => self
                        .registry
                        .get_kind(enum_path, &[TypeKind::Enum])
                        .and_then(|ty| {
                            ty.enum_entries
                                .iter()
                                .find(|entry| entry.name == *name)
                                .map(|entry| entry.value)
                        })
                        .ok_or_else(|| type_mismatch!(format!("a value of {enum_path}"), value))?,
                    _ => to_integer(value)?,
                };
                if *byte_backed && !(0..=255).contains(&raw) {
                    return Err(out_of_range(raw, "Byte"));
                }
                Data::Enum(raw)
            }
            FieldKind::Struct { struct_path } => {
                let Value::Object(object) = value else {
                    return Err(type_mismatch!("an object", value));
                };
                let Data::Struct(current) = current else {
                    return Err(LayoutMismatch(struct_path.clone()));
                };

                let layout = self.registry.layout(struct_path)?;
                if layout.len() != current.fields.len() {
                    return Err(LayoutMismatch(struct_path.clone()));
                }

                let fields = layout
                    .iter()
                    .zip(&current.fields)
                    .map(|(field, existing)| match object.get(&field.name) {
                        Some(incoming) => self.from_value(&field.kind, incoming, existing),
                        None => Ok(existing.clone()),
                    })
                    .collect::<Result<Vec<_>>>()?;

                for name in object.keys() {
                    if !layout.iter().any(|field| field.name == *name) {
                        log::debug!("ignoring unknown field {name} for {struct_path}");
                    }
                }

                Data::Struct(StructData {
                    type_path: struct_path.clone(),
                    fields,
                })
            }
            FieldKind::Array { element } => {
                let Value::Array(items) = value else {
                    return Err(type_mismatch!("an array", value));
                };

                let seed = Data::default_for(element, self.registry)?;
                Data::Array(
                    items
                        .iter()
                        .map(|item| self.from_value(element, item, &seed))
                        .collect::<Result<_>>()?,
                )
            }
            FieldKind::Set { .. } => return Err(SetSetUnsupported(kind.to_string())),
            FieldKind::Map { .. } => return Err(MapSetUnsupported(kind.to_string())),
            FieldKind::Object { class_path } => match value {
                Value::Null => Data::Object(None),
                Value::String(path) if path.is_empty() => Data::Object(None),
                Value::String(path) => {
                    let entry = self
                        .objects
                        .load(path)
                        .ok_or_else(|| ObjectLoadFailed(path.clone()))?;
                    if !self.registry.is_child_of(&entry.class_path, class_path) {
                        return Err(ObjectTypeMismatch {
                            path: path.clone(),
                            actual: entry.class_path.clone(),
                            expected: class_path.clone(),
                        });
                    }
                    Data::Object(Some(entry.id))
                }
                _ => return Err(type_mismatch!("an object identifier or null", value)),
            },
            FieldKind::SoftObject { .. } | FieldKind::SoftClass { .. } => match value {
                Value::Null => Data::SoftPath(None),
                Value::String(path) if path.is_empty() => Data::SoftPath(None),
                Value::String(path) => Data::SoftPath(Some(path.clone())),
                _ => return Err(type_mismatch!("an object identifier or null", value)),
            },
            FieldKind::Class { .. } | FieldKind::Interface { .. } | FieldKind::Delegate { .. } => {
                return Err(UnsupportedPropertyType(kind.to_string()))
            }
        })
    }
}

fn float_value(value: f64, shortest: impl FnOnce() -> Option<f64>) -> Value {
    shortest()
        .and_then(Number::from_f64)
        .or_else(|| Number::from_f64(value))
        .map_or(Value::Null, Value::Number)
}

fn out_of_range(value: impl ToString, target: &'static str) -> crate::Error {
    ValueOutOfRange {
        value: value.to_string(),
        target,
    }
}

fn to_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(text) => {
            let text = text.trim();
            Ok(["true", "yes", "on"]
                .iter()
                .any(|truthy| text.eq_ignore_ascii_case(truthy))
                || text.parse::<f64>().is_ok_and(|n| n != 0.0))
        }
        _ => Err(type_mismatch!("a boolean", value)),
    }
}

fn to_integer(value: &Value) -> Result<i64> {
    match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                return Ok(integer);
            }
            if number.is_u64() {
                return Err(out_of_range(number, "Int64"));
            }
            match number.as_f64() {
                Some(float) if float.fract() == 0.0 && float.abs() < 9.2e18 => Ok(float as i64),
                Some(float) if float.fract() == 0.0 => Err(out_of_range(float, "Int64")),
                _ => Err(type_mismatch!("an integer", value)),
            }
        }
        Value::Bool(flag) => Ok(i64::from(*flag)),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| type_mismatch!("an integer", value)),
        _ => Err(type_mismatch!("an integer", value)),
    }
}

/// Parse a JSON number, bool or numeric string into a finite float
fn to_float(value: &Value) -> Result<f64> {
    let raw = match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| type_mismatch!("a number", value))?,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| type_mismatch!("a number", value))?,
        _ => return Err(type_mismatch!("a number", value)),
    };
    if raw.is_finite() {
        Ok(raw)
    } else {
        Err(type_mismatch!("a finite number", value))
    }
}

fn to_text(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(type_mismatch!("a string", value)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        test::{fixture_objects, fixture_registry},
        Error,
    };

    fn stats_kind() -> FieldKind {
        FieldKind::Struct {
            struct_path: "/Script/Game.Stats".into(),
        }
    }

    #[test]
    fn test_primitive_coercion() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);

        assert_eq!(
            ctx.from_value(&FieldKind::Bool, &json!("Yes"), &Data::Bool(false)).unwrap(),
            Data::Bool(true)
        );
        assert_eq!(
            ctx.from_value(&FieldKind::Bool, &json!("nope"), &Data::Bool(true)).unwrap(),
            Data::Bool(false)
        );
        assert_eq!(
            ctx.from_value(&FieldKind::Int32, &json!("42"), &Data::Int32(0)).unwrap(),
            Data::Int32(42)
        );
        assert_eq!(
            ctx.from_value(&FieldKind::Int32, &json!(7.0), &Data::Int32(0)).unwrap(),
            Data::Int32(7)
        );
        assert_eq!(
            ctx.from_value(&FieldKind::Name, &json!(5), &Data::Name(String::new())).unwrap(),
            Data::Name("5".into())
        );
        assert_eq!(
            ctx.to_value(&FieldKind::Float, &Data::Float(0.1)).unwrap(),
            json!(0.1)
        );
    }

    #[test]
    fn test_primitive_rejections() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);

        assert!(matches!(
            ctx.from_value(&FieldKind::Int32, &json!(3_000_000_000_i64), &Data::Int32(0)),
            Err(Error::ValueOutOfRange { target: "Int32", .. })
        ));
        assert!(matches!(
            ctx.from_value(&FieldKind::Int64, &json!(1.5), &Data::Int64(0)),
            Err(Error::ValueTypeMismatch { .. })
        ));
        assert!(matches!(
            ctx.from_value(&FieldKind::Float, &json!(1e300), &Data::Float(0.0)),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert_eq!(
            ctx.from_value(&FieldKind::Str, &json!([1]), &Data::Str(String::new()))
                .unwrap_err()
                .code(),
            "VALUE_TYPE_MISMATCH"
        );
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);

        for text in ["NaN", "inf", "-infinity"] {
            assert!(matches!(
                ctx.from_value(&FieldKind::Float, &json!(text), &Data::Float(1.0)),
                Err(Error::ValueTypeMismatch { .. })
            ));
            assert!(matches!(
                ctx.from_value(&FieldKind::Double, &json!(text), &Data::Double(1.0)),
                Err(Error::ValueTypeMismatch { .. })
            ));
        }
        assert_eq!(
            ctx.from_value(&FieldKind::Double, &json!(" 2.5 "), &Data::Double(0.0)).unwrap(),
            Data::Double(2.5)
        );
    }

    #[test]
    fn test_enums_use_raw_values() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);
        let kind = FieldKind::Enum {
            enum_path: "/Script/Game.EMood".into(),
            byte_backed: true,
        };

        assert_eq!(ctx.to_value(&kind, &Data::Enum(2)).unwrap(), json!(2));
        assert_eq!(
            ctx.from_value(&kind, &json!("Angry"), &Data::Enum(0)).unwrap(),
            Data::Enum(2)
        );
        assert_eq!(
            ctx.from_value(&kind, &json!("1"), &Data::Enum(0)).unwrap(),
            Data::Enum(1)
        );
        assert!(matches!(
            ctx.from_value(&kind, &json!(300), &Data::Enum(0)),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            ctx.from_value(&kind, &json!("Sleepy"), &Data::Enum(0)),
            Err(Error::ValueTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_struct_partial_update() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);

        let current = Data::default_for(&stats_kind(), &registry).unwrap();
        let updated = ctx
            .from_value(&stats_kind(), &json!({"Mana": 12, "Unknown": true}), &current)
            .unwrap();
        assert_eq!(
            ctx.to_value(&stats_kind(), &updated).unwrap(),
            json!({"Health": 0.0, "Mana": 12.0})
        );

        assert!(matches!(
            ctx.from_value(&stats_kind(), &json!({"Mana": "lots"}), &current),
            Err(Error::ValueTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_containers() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);

        let kind = FieldKind::array_of(FieldKind::Int32);
        let data = ctx
            .from_value(&kind, &json!([1, "2", 3]), &Data::Array(vec![Data::Int32(9); 5]))
            .unwrap();
        assert_eq!(ctx.to_value(&kind, &data).unwrap(), json!([1, 2, 3]));

        let kind = FieldKind::map_of(FieldKind::Int32, FieldKind::Str);
        let data = Data::Map(vec![(Data::Int32(1), Data::Str("Town".into()))]);
        assert_eq!(
            ctx.to_value(&kind, &data).unwrap(),
            json!([{"key": 1, "value": "Town"}])
        );
        assert!(matches!(
            ctx.from_value(&kind, &json!([]), &data),
            Err(Error::MapSetUnsupported(_))
        ));

        let kind = FieldKind::set_of(FieldKind::Name);
        let data = Data::Set(vec![Data::Name("hero".into())]);
        assert_eq!(ctx.to_value(&kind, &data).unwrap(), json!(["hero"]));
        assert!(matches!(
            ctx.from_value(&kind, &json!(["x"]), &data),
            Err(Error::SetSetUnsupported(_))
        ));
    }

    #[test]
    fn test_object_references() {
        let registry = fixture_registry();
        let (objects, sword, _) = fixture_objects();
        let ctx = MarshalContext::new(&registry, &objects);
        let kind = FieldKind::Object {
            class_path: "/Script/Game.Item".into(),
        };

        let data = ctx
            .from_value(&kind, &json!("/Game/Items/Sword.Sword"), &Data::Object(None))
            .unwrap();
        assert_eq!(data, Data::Object(Some(sword)));
        assert!(objects.get(sword).unwrap().is_loaded());
        assert_eq!(
            ctx.to_value(&kind, &data).unwrap(),
            json!("/Game/Items/Sword.Sword")
        );
        assert_eq!(ctx.to_value(&kind, &Data::Object(None)).unwrap(), Value::Null);

        assert!(matches!(
            ctx.from_value(&kind, &json!("/Game/Items/Missing.Missing"), &Data::Object(None)),
            Err(Error::ObjectLoadFailed(_))
        ));
        assert!(matches!(
            ctx.from_value(&kind, &json!("/Game/Maps/Arena.Arena"), &Data::Object(None)),
            Err(Error::ObjectTypeMismatch { .. })
        ));
        assert_eq!(
            ctx.from_value(&kind, &Value::Null, &Data::Object(Some(sword))).unwrap(),
            Data::Object(None)
        );
    }

    #[test]
    fn test_dangling_object_reference() {
        let registry = fixture_registry();
        let (_, sword, _) = fixture_objects();
        let empty = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &empty);
        let kind = FieldKind::Object {
            class_path: "/Script/Game.Item".into(),
        };

        assert!(matches!(
            ctx.to_value(&kind, &Data::Object(Some(sword))),
            Err(Error::ObjectLoadFailed(_))
        ));
        assert_eq!(ctx.to_value(&kind, &Data::Object(None)).unwrap(), Value::Null);
    }

    #[test]
    fn test_soft_references_do_not_load() {
        let registry = fixture_registry();
        let (objects, _, shield) = fixture_objects();
        let ctx = MarshalContext::new(&registry, &objects);
        let kind = FieldKind::SoftObject {
            class_path: "/Script/Game.Item".into(),
        };

        let data = ctx
            .from_value(&kind, &json!("/Game/Items/Shield.Shield"), &Data::SoftPath(None))
            .unwrap();
        assert_eq!(data, Data::SoftPath(Some("/Game/Items/Shield.Shield".into())));
        assert!(!objects.get(shield).unwrap().is_loaded());
        assert_eq!(
            ctx.to_value(&kind, &data).unwrap(),
            json!("/Game/Items/Shield.Shield")
        );
    }

    #[test]
    fn test_unsupported_kinds_fail_loudly() {
        let registry = fixture_registry();
        let objects = ObjectDirectory::new();
        let ctx = MarshalContext::new(&registry, &objects);

        for (kind, data) in [
            (
                FieldKind::Delegate {
                    signature: "OnHit".into(),
                },
                Data::Delegate(None),
            ),
            (
                FieldKind::Class {
                    meta_class: "/Script/Game.Item".into(),
                },
                Data::Class(None),
            ),
            (
                FieldKind::Interface {
                    class_path: "/Script/Game.Usable".into(),
                },
                Data::Object(None),
            ),
        ] {
            assert!(matches!(
                ctx.to_value(&kind, &data),
                Err(Error::UnsupportedPropertyType(_))
            ));
            assert!(matches!(
                ctx.from_value(&kind, &Value::Null, &data),
                Err(Error::UnsupportedPropertyType(_))
            ));
        }
    }
}
