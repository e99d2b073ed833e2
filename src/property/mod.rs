//! Property path resolution and value marshalling.
//!
//! This is the core of the crate: given a live [`Instance`] and a path string such as
//! `Party[0].Stats.Health` or `Loadout["main.hand"]`, it walks reflected fields and containers
//! down to one slot and converts that slot to or from a [`serde_json::Value`].
//!
//! # Architecture
//!
//! - [`path`]: Path grammar, bracket and quote aware
//! - [`resolve`]: Segment-by-segment walk producing a [`ResolvedProperty`]
//! - [`marshal`]: [`FieldKind`]-dispatched conversion in both directions
//! - [`PropertyScope`]: Convenience wrapper tying the three together for one instance
//!
//! Resolutions are never cached. Every read or write parses and walks the path again against
//! the current state of the instance.
//!
//! # Examples
//!
//! ```rust
//! use propscope::{
//!     property::PropertyScope,
//!     reflection::{Data, FieldKind, Instance, ObjectDirectory, ReflectedType, ReflectionRegistry},
//! };
//! use serde_json::json;
//!
//! let registry = ReflectionRegistry::new();
//! registry.register(
//!     ReflectedType::class("/Script/Game", "Hero").with_field("Scores", FieldKind::array_of(FieldKind::Int32)),
//! );
//! let objects = ObjectDirectory::new();
//! let mut hero = Instance {
//!     class_path: "/Script/Game.Hero".into(),
//!     fields: vec![Data::Array(vec![Data::Int32(1), Data::Int32(2)])],
//! };
//!
//! let mut scope = PropertyScope::new(&registry, &objects, &mut hero);
//! scope.set_property("Scores[1]", &json!(5))?;
//! assert_eq!(scope.get_property("Scores")?, json!([1, 5]));
//! # Ok::<(), propscope::Error>(())
//! ```

pub mod marshal;
pub mod path;
pub mod resolve;

pub use marshal::MarshalContext;
pub use path::{IndexToken, PathSegment, PropertyPath};
pub use resolve::{convert_key, resolve, ResolvedProperty};

use serde::Serialize;
use serde_json::Value;

use crate::{
    reflection::{Data, FieldKind, Instance, ObjectDirectory, ReflectionRegistry, TypeKind},
    Error::{
        CannotTraverseNonStruct, LayoutMismatch, PropertyOutOfRange, ValueOutOfRange,
        VariableNotFound,
    },
    Result,
};

/// Value read from a slot, with the type information a caller needs to display it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyValue {
    /// Normalized path
    pub path: String,
    /// Kind of the slot
    #[serde(skip)]
    pub kind: FieldKind,
    /// Serialized value
    pub value: Value,
    /// Canonical path of the bound type, empty for primitives
    pub type_path: String,
    /// Symbolic name of an enum value, when the value has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
}

/// Read and write access to the properties of one instance.
pub struct PropertyScope<'w> {
    registry: &'w ReflectionRegistry,
    objects: &'w ObjectDirectory,
    instance: &'w mut Instance,
}

impl<'w> PropertyScope<'w> {
    /// Create a scope over `instance`
    pub fn new(
        registry: &'w ReflectionRegistry,
        objects: &'w ObjectDirectory,
        instance: &'w mut Instance,
    ) -> Self {
        PropertyScope {
            registry,
            objects,
            instance,
        }
    }

    /// Marshal context of this scope
    pub fn context(&self) -> MarshalContext<'w> {
        MarshalContext::new(self.registry, self.objects)
    }

    /// Resolve a parsed path to its slot.
    ///
    /// # Errors
    /// See [`resolve`].
    pub fn resolve(&mut self, path: &PropertyPath) -> Result<ResolvedProperty<'_>> {
        resolve(self.registry, self.instance, path)
    }

    /// Resolve and serialize the slot at `path`, together with its type information.
    ///
    /// # Errors
    /// Returns the path, resolution or marshalling error that stopped the read.
    pub fn read(&mut self, path: &str) -> Result<PropertyValue> {
        let path = PropertyPath::parse(path)?;
        let ctx = self.context();
        let registry = self.registry;
        let resolved = self.resolve(&path)?;
        let value = ctx.to_value(&resolved.kind, resolved.slot)?;

        let enum_name = match (&resolved.kind, &*resolved.slot) {
            (FieldKind::Enum { enum_path, .. }, Data::Enum(raw)) => registry
                .get_kind(enum_path, &[TypeKind::Enum])
                .and_then(|ty| ty.enum_name_of(*raw).map(str::to_string)),
            _ => None,
        };

        Ok(PropertyValue {
            path: resolved.path,
            type_path: resolved.kind.type_path().unwrap_or_default().to_string(),
            kind: resolved.kind,
            value,
            enum_name,
        })
    }

    /// Serialize the slot at `path`.
    ///
    /// # Errors
    /// Returns the path, resolution or marshalling error that stopped the read.
    pub fn get_property(&mut self, path: &str) -> Result<Value> {
        self.read(path).map(|read| read.value)
    }

    /// Deserialize `value` into the slot at `path`.
    ///
    /// The new slot value is built completely before it replaces the old one, so a failed
    /// write leaves the instance unchanged.
    ///
    /// # Errors
    /// Returns the path, resolution or marshalling error that stopped the write.
    pub fn set_property(&mut self, path: &str, value: &Value) -> Result<()> {
        self.write(&PropertyPath::parse(path)?, value)
    }

    /// Deserialize `value` into the slot at `path`, growing a top-level array first when
    /// `path` addresses an index past its end.
    ///
    /// Growth happens at most once and only for single-segment paths such as `Items[4]`. If
    /// the retried write fails, the array is restored to its previous contents. Returns
    /// `true` if the array was grown.
    ///
    /// ## Arguments
    /// * 'path'    - Path to write
    /// * 'value'   - Incoming value
    /// * 'max_len' - Largest array length growth may produce
    ///
    /// # Errors
    /// Returns the error of the original write when growth does not apply, the growth error,
    /// or the error of the retried write.
    pub fn set_property_growing(&mut self, path: &str, value: &Value, max_len: usize) -> Result<bool> {
        let path = PropertyPath::parse(path)?;
        let error = match self.write(&path, value) {
            Ok(()) => return Ok(false),
            Err(error) => error,
        };

        let required = match &error {
            PropertyOutOfRange { index, .. } if path.is_top_level() => {
                usize::try_from(*index).ok().and_then(|index| index.checked_add(1))
            }
            _ => None,
        };
        let Some(required) = required else {
            return Err(error);
        };

        let name = &path.root().name;
        let position = self.position_of(name)?;
        let snapshot = self
            .instance
            .fields
            .get(position)
            .cloned()
            .ok_or_else(|| LayoutMismatch(self.instance.class_path.clone()))?;

        self.grow_array(name, required, max_len)?;
        if let Err(error) = self.write(&path, value) {
            self.instance.fields[position] = snapshot;
            return Err(error);
        }
        Ok(true)
    }

    fn write(&mut self, path: &PropertyPath, value: &Value) -> Result<()> {
        let ctx = self.context();
        let resolved = self.resolve(path)?;
        let updated = ctx.from_value(&resolved.kind, value, resolved.slot)?;
        *resolved.slot = updated;
        Ok(())
    }

    fn position_of(&self, name: &str) -> Result<usize> {
        self.registry
            .layout(&self.instance.class_path)?
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| VariableNotFound(name.to_string()))
    }

    /// Grow the top-level array field `name` to at least `len` elements.
    ///
    /// New elements are default-constructed. Returns the resulting length; an array already
    /// long enough is left as is.
    ///
    /// ## Arguments
    /// * 'name'    - Name of a top-level array field
    /// * 'len'     - Required length
    /// * 'max_len' - Upper bound on the resulting length
    ///
    /// # Errors
    /// Returns [`crate::Error::VariableNotFound`] for unknown fields,
    /// [`crate::Error::CannotTraverseNonStruct`] if the field is not an array and
    /// [`crate::Error::ValueOutOfRange`] if `len` exceeds `max_len`.
    pub fn grow_array(&mut self, name: &str, len: usize, max_len: usize) -> Result<usize> {
        let layout = self.registry.layout(&self.instance.class_path)?;
        let position = self.position_of(name)?;

        let FieldKind::Array { element } = &layout[position].kind else {
            return Err(CannotTraverseNonStruct(name.to_string()));
        };
        if len > max_len {
            return Err(ValueOutOfRange {
                value: len.to_string(),
                target: "Array",
            });
        }

        let Some(Data::Array(items)) = self.instance.fields.get_mut(position) else {
            return Err(LayoutMismatch(self.instance.class_path.clone()));
        };
        if items.len() < len {
            let seed = Data::default_for(element, self.registry)?;
            log::debug!("growing {name} from {} to {len}", items.len());
            items.resize(len, seed);
        }
        Ok(items.len())
    }

    /// The instance this scope works on
    pub fn instance(&self) -> &Instance {
        self.instance
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{test::fixture_world, Error};

    #[test]
    fn test_read_with_metadata() {
        let (registry, mut instance) = fixture_world();
        let objects = ObjectDirectory::new();
        let mut scope = PropertyScope::new(&registry, &objects, &mut instance);

        let read = scope.read("Mood").unwrap();
        assert_eq!(read.value, json!(1));
        assert_eq!(read.enum_name.as_deref(), Some("Happy"));
        assert_eq!(read.type_path, "/Script/Game.EMood");

        let read = scope.read("Scores").unwrap();
        assert_eq!(read.type_path, "");
        assert_eq!(read.enum_name, None);
    }

    #[test]
    fn test_nested_struct_write() {
        let (registry, mut instance) = fixture_world();
        let objects = ObjectDirectory::new();
        let mut scope = PropertyScope::new(&registry, &objects, &mut instance);

        scope.set_property("Stats.Health", &json!(42.5)).unwrap();
        assert_eq!(
            scope.get_property("Stats").unwrap(),
            json!({"Health": 42.5, "Mana": 50.0})
        );

        scope.set_property("Party[0].Mana", &json!(8)).unwrap();
        assert_eq!(scope.get_property("Party[0].Mana").unwrap(), json!(8.0));

        scope.set_property(r#"Loadout["main.hand"]"#, &json!(11)).unwrap();
        assert_eq!(
            scope.get_property(r#"Loadout["main.hand"]"#).unwrap(),
            json!(11)
        );
    }

    #[test]
    fn test_failed_write_is_atomic() {
        let (registry, mut instance) = fixture_world();
        let objects = ObjectDirectory::new();
        let mut scope = PropertyScope::new(&registry, &objects, &mut instance);
        let before = scope.get_property("Scores").unwrap();

        assert!(matches!(
            scope.set_property("Scores", &json!([1, "two", 3])),
            Err(Error::ValueTypeMismatch { .. })
        ));
        assert_eq!(scope.get_property("Scores").unwrap(), before);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let (registry, mut instance) = fixture_world();
        let objects = ObjectDirectory::new();
        let mut scope = PropertyScope::new(&registry, &objects, &mut instance);

        for path in [
            "Health",
            "Alive",
            "Level",
            "Ratio",
            "Nick",
            "Title",
            "Mood",
            "Stats",
            "Stats.Mana",
            "Scores",
            "Scores[2]",
            "Party",
            "Party[0]",
            "Levels[1]",
            "LazyTarget",
        ] {
            let before = scope.get_property(path).unwrap();
            scope.set_property(path, &before).unwrap();
            assert_eq!(scope.get_property(path).unwrap(), before, "{path}");
        }
    }

    #[test]
    fn test_set_property_growing() {
        let (registry, mut instance) = fixture_world();
        let objects = ObjectDirectory::new();
        let mut scope = PropertyScope::new(&registry, &objects, &mut instance);

        assert!(!scope.set_property_growing("Scores[0]", &json!(1), 16).unwrap());
        assert!(scope.set_property_growing("Scores[4]", &json!(7), 16).unwrap());
        assert_eq!(
            scope.get_property("Scores").unwrap(),
            json!([1, 20, 30, 0, 7])
        );

        assert!(matches!(
            scope.set_property_growing("Scores[6]", &json!("seven"), 16),
            Err(Error::ValueTypeMismatch { .. })
        ));
        assert_eq!(scope.get_property("Scores").unwrap(), json!([1, 20, 30, 0, 7]));

        assert!(matches!(
            scope.set_property_growing("Scores[-1]", &json!(1), 16),
            Err(Error::PropertyOutOfRange { .. })
        ));
        assert!(matches!(
            scope.set_property_growing("Scores[40]", &json!(1), 16),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            scope.set_property_growing("Party[3].Mana", &json!(1), 16),
            Err(Error::PropertyOutOfRange { .. })
        ));
    }

    #[test]
    fn test_grow_array() {
        let (registry, mut instance) = fixture_world();
        let objects = ObjectDirectory::new();
        let mut scope = PropertyScope::new(&registry, &objects, &mut instance);

        assert_eq!(scope.grow_array("Scores", 5, 16).unwrap(), 5);
        assert_eq!(
            scope.get_property("Scores").unwrap(),
            json!([10, 20, 30, 0, 0])
        );
        assert_eq!(scope.grow_array("Scores", 2, 16).unwrap(), 5);
        assert!(matches!(
            scope.grow_array("Scores", 17, 16),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            scope.grow_array("Health", 2, 16),
            Err(Error::CannotTraverseNonStruct(_))
        ));
    }
}
