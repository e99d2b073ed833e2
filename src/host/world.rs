use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde_json::Value;

use crate::{
    fieldtype::split_type_path,
    host::Owner,
    property::PropertyScope,
    reflection::{
        Data, FieldDescriptor, Instance, ObjectDirectory, ObjectId, ReflectedType,
        ReflectionRegistry, TypeFlags, TypeKind,
    },
    Error::{self, ObjectLoadFailed, OwnerNotFound, TypeNotFound},
    Result,
};

/// Callback run at the end of every [`World::compile`]; an `Err` is reported as a compile
/// failure.
pub type CompileHook = Box<dyn Fn(&Owner) -> std::result::Result<(), String> + Send + Sync>;

/// The live object graph: registry, object directory, instances and owners.
pub struct World {
    registry: Arc<ReflectionRegistry>,
    directory: ObjectDirectory,
    instances: HashMap<ObjectId, Instance>,
    owners: BTreeMap<String, Owner>,
    compile_hook: Option<CompileHook>,
}

impl World {
    /// Create an empty world over `registry`
    pub fn new(registry: Arc<ReflectionRegistry>) -> Self {
        World {
            registry,
            directory: ObjectDirectory::new(),
            instances: HashMap::new(),
            owners: BTreeMap::new(),
            compile_hook: None,
        }
    }

    /// The type registry
    pub fn registry(&self) -> &Arc<ReflectionRegistry> {
        &self.registry
    }

    /// The object directory
    pub fn directory(&self) -> &ObjectDirectory {
        &self.directory
    }

    /// Install a hook that runs at the end of every compile
    pub fn set_compile_hook<F>(&mut self, hook: F)
    where
        F: Fn(&Owner) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.compile_hook = Some(Box::new(hook));
    }

    /// Create a user asset deriving from `parent_class`.
    ///
    /// Registers the (still empty) generated class `<package>.<name>_C` and spawns its
    /// default object.
    ///
    /// ## Arguments
    /// * 'package'      - Package of the asset, e.g. `/Game/Blueprints/BP_Hero`
    /// * 'name'         - Asset name, e.g. `BP_Hero`
    /// * 'parent_class' - Canonical path of a registered class
    ///
    /// # Errors
    /// Returns [`crate::Error::TypePathInvalid`] if package and name do not form a canonical
    /// path, [`crate::Error::TypeNotFound`] for unknown parents and [`crate::Error::Error`] if
    /// the name is taken.
    pub fn create_owner(&mut self, package: &str, name: &str, parent_class: &str) -> Result<&Owner> {
        if self.owners.contains_key(name) {
            return Err(Error::Error(format!("Owner '{name}' already exists")));
        }

        let class_name = format!("{name}_C");
        let class_path = format!("{package}.{class_name}");
        split_type_path(&class_path)?;
        if self
            .registry
            .get_kind(parent_class, &[TypeKind::Class])
            .is_none()
        {
            return Err(TypeNotFound(parent_class.to_string()));
        }

        self.registry.register(
            ReflectedType::class(package, class_name.as_str())
                .with_parent(parent_class)
                .with_flags(TypeFlags::USER_ASSET),
        );
        let default_object = self.spawn(package, &format!("Default__{class_name}"), &class_path)?;
        log::info!("created owner {package}.{name} deriving from {parent_class}");

        let owner: &Owner = self
            .owners
            .entry(name.to_string())
            .or_insert(Owner::new(name, package, parent_class, default_object));
        Ok(owner)
    }

    /// Create a live, loaded instance of `class_path` with default field values.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the class or one of its struct fields is not
    /// registered.
    pub fn spawn(&mut self, outer: &str, name: &str, class_path: &str) -> Result<ObjectId> {
        if self
            .registry
            .get_kind(class_path, &[TypeKind::Class])
            .is_none()
        {
            return Err(TypeNotFound(class_path.to_string()));
        }

        let fields = self
            .registry
            .layout(class_path)?
            .iter()
            .map(|field| Data::default_for(&field.kind, &self.registry))
            .collect::<Result<Vec<_>>>()?;

        let id = self.directory.insert(outer, name, class_path, true)?;
        self.instances.entry(id).or_insert(Instance {
            class_path: class_path.to_string(),
            fields,
        });
        Ok(id)
    }

    /// Register an object identity without live data, e.g. an asset that is not loaded yet.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the directory lock is poisoned.
    pub fn add_object(&self, outer: &str, name: &str, class_path: &str, loaded: bool) -> Result<ObjectId> {
        self.directory.insert(outer, name, class_path, loaded)
    }

    /// Live data of an object
    pub fn instance(&self, id: ObjectId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Look up an owner by asset name or by `<package>.<name>` path
    pub fn owner(&self, name: &str) -> Option<&Owner> {
        let key = self.owner_key(name)?;
        self.owners.get(&key)
    }

    /// Fail if `name` is already declared by the parent class of `owner_name`, where the
    /// inherited field would hide a new variable.
    ///
    /// # Errors
    /// Returns [`crate::Error::OwnerNotFound`], [`crate::Error::VariableAlreadyExists`] or
    /// the layout errors of the parent class.
    pub fn check_inherited_name(&self, owner_name: &str, name: &str) -> Result<()> {
        let owner = self
            .owner(owner_name)
            .ok_or_else(|| OwnerNotFound(owner_name.to_string()))?;
        if self
            .registry
            .layout(&owner.parent_class)?
            .iter()
            .any(|field| field.name == name)
        {
            return Err(Error::VariableAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    /// Mutable variant of [`World::owner`]
    pub fn owner_mut(&mut self, name: &str) -> Option<&mut Owner> {
        let key = self.owner_key(name)?;
        self.owners.get_mut(&key)
    }

    /// All owners, ordered by name
    pub fn owners(&self) -> impl Iterator<Item = &Owner> {
        self.owners.values()
    }

    fn owner_key(&self, name: &str) -> Option<String> {
        if self.owners.contains_key(name) {
            return Some(name.to_string());
        }
        self.owners
            .values()
            .find(|owner| owner.path() == name)
            .map(|owner| owner.name.clone())
    }

    /// Property access to the default object of an owner.
    ///
    /// # Errors
    /// Returns [`crate::Error::OwnerNotFound`] for unknown owners.
    pub fn property_scope(&mut self, owner_name: &str) -> Result<PropertyScope<'_>> {
        let id = self
            .owner(owner_name)
            .ok_or_else(|| OwnerNotFound(owner_name.to_string()))?
            .default_object;
        self.object_scope(id)
    }

    /// Property access to any live object.
    ///
    /// # Errors
    /// Returns [`crate::Error::ObjectLoadFailed`] if the object has no live data.
    pub fn object_scope(&mut self, id: ObjectId) -> Result<PropertyScope<'_>> {
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or_else(|| ObjectLoadFailed(id.to_string()))?;
        Ok(PropertyScope::new(&self.registry, &self.directory, instance))
    }

    /// Regenerate the class of an owner from its variables.
    ///
    /// 1. The generated class is re-registered with one field per variable.
    /// 2. Every live instance of the class is migrated to the new layout. Values survive
    ///    when a field keeps its name (following renames) and kind; everything else is
    ///    default-constructed.
    /// 3. Pending default value literals are written to the default object, first parsed as
    ///    JSON and then, if that fails, as a plain string.
    /// 4. The compile hook runs.
    ///
    /// Problems in steps 2 to 4 do not undo earlier steps. They are collected and reported
    /// together as the error message.
    pub fn compile(&mut self, owner_name: &str) -> std::result::Result<(), String> {
        let owner = self
            .owner(owner_name)
            .cloned()
            .ok_or_else(|| OwnerNotFound(owner_name.to_string()).to_string())?;
        let class_path = owner.generated_class_path();
        let old_layout = self.registry.layout(&class_path).unwrap_or_default();

        let class = owner.variables().iter().fold(
            ReflectedType::class(owner.package.as_str(), owner.generated_class_name())
                .with_parent(owner.parent_class.as_str())
                .with_flags(TypeFlags::USER_ASSET),
            |class, variable| class.with_descriptor(variable.descriptor()),
        );
        self.registry.register(class);
        let new_layout = self
            .registry
            .layout(&class_path)
            .map_err(|error| error.to_string())?;

        let mut problems = Vec::new();
        for instance in self
            .instances
            .values_mut()
            .filter(|instance| instance.class_path == class_path)
        {
            match migrate(&self.registry, &owner, instance, &old_layout, &new_layout) {
                Ok(fields) => instance.fields = fields,
                Err(error) => problems.push(format!("Failed to migrate {class_path}: {error}")),
            }
        }

        let pending: Vec<(String, String)> = owner
            .pending_defaults()
            .map(|variable| (variable.name.clone(), variable.default_value.clone()))
            .collect();
        if !pending.is_empty() {
            match self.object_scope(owner.default_object) {
                Ok(mut scope) => {
                    for (name, literal) in &pending {
                        if let Err(error) = apply_default(&mut scope, name, literal) {
                            problems.push(format!("Invalid default value for {name}: {error}"));
                        }
                    }
                }
                Err(error) => problems.push(error.to_string()),
            }
        }

        if let Some(current) = self.owner_mut(&owner.name) {
            current.clear_pending_defaults();
            current.clear_pending_renames();
        }

        if let (Some(hook), Some(current)) = (&self.compile_hook, self.owners.get(&owner.name)) {
            if let Err(message) = hook(current) {
                problems.push(message);
            }
        }

        log::info!(
            "compiled {class_path}: {} fields, {} problems",
            new_layout.len(),
            problems.len()
        );

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

fn migrate(
    registry: &ReflectionRegistry,
    owner: &Owner,
    instance: &Instance,
    old_layout: &[FieldDescriptor],
    new_layout: &[FieldDescriptor],
) -> Result<Vec<Data>> {
    new_layout
        .iter()
        .map(|field| {
            let previous = owner.previous_name(&field.name);
            let kept = old_layout
                .iter()
                .zip(&instance.fields)
                .find(|(old, _)| old.name == previous && old.kind == field.kind)
                .map(|(_, data)| data.clone());

            match kept {
                Some(data) => Ok(data),
                None => Data::default_for(&field.kind, registry),
            }
        })
        .collect()
}

fn apply_default(scope: &mut PropertyScope<'_>, name: &str, literal: &str) -> Result<()> {
    if let Ok(value) = serde_json::from_str::<Value>(literal) {
        if scope.set_property(name, &value).is_ok() {
            return Ok(());
        }
    }
    scope.set_property(name, &Value::String(literal.to_string()))
}
