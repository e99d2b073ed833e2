use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
    fieldtype::{ContainerDescriptor, ReferenceMode},
    reflection::{FieldDescriptor, FieldFlags, FieldKind, ObjectId},
    Error::{VariableAlreadyExists, VariableNameInvalid, VariableNotFound},
    Result,
};

/// Characters a variable name may not contain; they are part of the path grammar
pub const RESERVED_NAME_CHARS: &[char] = &['.', '[', ']', '"'];

/// A named, typed field declared on an [`Owner`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDefinition {
    /// Field name
    pub name: String,
    /// Canonical type path of the (element) type
    pub type_path: String,
    /// Container shape
    pub container: ContainerDescriptor,
    /// Reference mode for class types
    pub reference: ReferenceMode,
    /// Editor category
    pub category: String,
    /// Editor tooltip
    pub tooltip: String,
    /// Default value literal, JSON or raw text
    pub default_value: String,
    /// Free-form metadata
    pub metadata: BTreeMap<String, String>,
    /// Only visible to the owner
    pub is_private: bool,
    /// Exposed as a spawn parameter
    pub is_expose_on_spawn: bool,
    /// Resolved field kind
    pub field_type: FieldKind,
}

impl VariableDefinition {
    /// Create a definition with empty category, tooltip and default value
    pub fn new(name: impl Into<String>, type_path: impl Into<String>, field_type: FieldKind) -> Self {
        VariableDefinition {
            name: name.into(),
            type_path: type_path.into(),
            container: ContainerDescriptor::none(),
            reference: ReferenceMode::Object,
            category: String::new(),
            tooltip: String::new(),
            default_value: String::new(),
            metadata: BTreeMap::new(),
            is_private: false,
            is_expose_on_spawn: false,
            field_type,
        }
    }

    /// Check that `name` can be used as a variable name.
    ///
    /// # Errors
    /// Returns [`crate::Error::VariableNameInvalid`] for empty names, names with surrounding
    /// whitespace and names containing [`RESERVED_NAME_CHARS`].
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.trim() != name || name.contains(RESERVED_NAME_CHARS) {
            return Err(VariableNameInvalid(name.to_string()));
        }
        Ok(())
    }

    /// Field descriptor this variable contributes to the generated class
    #[must_use]
    pub fn descriptor(&self) -> FieldDescriptor {
        let mut descriptor = FieldDescriptor::new(self.name.clone(), self.field_type.clone());
        if self.is_private {
            descriptor.flags |= FieldFlags::PRIVATE;
        }
        if self.is_expose_on_spawn {
            descriptor.flags |= FieldFlags::EXPOSE_ON_SPAWN;
        }

        descriptor.metadata = self.metadata.clone();
        if !self.category.is_empty() {
            descriptor
                .metadata
                .insert("Category".to_string(), self.category.clone());
        }
        if !self.tooltip.is_empty() {
            descriptor
                .metadata
                .insert("ToolTip".to_string(), self.tooltip.clone());
        }
        descriptor
    }
}

/// A user asset that owns variables and generates a class from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    /// Asset name
    pub name: String,
    /// Package the asset lives in
    pub package: String,
    /// Canonical path of the parent class
    pub parent_class: String,
    /// Object holding the default values of the generated class
    pub default_object: ObjectId,
    variables: Vec<VariableDefinition>,
    pending_defaults: BTreeSet<String>,
    pending_renames: BTreeMap<String, String>,
}

impl Owner {
    pub(crate) fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        parent_class: impl Into<String>,
        default_object: ObjectId,
    ) -> Self {
        Owner {
            name: name.into(),
            package: package.into(),
            parent_class: parent_class.into(),
            default_object,
            variables: Vec::new(),
            pending_defaults: BTreeSet::new(),
            pending_renames: BTreeMap::new(),
        }
    }

    /// Textual identifier of the asset, `<package>.<name>`
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Local name of the generated class
    #[must_use]
    pub fn generated_class_name(&self) -> String {
        format!("{}_C", self.name)
    }

    /// Canonical path of the generated class
    #[must_use]
    pub fn generated_class_path(&self) -> String {
        format!("{}.{}", self.package, self.generated_class_name())
    }

    /// Declared variables in declaration order
    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    /// Declare a new variable.
    ///
    /// A non-empty default value literal is applied on the next compile.
    ///
    /// # Errors
    /// Returns [`crate::Error::VariableNameInvalid`] or
    /// [`crate::Error::VariableAlreadyExists`].
    pub fn add_variable(&mut self, variable: VariableDefinition) -> Result<()> {
        VariableDefinition::validate_name(&variable.name)?;
        if self.variable(&variable.name).is_some() {
            return Err(VariableAlreadyExists(variable.name));
        }

        if !variable.default_value.is_empty() {
            self.pending_defaults.insert(variable.name.clone());
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Remove a variable by name
    ///
    /// # Errors
    /// Returns [`crate::Error::VariableNotFound`] if no variable has this name.
    pub fn remove_variable(&mut self, name: &str) -> Result<VariableDefinition> {
        let position = self
            .variables
            .iter()
            .position(|variable| variable.name == name)
            .ok_or_else(|| VariableNotFound(name.to_string()))?;

        self.pending_defaults.remove(name);
        Ok(self.variables.remove(position))
    }

    /// Replace the variable `name` with `updated`, keeping its declaration position.
    ///
    /// The default value literal is re-applied on the next compile when it or the field type
    /// changed.
    ///
    /// # Errors
    /// Returns [`crate::Error::VariableNotFound`] for unknown names, and
    /// [`crate::Error::VariableNameInvalid`] or [`crate::Error::VariableAlreadyExists`] when
    /// a rename is not possible.
    pub fn replace_variable(&mut self, name: &str, updated: VariableDefinition) -> Result<()> {
        VariableDefinition::validate_name(&updated.name)?;
        let position = self
            .variables
            .iter()
            .position(|variable| variable.name == name)
            .ok_or_else(|| VariableNotFound(name.to_string()))?;
        if updated.name != name && self.variable(&updated.name).is_some() {
            return Err(VariableAlreadyExists(updated.name));
        }

        let previous = &self.variables[position];
        let reapply = !updated.default_value.is_empty()
            && (updated.default_value != previous.default_value
                || updated.field_type != previous.field_type
                || self.pending_defaults.contains(name));

        self.pending_defaults.remove(name);
        if reapply {
            self.pending_defaults.insert(updated.name.clone());
        }
        if updated.name != name {
            let original = self
                .pending_renames
                .remove(name)
                .unwrap_or_else(|| name.to_string());
            self.pending_renames.insert(updated.name.clone(), original);
        }
        self.variables[position] = updated;
        Ok(())
    }

    /// Variables whose default value literal still has to be applied
    pub fn pending_defaults(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.variables
            .iter()
            .filter(|variable| self.pending_defaults.contains(&variable.name))
    }

    pub(crate) fn clear_pending_defaults(&mut self) {
        self.pending_defaults.clear();
    }

    /// Name a field had at the last compile, following renames since then
    pub(crate) fn previous_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.pending_renames.get(name).map_or(name, String::as_str)
    }

    pub(crate) fn clear_pending_renames(&mut self) {
        self.pending_renames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reflection::ObjectDirectory, Error};

    fn owner() -> Owner {
        let id = ObjectDirectory::new()
            .insert("/Game/Blueprints/BP_Hero", "Default__BP_Hero_C", "/Game/Blueprints/BP_Hero.BP_Hero_C", true)
            .unwrap();
        Owner::new("BP_Hero", "/Game/Blueprints/BP_Hero", "/Script/Engine.Actor", id)
    }

    #[test]
    fn test_paths() {
        let owner = owner();
        assert_eq!(owner.path(), "/Game/Blueprints/BP_Hero.BP_Hero");
        assert_eq!(
            owner.generated_class_path(),
            "/Game/Blueprints/BP_Hero.BP_Hero_C"
        );
    }

    #[test]
    fn test_name_validation() {
        for bad in ["", " Health", "Stats.Health", "Items[0]", "Say\"hi\""] {
            assert!(matches!(
                VariableDefinition::validate_name(bad),
                Err(Error::VariableNameInvalid(_))
            ));
        }
        assert!(VariableDefinition::validate_name("Max Health").is_ok());
    }

    #[test]
    fn test_add_remove_replace() {
        let mut owner = owner();
        let mut health = VariableDefinition::new("Health", "/Script/Core.Float", FieldKind::Float);
        health.default_value = "100".into();
        owner.add_variable(health.clone()).unwrap();
        owner
            .add_variable(VariableDefinition::new("Mana", "/Script/Core.Float", FieldKind::Float))
            .unwrap();

        assert_eq!(
            owner.add_variable(health.clone()),
            Err(Error::VariableAlreadyExists("Health".into()))
        );
        assert_eq!(owner.pending_defaults().count(), 1);

        owner.clear_pending_defaults();
        let mut renamed = health.clone();
        renamed.name = "Vitality".into();
        owner.replace_variable("Health", renamed).unwrap();
        assert_eq!(owner.variables()[0].name, "Vitality");
        assert_eq!(owner.pending_defaults().count(), 0);
        assert_eq!(owner.previous_name("Vitality"), "Health");
        assert_eq!(owner.previous_name("Mana"), "Mana");

        let mut clash = health;
        clash.name = "Mana".into();
        assert_eq!(
            owner.replace_variable("Vitality", clash),
            Err(Error::VariableAlreadyExists("Mana".into()))
        );

        owner.remove_variable("Mana").unwrap();
        assert_eq!(
            owner.remove_variable("Mana"),
            Err(Error::VariableNotFound("Mana".into()))
        );
    }

    #[test]
    fn test_descriptor_flags() {
        let mut variable = VariableDefinition::new("Secret", "/Script/Core.Int32", FieldKind::Int32);
        variable.is_private = true;
        variable.category = "Combat".into();

        let descriptor = variable.descriptor();
        assert!(descriptor.flags.contains(FieldFlags::PRIVATE | FieldFlags::EDITABLE));
        assert!(!descriptor.flags.contains(FieldFlags::EXPOSE_ON_SPAWN));
        assert_eq!(descriptor.metadata.get("Category").unwrap(), "Combat");
    }
}
