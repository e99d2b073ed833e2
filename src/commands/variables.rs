use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    commands::{
        request::{
            parse_body, required, CreateRequest, ModifyRequest, OwnerRequest, VariableConfig,
            VariableRequest,
        },
        CommandError, CommandResult, CommandService, FailureCode,
    },
    fieldtype::{split_type_path, ContainerDescriptor, ContainerKind, FieldTypeSpec, ReferenceMode},
    host::{Owner, VariableDefinition, World},
    Error,
};

impl CommandService {
    pub(super) fn create(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: CreateRequest = parse_body(request)?;
        let owner_name = request.owner_name.as_str();
        find_owner(world, owner_name)?;

        let config = &request.variable_config;
        let name = required(config.variable_name.as_deref()).ok_or_else(|| {
            CommandError::new(
                FailureCode::VariableNameMissing,
                "variable_config.variable_name is required",
            )
        })?;
        let type_path = required(config.type_path.as_deref()).ok_or_else(|| {
            CommandError::new(
                FailureCode::TypePathRequired,
                "variable_config.type_path is required",
            )
        })?;

        let spec = field_type_spec(
            type_path,
            config.container.clone().unwrap_or_default(),
            config.reference.unwrap_or_default(),
        )?;
        let field_type = self
            .resolver
            .resolve_field_type(&spec)
            .map_err(|error| CommandError::wrap(FailureCode::CreateFailed, &error))?;

        let mut variable = VariableDefinition::new(name, type_path, field_type);
        variable.container = spec.container;
        variable.reference = spec.reference;
        apply_settings(&mut variable, config);

        world
            .check_inherited_name(owner_name, name)
            .map_err(|error| CommandError::wrap(FailureCode::CreateFailed, &error))?;
        find_owner_mut(world, owner_name)?
            .add_variable(variable.clone())
            .map_err(|error| CommandError::wrap(FailureCode::CreateFailed, &error))?;
        log::debug!("declared variable '{name}' on '{owner_name}'");

        let mut data = Map::new();
        data.insert(
            "variable".to_string(),
            serialize(FailureCode::CreateFailed, &variable)?,
        );
        self.after_variable_change(world, owner_name, &mut data);
        Ok(Value::Object(data))
    }

    pub(super) fn delete(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: VariableRequest = parse_body(request)?;
        let owner_name = request.owner_name.as_str();
        let name = variable_name(request.variable_name.as_deref())?;

        let owner = find_owner_mut(world, owner_name)?;
        if owner.variable(name).is_none() {
            return Err(variable_not_found(name));
        }
        let removed = owner
            .remove_variable(name)
            .map_err(|error| CommandError::wrap(FailureCode::DeleteFailed, &error))?;
        log::debug!("removed variable '{name}' from '{owner_name}'");

        let mut data = Map::new();
        data.insert(
            "variable".to_string(),
            serialize(FailureCode::DeleteFailed, &removed)?,
        );
        self.after_variable_change(world, owner_name, &mut data);
        Ok(Value::Object(data))
    }

    pub(super) fn list(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: OwnerRequest = parse_body(request)?;
        let owner = find_owner(world, &request.owner_name)?;

        let mut data = Map::new();
        data.insert("owner_name".to_string(), Value::String(owner.name.clone()));
        data.insert(
            "variables".to_string(),
            serialize(FailureCode::InvalidRequest, owner.variables())?,
        );
        Ok(Value::Object(data))
    }

    pub(super) fn get_info(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: VariableRequest = parse_body(request)?;
        let name = variable_name(request.variable_name.as_deref())?;
        let variable = find_owner(world, &request.owner_name)?
            .variable(name)
            .ok_or_else(|| variable_not_found(name))?;

        let mut data = Map::new();
        data.insert(
            "variable".to_string(),
            serialize(FailureCode::InvalidRequest, variable)?,
        );
        Ok(Value::Object(data))
    }

    /// Rename, retype or re-describe a variable. The field type is only resolved again when
    /// the type path, container or reference mode is part of the request.
    pub(super) fn modify(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: ModifyRequest = parse_body(request)?;
        let owner_name = request.owner_name.as_str();
        let name = variable_name(request.variable_name.as_deref())?;
        let current = find_owner(world, owner_name)?
            .variable(name)
            .cloned()
            .ok_or_else(|| variable_not_found(name))?;

        let config = &request.variable_config;
        let mut updated = current.clone();
        if let Some(new_name) = &config.new_name {
            updated.name = new_name.clone();
        }

        if config.type_path.is_some() || config.container.is_some() || config.reference.is_some()
        {
            let type_path = match config.type_path.as_deref() {
                Some(path) => required(Some(path)).ok_or_else(|| {
                    CommandError::new(
                        FailureCode::TypePathRequired,
                        "variable_config.type_path must not be empty",
                    )
                })?,
                None => current.type_path.as_str(),
            };
            let spec = field_type_spec(
                type_path,
                config
                    .container
                    .clone()
                    .unwrap_or_else(|| current.container.clone()),
                config.reference.unwrap_or(current.reference),
            )?;

            updated.field_type = self
                .resolver
                .resolve_field_type(&spec)
                .map_err(|error| CommandError::wrap(FailureCode::ModifyFailed, &error))?;
            updated.type_path = spec.type_path;
            updated.container = spec.container;
            updated.reference = spec.reference;
        }
        apply_settings(&mut updated, config);

        if updated.name != name {
            world
                .check_inherited_name(owner_name, &updated.name)
                .map_err(|error| CommandError::wrap(FailureCode::ModifyFailed, &error))?;
        }
        find_owner_mut(world, owner_name)?
            .replace_variable(name, updated.clone())
            .map_err(|error| CommandError::wrap(FailureCode::ModifyFailed, &error))?;
        log::debug!("modified variable '{name}' on '{owner_name}'");

        let mut data = Map::new();
        data.insert(
            "variable".to_string(),
            serialize(FailureCode::ModifyFailed, &updated)?,
        );
        self.after_variable_change(world, owner_name, &mut data);
        Ok(Value::Object(data))
    }

    /// Regenerate the owner's class and mark the catalog stale
    fn after_variable_change(&self, world: &mut World, owner_name: &str, data: &mut Map<String, Value>) {
        Self::compile_into(world, owner_name, data);
        self.catalog
            .invalidate(&format!("variables of '{owner_name}' changed"));
    }
}

pub(super) fn find_owner<'w>(world: &'w World, owner_name: &str) -> Result<&'w Owner, CommandError> {
    world
        .owner(owner_name)
        .ok_or_else(|| owner_not_found(owner_name))
}

fn find_owner_mut<'w>(world: &'w mut World, owner_name: &str) -> Result<&'w mut Owner, CommandError> {
    world
        .owner_mut(owner_name)
        .ok_or_else(|| owner_not_found(owner_name))
}

pub(super) fn owner_not_found(owner_name: &str) -> CommandError {
    CommandError::wrap(
        FailureCode::OwnerNotFound,
        &Error::OwnerNotFound(owner_name.to_string()),
    )
}

fn variable_not_found(name: &str) -> CommandError {
    CommandError::wrap(
        FailureCode::VariableNotFound,
        &Error::VariableNotFound(name.to_string()),
    )
}

fn variable_name(name: Option<&str>) -> Result<&str, CommandError> {
    required(name).ok_or_else(|| {
        CommandError::new(FailureCode::VariableNameMissing, "variable_name is required")
    })
}

/// Build a resolver input, rejecting type paths without a `<module>.<Name>` separator
fn field_type_spec(
    type_path: &str,
    container: ContainerDescriptor,
    reference: ReferenceMode,
) -> Result<FieldTypeSpec, CommandError> {
    let mut paths = vec![type_path];
    if container.kind == ContainerKind::Map {
        paths.extend(container.key_type_path.as_deref());
        paths.extend(container.value_type_path.as_deref());
    }
    for path in paths {
        split_type_path(path)
            .map_err(|error| CommandError::wrap(FailureCode::TypePathInvalid, &error))?;
    }

    Ok(FieldTypeSpec::new(type_path)
        .with_container(container)
        .with_reference(reference))
}

fn apply_settings(variable: &mut VariableDefinition, config: &VariableConfig) {
    if let Some(category) = &config.category {
        variable.category = category.clone();
    }
    if let Some(tooltip) = &config.tooltip {
        variable.tooltip = tooltip.clone();
    }
    if let Some(default_value) = config.default_literal() {
        variable.default_value = default_value;
    }
    if let Some(metadata) = &config.metadata {
        variable.metadata = metadata.clone();
    }
    if let Some(is_private) = config.is_private {
        variable.is_private = is_private;
    }
    if let Some(is_expose_on_spawn) = config.is_expose_on_spawn {
        variable.is_expose_on_spawn = is_expose_on_spawn;
    }
}

pub(super) fn serialize<T: Serialize + ?Sized>(code: FailureCode, value: &T) -> CommandResult {
    serde_json::to_value(value)
        .map_err(|error| CommandError::new(code, format!("Failed to serialize response: {error}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{reflection::FieldKind, ServiceConfig};
    use serde_json::json;

    fn setup() -> (CommandService, World) {
        let registry = Arc::new(crate::test::fixture_registry());
        let mut world = World::new(registry.clone());
        world
            .create_owner("/Game/BP_Hero", "BP_Hero", "/Script/Engine.Actor")
            .unwrap();
        (CommandService::new(registry, ServiceConfig::default()), world)
    }

    fn create(service: &CommandService, world: &mut World, config: Value) -> Value {
        service.execute(
            world,
            &json!({ "action": "create", "owner_name": "BP_Hero", "variable_config": config }),
        )
    }

    #[test]
    fn test_create_validation() {
        let (service, mut world) = setup();

        let cases = [
            (json!({ "type_path": "/Script/Core.Int32" }), "VARIABLE_NAME_MISSING"),
            (json!({ "variable_name": "Gold" }), "TYPE_PATH_REQUIRED"),
            (json!({ "variable_name": "Gold", "type_path": "Int32" }), "TYPE_PATH_INVALID"),
            (
                json!({ "variable_name": "Gold", "type_path": "/Script/Core.Gold" }),
                "CREATE_FAILED",
            ),
            (
                json!({ "variable_name": "Gold.Coins", "type_path": "/Script/Core.Int32" }),
                "CREATE_FAILED",
            ),
        ];
        for (config, code) in cases {
            let response = create(&service, &mut world, config);
            assert_eq!(response["error"]["code"], json!(code), "{response}");
        }

        let response = service.execute(
            &mut world,
            &json!({
                "action": "create",
                "owner_name": "BP_Nobody",
                "variable_config": { "variable_name": "Gold", "type_path": "/Script/Core.Int32" },
            }),
        );
        assert_eq!(response["error"]["code"], json!("OWNER_NOT_FOUND"));
    }

    #[test]
    fn test_create_and_list() {
        let (service, mut world) = setup();
        let response = create(
            &service,
            &mut world,
            json!({
                "variable_name": "Loadout",
                "type_path": "/Script/Core.Int32",
                "container": { "kind": "map", "key_type_path": "/Script/Core.Name" },
                "category": "Inventory",
                "default_value": "",
            }),
        );
        assert_eq!(response["success"], json!(true), "{response}");
        assert_eq!(response["data"]["variable"]["name"], json!("Loadout"));

        let variable = world.owner("BP_Hero").unwrap().variable("Loadout").unwrap();
        assert_eq!(
            variable.field_type,
            FieldKind::map_of(FieldKind::Name, FieldKind::Int32)
        );
        assert_eq!(variable.category, "Inventory");

        let duplicate = create(
            &service,
            &mut world,
            json!({ "variable_name": "Loadout", "type_path": "/Script/Core.Bool" }),
        );
        assert_eq!(duplicate["error"]["code"], json!("CREATE_FAILED"));
        assert_eq!(duplicate["details"]["cause"], json!("VARIABLE_ALREADY_EXISTS"));

        let listed = service.execute(
            &mut world,
            &json!({ "action": "list", "owner_name": "/Game/BP_Hero.BP_Hero" }),
        );
        assert_eq!(listed["data"]["owner_name"], json!("BP_Hero"));
        assert_eq!(listed["data"]["variables"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_and_get_info() {
        let (service, mut world) = setup();
        create(
            &service,
            &mut world,
            json!({ "variable_name": "Gold", "type_path": "/Script/Core.Int32" }),
        );

        let info = service.execute(
            &mut world,
            &json!({ "action": "get_info", "owner_name": "BP_Hero", "variable_name": "Gold" }),
        );
        assert_eq!(info["data"]["variable"]["type_path"], json!("/Script/Core.Int32"));

        let request = json!({ "action": "delete", "owner_name": "BP_Hero", "variable_name": "Gold" });
        assert_eq!(service.execute(&mut world, &request)["success"], json!(true));
        let again = service.execute(&mut world, &request);
        assert_eq!(again["error"]["code"], json!("VARIABLE_NOT_FOUND"));

        let missing = service.execute(
            &mut world,
            &json!({ "action": "delete", "owner_name": "BP_Hero" }),
        );
        assert_eq!(missing["error"]["code"], json!("VARIABLE_NAME_MISSING"));
    }

    #[test]
    fn test_modify_rename_and_retype() {
        let (service, mut world) = setup();
        create(
            &service,
            &mut world,
            json!({ "variable_name": "Gold", "type_path": "/Script/Core.Int32", "default_value": 5 }),
        );

        let renamed = service.execute(
            &mut world,
            &json!({
                "action": "modify",
                "owner_name": "BP_Hero",
                "variable_name": "Gold",
                "variable_config": { "new_name": "Coins", "tooltip": "Currency" },
            }),
        );
        assert_eq!(renamed["success"], json!(true), "{renamed}");
        let read = service.execute(
            &mut world,
            &json!({ "action": "get_property", "owner_name": "BP_Hero", "path": "Coins" }),
        );
        assert_eq!(read["data"]["value"], json!(5));

        let retyped = service.execute(
            &mut world,
            &json!({
                "action": "modify",
                "owner_name": "BP_Hero",
                "variable_name": "Coins",
                "variable_config": { "type_path": "/Script/Core.Int64" },
            }),
        );
        assert_eq!(
            retyped["data"]["variable"]["field_type"],
            json!({ "kind": "int64" })
        );

        let invalid = service.execute(
            &mut world,
            &json!({
                "action": "modify",
                "owner_name": "BP_Hero",
                "variable_name": "Coins",
                "variable_config": { "type_path": "NoSeparator" },
            }),
        );
        assert_eq!(invalid["error"]["code"], json!("TYPE_PATH_INVALID"));

        let unknown = service.execute(
            &mut world,
            &json!({ "action": "modify", "owner_name": "BP_Hero", "variable_name": "Gold" }),
        );
        assert_eq!(unknown["error"]["code"], json!("VARIABLE_NOT_FOUND"));
    }
}
