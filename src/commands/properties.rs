use serde_json::{Map, Value};

use crate::{
    commands::{
        request::{parse_body, GetPropertyRequest, SetPropertyRequest},
        variables::owner_not_found,
        CommandError, CommandResult, CommandService, FailureCode,
    },
    host::World,
    Error,
};

impl CommandService {
    pub(super) fn get_property(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: GetPropertyRequest = parse_body(request)?;
        let mut scope = world
            .property_scope(&request.owner_name)
            .map_err(|_| owner_not_found(&request.owner_name))?;

        let property = scope
            .read(&request.path)
            .map_err(|error| classify(&error, FailureCode::GetFailed))?;

        let mut data = Map::new();
        data.insert("path".to_string(), Value::String(property.path));
        data.insert("value".to_string(), property.value);
        data.insert("type_path".to_string(), Value::String(property.type_path));
        data.insert(
            "kind".to_string(),
            Value::String(property.kind.label().to_string()),
        );
        if let Some(enum_name) = property.enum_name {
            data.insert("enum_name".to_string(), Value::String(enum_name));
        }
        Ok(Value::Object(data))
    }

    /// Write one property path. With auto-growth enabled, an out-of-range index on a
    /// top-level array grows the array and the write is retried once.
    pub(super) fn set_property(&self, world: &mut World, request: &Value) -> CommandResult {
        let request: SetPropertyRequest = parse_body(request)?;
        let owner_name = request.owner_name.as_str();
        let mut scope = world
            .property_scope(owner_name)
            .map_err(|_| owner_not_found(owner_name))?;

        let written = if self.config.auto_grow_arrays {
            scope.set_property_growing(
                &request.path,
                &request.value,
                self.config.max_auto_grow_len,
            )
        } else {
            scope
                .set_property(&request.path, &request.value)
                .map(|()| false)
        };
        let grown = written.map_err(|error| classify(&error, FailureCode::SetFailed))?;

        let mut data = Map::new();
        data.insert("path".to_string(), Value::String(request.path.clone()));
        if grown {
            data.insert("grown".to_string(), Value::Bool(true));
        }
        if self.config.compile_after_write {
            Self::compile_into(world, owner_name, &mut data);
        }
        Ok(Value::Object(data))
    }
}

/// Path problems fail with `RESOLVE_FAILED`, value problems with the action's own code
fn classify(error: &Error, fallback: FailureCode) -> CommandError {
    let code = if error.is_resolution() {
        FailureCode::ResolveFailed
    } else {
        fallback
    };
    CommandError::wrap(code, error)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        test::{fixture_registry, HERO_CLASS},
        ServiceConfig,
    };
    use serde_json::json;

    // Owner "BP_Hero" deriving from the fixture Hero class, so its default object carries
    // every Hero field with default values
    fn setup(config: ServiceConfig) -> (CommandService, World) {
        let registry = Arc::new(fixture_registry());
        let mut world = World::new(registry.clone());
        world
            .create_owner("/Game/BP_Hero", "BP_Hero", HERO_CLASS)
            .unwrap();
        (CommandService::new(registry, config), world)
    }

    fn get(service: &CommandService, world: &mut World, path: &str) -> Value {
        service.execute(
            world,
            &json!({ "action": "get_property", "owner_name": "BP_Hero", "path": path }),
        )
    }

    fn set(service: &CommandService, world: &mut World, path: &str, value: Value) -> Value {
        service.execute(
            world,
            &json!({ "action": "set_property", "owner_name": "BP_Hero", "path": path, "value": value }),
        )
    }

    #[test]
    fn test_get_property_metadata() {
        let (service, mut world) = setup(ServiceConfig::default());

        assert_eq!(set(&service, &mut world, "Mood", json!("Happy"))["success"], json!(true));
        let mood = get(&service, &mut world, "Mood");
        assert_eq!(mood["data"]["value"], json!(1));
        assert_eq!(mood["data"]["enum_name"], json!("Happy"));
        assert_eq!(mood["data"]["kind"], json!("Enum"));
        assert_eq!(mood["data"]["type_path"], json!("/Script/Game.EMood"));

        set(&service, &mut world, "Stats.Health", json!(75));
        let health = get(&service, &mut world, "Stats.Health");
        assert_eq!(health["data"]["value"], json!(75.0));
        assert_eq!(health["data"]["path"], json!("Stats.Health"));
        assert!(health["data"].get("enum_name").is_none());
    }

    #[test]
    fn test_failure_codes() {
        let (service, mut world) = setup(ServiceConfig::default().with_compile_after_write(false));

        let missing = get(&service, &mut world, "DoesNotExist");
        assert_eq!(missing["error"]["code"], json!("RESOLVE_FAILED"));
        assert_eq!(missing["details"]["cause"], json!("VARIABLE_NOT_FOUND"));

        let delegate = get(&service, &mut world, "OnHit");
        assert_eq!(delegate["error"]["code"], json!("GET_FAILED"));
        assert_eq!(delegate["details"]["cause"], json!("UNSUPPORTED_PROPERTY_TYPE"));

        let tags = set(&service, &mut world, "Tags", json!(["a"]));
        assert_eq!(tags["error"]["code"], json!("SET_FAILED"));
        assert_eq!(tags["details"]["cause"], json!("SET_SET_UNSUPPORTED"));

        let bad_path = set(&service, &mut world, "Scores[", json!(1));
        assert_eq!(bad_path["details"]["cause"], json!("PATH_SEGMENT_PARSE_FAILED"));

        let owner = service.execute(
            &mut world,
            &json!({ "action": "get_property", "owner_name": "BP_Villain", "path": "Health" }),
        );
        assert_eq!(owner["error"]["code"], json!("OWNER_NOT_FOUND"));
    }

    #[test]
    fn test_auto_growth_toggle() {
        let (service, mut world) = setup(ServiceConfig::default());
        let grown = set(&service, &mut world, "Scores[2]", json!(7));
        assert_eq!(grown["data"]["grown"], json!(true));
        assert_eq!(
            get(&service, &mut world, "Scores")["data"]["value"],
            json!([0, 0, 7])
        );

        let (service, mut world) = setup(ServiceConfig::default().with_auto_grow_arrays(false));
        let rejected = set(&service, &mut world, "Scores[2]", json!(7));
        assert_eq!(rejected["error"]["code"], json!("RESOLVE_FAILED"));
        assert_eq!(rejected["details"]["cause"], json!("PROPERTY_OUT_OF_RANGE"));
        assert_eq!(get(&service, &mut world, "Scores")["data"]["value"], json!([]));
    }
}
