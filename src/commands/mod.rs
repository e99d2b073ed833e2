//! Command facade over the host world.
//!
//! [`CommandService`] accepts loosely typed JSON requests of the form
//! `{ "action": "...", ... }`, runs them against a [`World`] and answers with the uniform
//! response envelope:
//!
//! - success: `{ "success": true, "data": { ... } }`
//! - failure: `{ "success": false, "error": { "code", "message" }, "details"?: { ... } }`
//!
//! Core errors never cross this boundary as Rust errors. They are wrapped in a
//! [`CommandError`] whose `details.cause` carries the core error code. Compile failures after
//! a successful change are downgraded to a `compile_warning` entry in the response data.
//!
//! # Key Components
//!
//! - [`CommandService`]: Owns the type catalog, the field type resolver and the configuration
//! - [`Action`]: The closed set of action names
//! - [`Response`] / [`CommandError`] / [`FailureCode`]: Response envelope and failure codes
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use propscope::{
//!     commands::CommandService,
//!     host::World,
//!     reflection::{ReflectedType, ReflectionRegistry},
//!     ServiceConfig,
//! };
//! use serde_json::json;
//!
//! let registry = Arc::new(ReflectionRegistry::new());
//! registry.register(ReflectedType::class("/Script/Engine", "Actor"));
//!
//! let mut world = World::new(registry.clone());
//! world.create_owner("/Game/BP_Lamp", "BP_Lamp", "/Script/Engine.Actor")?;
//! let service = CommandService::new(registry, ServiceConfig::default());
//!
//! let created = service.execute(&mut world, &json!({
//!     "action": "create",
//!     "owner_name": "BP_Lamp",
//!     "variable_config": { "variable_name": "Brightness", "type_path": "/Script/Core.Float" },
//! }));
//! assert_eq!(created["success"], json!(true));
//!
//! service.execute(&mut world, &json!({
//!     "action": "set_property", "owner_name": "BP_Lamp", "path": "Brightness", "value": 0.5,
//! }));
//! let read = service.execute(&mut world, &json!({
//!     "action": "get_property", "owner_name": "BP_Lamp", "path": "Brightness",
//! }));
//! assert_eq!(read["data"]["value"], json!(0.5));
//! # Ok::<(), propscope::Error>(())
//! ```

mod properties;
mod request;
mod response;
mod types;
mod variables;

pub use request::{Action, VariableConfig};
pub use response::{CommandError, ErrorBody, FailureCode, Response};

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    catalog::TypeCatalog, fieldtype::FieldTypeResolver, host::World,
    reflection::ReflectionRegistry, ServiceConfig,
};

type CommandResult = std::result::Result<Value, CommandError>;

/// Entry point of the command facade.
///
/// One service is created per registry and passed wherever commands are executed; it holds
/// no reference to the [`World`] it operates on.
pub struct CommandService {
    config: ServiceConfig,
    catalog: Arc<TypeCatalog>,
    resolver: FieldTypeResolver,
}

impl CommandService {
    /// Create a service over `registry`.
    ///
    /// The type catalog is built lazily on the first query.
    pub fn new(registry: Arc<ReflectionRegistry>, config: ServiceConfig) -> Self {
        CommandService {
            catalog: Arc::new(TypeCatalog::new(registry.clone(), config.catalog.clone())),
            resolver: FieldTypeResolver::new(registry),
            config,
        }
    }

    /// Service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Type catalog used by `search_types`
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Field type resolver used by `create` and `modify`
    pub fn resolver(&self) -> &FieldTypeResolver {
        &self.resolver
    }

    /// Execute a raw JSON request and return the JSON response envelope.
    pub fn execute(&self, world: &mut World, request: &Value) -> Value {
        self.dispatch(world, request).into_value()
    }

    /// Execute a raw JSON request and return the typed response envelope.
    pub fn dispatch(&self, world: &mut World, request: &Value) -> Response {
        let action = match request::parse_action(request) {
            Ok(action) => action,
            Err(error) => {
                log::debug!("rejected request: {error}");
                return Response::failure(error);
            }
        };

        log::debug!("dispatching '{action}'");
        let result = match action {
            Action::Create => self.create(world, request),
            Action::Delete => self.delete(world, request),
            Action::List => self.list(world, request),
            Action::GetInfo => self.get_info(world, request),
            Action::Modify => self.modify(world, request),
            Action::GetProperty => self.get_property(world, request),
            Action::SetProperty => self.set_property(world, request),
            Action::SearchTypes => self.search_types(request),
            Action::Diagnostics => self.diagnostics(world),
        };

        if let Err(error) = &result {
            log::debug!("'{action}' failed: {error}");
        }
        result.into()
    }

    /// Compile an owner after a change, downgrading failures to a warning entry in `data`
    fn compile_into(world: &mut World, owner_name: &str, data: &mut Map<String, Value>) {
        if let Err(message) = world.compile(owner_name) {
            log::warn!("compile of '{owner_name}' failed: {message}");
            data.insert("compile_warning".to_string(), Value::String(message));
        }
    }
}
