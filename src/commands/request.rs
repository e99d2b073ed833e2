use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    commands::{CommandError, FailureCode},
    fieldtype::{ContainerDescriptor, ReferenceMode},
};

/// Actions understood by [`crate::commands::CommandService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    /// Declare a variable
    Create,
    /// Remove a variable
    Delete,
    /// List the variables of an owner
    List,
    /// Describe one variable
    GetInfo,
    /// Change, rename or retype a variable
    Modify,
    /// Read a property path
    GetProperty,
    /// Write a property path
    SetProperty,
    /// Query the type catalog
    SearchTypes,
    /// Report cache and owner state
    Diagnostics,
}

/// Variable settings of `create` and `modify`. Absent fields keep their current (or default)
/// value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VariableConfig {
    /// Name of the new variable (`create`)
    pub variable_name: Option<String>,
    /// New name of the variable (`modify`)
    pub new_name: Option<String>,
    /// Canonical path of the (element) type
    pub type_path: Option<String>,
    /// Container descriptor
    pub container: Option<ContainerDescriptor>,
    /// Reference mode for class types
    pub reference: Option<ReferenceMode>,
    /// Editor category
    pub category: Option<String>,
    /// Editor tooltip
    pub tooltip: Option<String>,
    /// Default value, either a literal string or any JSON value
    pub default_value: Option<Value>,
    /// Free-form metadata
    pub metadata: Option<BTreeMap<String, String>>,
    /// Only visible to the owner
    pub is_private: Option<bool>,
    /// Exposed as a spawn parameter
    pub is_expose_on_spawn: Option<bool>,
}

impl VariableConfig {
    /// Default value as the literal stored on the variable. Strings are kept verbatim, other
    /// JSON values keep their JSON text.
    pub fn default_literal(&self) -> Option<String> {
        self.default_value.as_ref().map(|value| match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerRequest {
    pub owner_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRequest {
    pub owner_name: String,
    pub variable_config: VariableConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableRequest {
    pub owner_name: String,
    #[serde(default)]
    pub variable_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModifyRequest {
    pub owner_name: String,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub variable_config: VariableConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetPropertyRequest {
    pub owner_name: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetPropertyRequest {
    pub owner_name: String,
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SearchTypesRequest {
    pub category: Option<String>,
    pub search_text: Option<String>,
    pub parent_path: Option<String>,
    pub include_blueprints: Option<bool>,
    pub include_engine_types: Option<bool>,
    pub include_abstract: Option<bool>,
    pub include_deprecated: Option<bool>,
    pub page_offset: Option<usize>,
    pub max_results: Option<usize>,
}

/// Read the `action` field of a raw request.
pub(crate) fn parse_action(request: &Value) -> Result<Action, CommandError> {
    let Some(object) = request.as_object() else {
        return Err(CommandError::new(
            FailureCode::InvalidRequest,
            "Request must be a JSON object",
        ));
    };

    let name = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CommandError::new(
                FailureCode::InvalidRequest,
                "Request is missing the 'action' field",
            )
        })?;

    name.parse::<Action>().map_err(|_| {
        CommandError::new(FailureCode::UnknownAction, format!("Unknown action '{name}'"))
            .with_detail("action", name)
    })
}

/// Decode the action specific fields of a raw request.
pub(crate) fn parse_body<T: DeserializeOwned>(request: &Value) -> Result<T, CommandError> {
    T::deserialize(request)
        .map_err(|error| CommandError::new(FailureCode::InvalidRequest, error.to_string()))
}

/// A required name field: present and not blank
pub(crate) fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
