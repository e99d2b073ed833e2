use serde::Serialize;
use serde_json::{json, Map, Value};
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Failure codes reported by the command facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    /// The request is not an object, or a field is missing or has the wrong type
    InvalidRequest,
    /// The `action` field names no known action
    UnknownAction,
    /// The owner could not be located
    OwnerNotFound,
    /// `variable_name` is missing or empty
    VariableNameMissing,
    /// `type_path` is missing or empty
    TypePathRequired,
    /// `type_path` is not a `<module>.<Name>` path
    TypePathInvalid,
    /// Declaring the variable failed
    CreateFailed,
    /// Removing the variable failed
    DeleteFailed,
    /// Changing the variable failed
    ModifyFailed,
    /// The owner has no variable of this name
    VariableNotFound,
    /// The property path could not be walked
    ResolveFailed,
    /// The slot was reached but could not be read
    GetFailed,
    /// The slot was reached but could not be written
    SetFailed,
}

/// Failure of one command.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct CommandError {
    /// Failure code
    pub code: FailureCode,
    /// Human readable message
    pub message: String,
    /// Additional context, e.g. the wrapped core error code under `cause`
    pub details: Option<Map<String, Value>>,
}

impl CommandError {
    /// Failure without details
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        CommandError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Failure wrapping a core error; its code is recorded as `details.cause`
    pub fn wrap(code: FailureCode, error: &crate::Error) -> Self {
        Self::new(code, error.to_string()).with_detail("cause", error.code())
    }

    /// Attach a detail entry
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Code and message of a failed response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Failure code
    pub code: FailureCode,
    /// Human readable message
    pub message: String,
}

/// Uniform response envelope of every command.
///
/// Successful responses carry `data`, failed ones carry `error` and optionally `details`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Whether the command succeeded
    pub success: bool,
    /// Action specific payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure code and message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// Failure context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl Response {
    /// Successful response carrying `data`
    pub fn success(data: Value) -> Self {
        Response {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    /// Failed response built from a command error
    pub fn failure(error: CommandError) -> Self {
        Response {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: error.code,
                message: error.message,
            }),
            details: error.details,
        }
    }

    /// Code of a failed response
    pub fn failure_code(&self) -> Option<FailureCode> {
        self.error.as_ref().map(|error| error.code)
    }

    /// Serialize into the JSON shape returned to callers
    pub fn into_value(self) -> Value {
        serde_json::to_value(&self).unwrap_or_else(|error| {
            json!({
                "success": false,
                "error": { "code": "INVALID_REQUEST", "message": error.to_string() },
            })
        })
    }
}

impl From<std::result::Result<Value, CommandError>> for Response {
    fn from(result: std::result::Result<Value, CommandError>) -> Self {
        match result {
            Ok(data) => Response::success(data),
            Err(error) => Response::failure(error),
        }
    }
}
