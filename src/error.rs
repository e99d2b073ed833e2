use strum::IntoStaticStr;
use thiserror::Error;

macro_rules! type_mismatch {
    ($expected:expr, $value:expr) => {
        crate::Error::ValueTypeMismatch {
            expected: $expected.to_string(),
            found: crate::error::json_type_name($value),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every variant maps to a stable, SCREAMING_SNAKE_CASE error code through [`Error::code`]. The
/// codes are part of the external contract: the command facade copies them verbatim into the
/// `details.cause` field of its responses, and callers are expected to branch on them rather
/// than on the human readable message.
///
/// # Error Categories
///
/// ## Input and Parse Errors
/// - [`Error::PathEmpty`] - Empty or whitespace-only property path
/// - [`Error::PathSegmentParseFailed`] - Unbalanced brackets or quotes in a path segment
/// - [`Error::TypePathInvalid`] - Type path without a `module.Name` separator
///
/// ## Resolution Errors
/// - [`Error::VariableNotFound`] - First path segment does not name a top-level field
/// - [`Error::PropertyNotFound`] - A nested path segment does not name a struct field
/// - [`Error::PropertyOutOfRange`] - Array index outside of `0..len`
/// - [`Error::MapKeyNotFound`] / [`Error::MapKeyConvertFailed`] - Map key lookup failures
/// - [`Error::TypeNotFound`] - Type path cannot be resolved against the registry
/// - [`Error::ObjectLoadFailed`] / [`Error::ObjectTypeMismatch`] - Object reference failures
///
/// ## Unsupported Operations
/// - [`Error::UnsupportedPropertyType`] - Field kind outside of the marshalling allow-list
/// - [`Error::SetSetUnsupported`] / [`Error::MapSetUnsupported`] - Container writes
/// - [`Error::SetIndexUnsupported`] - Indexing into a set
///
/// # Examples
///
/// ```rust
/// use propscope::{property::PropertyPath, Error};
///
/// match "Inventory[2".parse::<PropertyPath>() {
///     Err(error @ Error::PathSegmentParseFailed(_)) => {
///         assert_eq!(error.code(), "PATH_SEGMENT_PARSE_FAILED");
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Error {
    // Path parsing errors
    /// The property path was empty or consisted only of whitespace.
    #[error("Property path is empty")]
    PathEmpty,

    /// A path segment could not be parsed.
    ///
    /// Raised for unbalanced brackets, unterminated quotes, empty identifiers and trailing
    /// characters after a closing bracket. The associated value is the offending segment.
    #[error("Failed to parse path segment '{0}'")]
    PathSegmentParseFailed(String),

    // Path resolution errors
    /// The first segment of a path does not name a field on the owning object.
    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    /// A nested segment does not name a field of the struct reached so far.
    #[error("Property '{field}' not found on '{owner}'")]
    PropertyNotFound {
        /// Name of the missing field
        field: String,
        /// Canonical path of the struct that was searched
        owner: String,
    },

    /// More segments follow a field that is neither a struct nor an indexed container.
    #[error("Cannot traverse into non-struct property '{0}'")]
    CannotTraverseNonStruct(String),

    /// More segments follow a container field that was not indexed.
    #[error("Container property '{0}' requires an index to traverse further")]
    ContainerRequiresIndex(String),

    /// An array segment carries a bracket token that is not a number.
    #[error("Array index '{token}' on '{segment}' is not numeric")]
    ArrayIndexNotNumeric {
        /// Segment name
        segment: String,
        /// Raw bracket token
        token: String,
    },

    /// An array segment carries empty brackets.
    #[error("Array index missing on '{0}'")]
    ArrayIndexMissing(String),

    /// An array index is negative or not below the current length.
    #[error("Index {index} out of range for '{segment}' (length {len})")]
    PropertyOutOfRange {
        /// Segment name
        segment: String,
        /// Requested index
        index: i64,
        /// Current container length
        len: usize,
    },

    /// No map entry compares equal to the converted key.
    #[error("Key {key} not found in map '{segment}'")]
    MapKeyNotFound {
        /// Segment name
        segment: String,
        /// Display form of the key
        key: String,
    },

    /// The bracket token could not be converted to the map's declared key type.
    #[error("Failed to convert map key: {0}")]
    MapKeyConvertFailed(String),

    /// Sets are not addressable through the path grammar.
    #[error("Set property '{0}' cannot be indexed")]
    SetIndexUnsupported(String),

    // Marshalling errors
    /// The field kind is outside of the marshalling allow-list.
    #[error("Unsupported property type '{0}'")]
    UnsupportedPropertyType(String),

    /// Writing a whole set is not supported.
    #[error("Writing set property '{0}' is not supported")]
    SetSetUnsupported(String),

    /// Writing a whole map is not supported.
    #[error("Writing map property '{0}' is not supported")]
    MapSetUnsupported(String),

    /// An object reference could not be resolved to a live instance.
    #[error("Failed to load object '{0}'")]
    ObjectLoadFailed(String),

    /// The resolved object is not assignment-compatible with the declared class.
    #[error("Object '{path}' of class '{actual}' is not a '{expected}'")]
    ObjectTypeMismatch {
        /// Textual identifier of the object
        path: String,
        /// Class of the resolved instance
        actual: String,
        /// Class declared by the field
        expected: String,
    },

    /// The JSON value has a shape the target field cannot accept.
    #[error("Expected {expected}, found {found}")]
    ValueTypeMismatch {
        /// Description of the accepted input
        expected: String,
        /// JSON type that was supplied
        found: &'static str,
    },

    /// A numeric value does not fit the target field width.
    #[error("Value {value} out of range for {target}")]
    ValueOutOfRange {
        /// Display form of the rejected value
        value: String,
        /// Target field kind
        target: &'static str,
    },

    // Type system errors
    /// A type path could not be resolved.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// A type path does not follow the `<module>.<LocalName>` format.
    #[error("Invalid type path '{0}'")]
    TypePathInvalid(String),

    /// A type references itself through its parent chain or nests too deeply.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    // Host errors
    /// The owning object could not be located.
    #[error("Owner '{0}' not found")]
    OwnerNotFound(String),

    /// A variable with the same name already exists on the owner.
    #[error("Variable '{0}' already exists")]
    VariableAlreadyExists(String),

    /// A variable name is empty or contains path grammar characters.
    #[error("Invalid variable name '{0}'")]
    VariableNameInvalid(String),

    /// The live data of an object does not match its reflected layout.
    #[error("Data layout mismatch on '{0}'")]
    LayoutMismatch(String),

    /// Failed to lock target.
    #[error("Failed to lock target")]
    LockError,

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    #[strum(serialize = "INTERNAL_ERROR")]
    Error(String),
}

impl Error {
    /// Stable error code of this error, e.g. `"VARIABLE_NOT_FOUND"`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// Returns `true` for errors raised while parsing or walking a property path, as opposed
    /// to errors raised while converting the value of the slot that was reached.
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::PathEmpty
                | Error::PathSegmentParseFailed(_)
                | Error::VariableNotFound(_)
                | Error::PropertyNotFound { .. }
                | Error::CannotTraverseNonStruct(_)
                | Error::ContainerRequiresIndex(_)
                | Error::ArrayIndexNotNumeric { .. }
                | Error::ArrayIndexMissing(_)
                | Error::PropertyOutOfRange { .. }
                | Error::MapKeyNotFound { .. }
                | Error::MapKeyConvertFailed(_)
                | Error::SetIndexUnsupported(_)
        )
    }
}

/// JSON type name used in [`Error::ValueTypeMismatch`] messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::PathEmpty.code(), "PATH_EMPTY");
        assert_eq!(
            Error::VariableNotFound("Health".into()).code(),
            "VARIABLE_NOT_FOUND"
        );
        assert_eq!(Error::SetSetUnsupported("Tags".into()).code(), "SET_SET_UNSUPPORTED");
        assert_eq!(
            Error::PropertyOutOfRange {
                segment: "Items".into(),
                index: 3,
                len: 1
            }
            .code(),
            "PROPERTY_OUT_OF_RANGE"
        );
        assert_eq!(Error::Error("boom".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_resolution_classification() {
        assert!(Error::VariableNotFound("Health".into()).is_resolution());
        assert!(Error::MapKeyConvertFailed("abc".into()).is_resolution());
        assert!(!Error::SetSetUnsupported("Tags".into()).is_resolution());
        assert!(!Error::ValueOutOfRange {
            value: "300".into(),
            target: "Int32"
        }
        .is_resolution());
    }

    #[test]
    fn test_messages_name_the_segment() {
        let error = Error::VariableNotFound("DoesNotExist".into());
        assert!(error.to_string().contains("DoesNotExist"));

        let error = type_mismatch!("a boolean", &serde_json::json!([1]));
        assert_eq!(error.to_string(), "Expected a boolean, found array");
    }
}
