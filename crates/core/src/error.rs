//! Error types for registry operations

/// Error type for class, property, method and enum operations
///
/// Lookups that return `Option`/empty collections never produce these; the
/// name-keyed helpers and accessors do.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MirrorError {
    /// No class registered for the given name or identity
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// Property name not present in the class (or any base)
    #[error("Property not found: {class}.{property}")]
    PropertyNotFound { class: String, property: String },

    /// Method name not present in the class (or any base)
    #[error("Method not found: {class}.{method}")]
    MethodNotFound { class: String, method: String },

    /// A dotted path failed to resolve against the class
    #[error("Path not found: {class}.{path}")]
    PathNotFound { class: String, path: String },

    /// The accessor required by the operation is absent
    #[error("Access denied: {member} cannot {operation}")]
    AccessDenied {
        member: String,
        operation: &'static str,
    },

    /// Value, object or signature type does not match the descriptor
    #[error("Type mismatch on {member}: expected {expected}, got {actual}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    /// Boxed exchange attempted on a type that cannot be cloned
    #[error("{0} is not copy-constructible")]
    NotCopyConstructible(String),

    /// Name or value has no counterpart in the enum table
    #[error("{enum_name} enum: invalid conversion of {value}")]
    InvalidEnumConversion { enum_name: String, value: String },

    /// Enum declaration text could not be parsed
    #[error("Invalid declaration for {enum_name}: {reason}")]
    InvalidDeclaration { enum_name: String, reason: String },

    /// A member with this name is already declared by the class
    #[error("Duplicate member: {class}.{member}")]
    DuplicateMember { class: String, member: String },

    /// Registry already initialized
    #[error("Registry already initialized")]
    AlreadyInitialized,
}

impl MirrorError {
    pub(crate) fn access_denied(member: &str, operation: &'static str) -> Self {
        Self::AccessDenied {
            member: member.to_string(),
            operation,
        }
    }

    pub(crate) fn type_mismatch(member: &str, expected: &str, actual: &str) -> Self {
        Self::TypeMismatch {
            member: member.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result type for registry operations
pub type MirrorResult<T> = Result<T, MirrorError>;
