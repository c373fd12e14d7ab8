//! Error types for boxing and reflection

/// Result type for reflective operations
pub type ReflectionResult<T> = Result<T, ReflectionError>;

/// Errors raised by the object model and the reflection API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectionError {
    /// A type's metadata registration is malformed
    #[error("Invalid registration of type {type_name}: {message}")]
    Registration {
        /// Type being registered
        type_name: String,
        /// What was wrong
        message: String,
    },

    /// No type is registered under the requested name
    #[error("Type {0} is not registered")]
    TypeNotFound(String),

    /// Wrong number of arguments passed to a method or constructor
    #[error("Wrong number of parameters for {member}: expected {expected}, got {got}")]
    ArityMismatch {
        /// Declaring type and member name
        member: String,
        /// Registered parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// A boxed value does not hold the exact requested type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// The activator was asked to build a type without constructors
    #[error("Type {0} does not have registered constructors")]
    NoConstructors(String),

    /// No registered constructor matches the supplied arguments
    #[error("No matching public constructor was found for type {0}")]
    NoMatchingConstructor(String),

    /// An instance member was used on a null object
    #[error("Object reference not set to an instance of an object")]
    NullReference,

    /// Enum operation on a type that is not an enum
    #[error("Type {0} is not an enum")]
    NotAnEnum(String),

    /// Enum name not present in the type's value table
    #[error("Requested value '{value}' was not found in enum {type_name}")]
    UnknownEnumValue {
        /// Enum type
        type_name: String,
        /// Requested name
        value: String,
    },

    /// Positional access past the end of a tuple
    #[error("Index {index} is out of range for {type_name}")]
    IndexOutOfRange {
        /// Accessed type
        type_name: String,
        /// Requested position
        index: i32,
    },
}

impl ReflectionError {
    pub(crate) fn registration(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ReflectionError::Registration {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ReflectionError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
