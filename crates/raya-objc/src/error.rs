//! Error types for the Objective-C bridge

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised by the bridge.
///
/// Every variant is fatal for the call that produced it. Missing metadata is
/// not represented here: it is reported through the log and the affected
/// loader returns `false`.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No bundle matched the framework name in any search path
    #[error("Can't locate framework '{0}'")]
    FrameworkNotFound(String),

    /// The bundle was found but the foreign runtime failed to load it
    #[error("Can't load framework '{0}'")]
    FrameworkLoadFailed(String),

    /// No foreign class with this name is visible to the process
    #[error("Foreign class not found: {0}")]
    ClassNotFound(String),

    /// Neither a C constant nor a class matched the name
    #[error("uninitialized constant {0}")]
    UndefinedConstant(String),

    /// Host method and foreign selector disagree on argument count
    #[error(
        "Cannot override foreign method '{selector}' with host method #{method}, \
         they should both have the same number of arguments. \
         (expected arity {expected}, got {actual})"
    )]
    ArityMismatch {
        /// Foreign selector being overridden
        selector: String,
        /// Host method name
        method: String,
        /// Argument count implied by the selector
        expected: usize,
        /// Argument count declared by the host method
        actual: usize,
    },

    /// Unknown symbolic type tag
    #[error("Invalid type (got '{got}', expected one of : {expected}, or a boxed type)")]
    InvalidType {
        /// The offending tag
        got: String,
        /// Accepted vocabulary, comma separated
        expected: String,
    },

    /// A type list must at least name the return type
    #[error("Given types list should have at least an element")]
    EmptyTypeList,

    /// Unbalanced aggregate braces in a type encoding
    #[error("illegal type encodings: {0}")]
    IllegalTypeEncoding(String),

    /// Key-value coding found no accessor for the key
    #[error("{class}: this class is not key value coding-compliant for the key \"{key}\"")]
    NotKeyValueCodingCompliant {
        /// Proxy type name of the receiver
        class: String,
        /// Missing key
        key: String,
    },

    /// No host method with this name along the receiver's proxy chain
    #[error("undefined method '{method}' for {class}")]
    MethodNotFound {
        /// Proxy type name of the receiver
        class: String,
        /// Method or selector name
        method: String,
    },

    /// A host method was called with the wrong number of arguments
    #[error("wrong number of arguments for {method} (given {given}, expected {expected})")]
    ArgumentCount {
        /// Host method name
        method: String,
        /// Declared arity
        expected: usize,
        /// Arguments supplied
        given: usize,
    },

    /// The proxy id does not belong to this bridge
    #[error("Unknown proxy type id: {0}")]
    UnknownProxy(usize),

    /// A proxy type with this name already exists
    #[error("Class already defined: {0}")]
    DuplicateClass(String),

    /// The proxy type has no foreign class to derive from
    #[error("Cannot subclass {0}: it has no foreign counterpart")]
    NotSubclassable(String),

    /// The proxy type cannot carry foreign methods
    #[error("{0} has no foreign counterpart")]
    NoForeignClass(String),

    /// The foreign runtime refused to create the derived class
    #[error("Failed to create foreign class {name} deriving from {superclass}")]
    DerivedClassFailed {
        /// Requested class name
        name: String,
        /// Superclass name
        superclass: String,
    },

    /// `new` is not available on this foreign class
    #[error("use 'alloc.initXXX' to instantiate Cocoa Object ({0})")]
    RestrictedNew(String),

    /// Indexed collection access outside the backing sequence
    #[error("Index {index} out of range for key '{key}' (length {len})")]
    IndexOutOfRange {
        /// Collection key
        key: String,
        /// Requested index
        index: usize,
        /// Current length
        len: usize,
    },

    /// A host value had the wrong shape for the operation
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected value kind
        expected: String,
        /// Actual value kind
        got: String,
    },

    /// Error reported by the foreign runtime
    #[error("Foreign runtime error: {0}")]
    Foreign(String),

    /// Failed to read a configuration file
    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a configuration file
    #[error("Failed to parse bridge config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
