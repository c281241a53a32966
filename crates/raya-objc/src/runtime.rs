//! ForeignRuntime trait: the lower FFI layer
//!
//! Defines the operations the bridge needs from the Objective-C runtime.
//! The bridge never calls into libobjc directly: class reflection, bundle
//! loading, metadata application, method registration and message sending
//! all go through this trait. Embedders provide the concrete implementation;
//! the test suite provides a recording in-memory one.
//!
//! Handles passed across this boundary (`ForeignClass`, `ObjectId`) are
//! opaque identities owned by the foreign runtime. The bridge only borrows
//! them as lookup keys.

use std::fmt;
use std::path::Path;

use crate::error::BridgeResult;
use crate::value::Value;

/// Opaque identity of a foreign class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignClass(pub u64);

impl fmt::Display for ForeignClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<class {:#x}>", self.0)
    }
}

/// Opaque identity of a foreign object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Whether a method lives on instances or on the class itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Instance method (`-`)
    Instance,
    /// Class method (`+`)
    Class,
}

impl MethodKind {
    /// `true` for class methods
    pub fn is_class_method(self) -> bool {
        matches!(self, MethodKind::Class)
    }
}

/// Receiver of a foreign message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// An instance
    Object(ObjectId),
    /// A class object
    Class(ForeignClass),
}

/// Kind of change reported for indexed collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Elements were inserted
    Insertion,
    /// Elements were removed
    Removal,
    /// Elements were replaced in place
    Replacement,
}

/// A method registered with the foreign runtime.
///
/// `implementation` names the host method the foreign runtime must route the
/// selector back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodExport {
    /// Class receiving the method
    pub class: ForeignClass,
    /// Foreign selector, colons marking argument boundaries
    pub selector: String,
    /// Type encoding of return value and arguments
    pub encoding: String,
    /// Instance or class method
    pub kind: MethodKind,
    /// Host method implementing the selector
    pub implementation: String,
}

/// Abstract Objective-C runtime used by the bridge.
///
/// All methods are synchronous. The bridge assumes a single logical thread
/// of control and performs no locking of its own.
pub trait ForeignRuntime {
    // ========================================================================
    // Class Reflection
    // ========================================================================

    /// Look up a class by name
    fn class_by_name(&self, name: &str) -> Option<ForeignClass>;

    /// Display name of a class
    fn class_name(&self, class: ForeignClass) -> String;

    /// Reflected superclass; root classes return `None` or themselves
    fn superclass(&self, class: ForeignClass) -> Option<ForeignClass>;

    /// Names of every class currently visible to the process
    fn class_names(&self) -> Vec<String>;

    /// Create a foreign class `name` deriving from `superclass`
    fn derived_class_new(&self, name: &str, superclass: &str) -> Option<ForeignClass>;

    /// Bind a host-created class to the current bundle so the runtime can
    /// resolve its methods back to host code
    fn bind_class_with_current_bundle(&self, class: ForeignClass);

    // ========================================================================
    // Bundles and Metadata
    // ========================================================================

    /// Check whether the bundle at `path` is loaded
    fn bundle_is_loaded(&self, path: &Path) -> bool;

    /// Ask the runtime to load the bundle at `path`
    fn load_bundle(&self, path: &Path);

    /// Bundle identifier of the bundle at `path`
    fn bundle_identifier(&self, path: &Path) -> Option<String>;

    /// Apply a signature (metadata) file
    fn load_signature_file(&self, path: &Path);

    /// Load the native companion library of a signature file
    fn load_signature_library(&self, path: &Path);

    /// Value of a C constant described by loaded metadata
    fn lookup_constant(&self, name: &str) -> Option<Value>;

    // ========================================================================
    // Methods
    // ========================================================================

    /// Type encoding of an existing method on `class`
    fn method_type(&self, class: ForeignClass, selector: &str, kind: MethodKind)
        -> Option<String>;

    /// Type encoding known from an informal protocol
    fn informal_protocol_method_type(&self, selector: &str, kind: MethodKind) -> Option<String>;

    /// Register a method implemented by host code
    fn add_method(&self, export: &MethodExport) -> BridgeResult<()>;

    /// Send a message and wait for its result
    fn send_message(
        &self,
        receiver: Receiver,
        selector: &str,
        args: &[Value],
    ) -> BridgeResult<Value>;

    // ========================================================================
    // Key-Value Observing
    // ========================================================================

    /// `+automaticallyNotifiesObserversForKey:` of `class`
    fn automatically_notifies_observers(&self, class: ForeignClass, key: &str) -> bool;

    /// `-willChangeValueForKey:`
    fn will_change_value(&self, object: ObjectId, key: &str);

    /// `-didChangeValueForKey:`
    fn did_change_value(&self, object: ObjectId, key: &str);

    /// `-willChange:valuesAtIndexes:forKey:`
    fn will_change_values_at_indexes(
        &self,
        object: ObjectId,
        kind: ChangeKind,
        indexes: &[usize],
        key: &str,
    );

    /// `-didChange:valuesAtIndexes:forKey:`
    fn did_change_values_at_indexes(
        &self,
        object: ObjectId,
        kind: ChangeKind,
        indexes: &[usize],
        key: &str,
    );

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Whether the runtime runs in debug mode
    fn debug_enabled(&self) -> bool {
        false
    }
}
