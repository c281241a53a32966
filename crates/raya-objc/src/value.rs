//! Host-side values and objects seen by the bridge
//!
//! Marshalling between these values and real foreign values belongs to the
//! FFI layer. The bridge only needs enough structure to route accessor
//! calls and to hold instance fields of host-defined subclasses.

use rustc_hash::FxHashMap;

use crate::proxy::ProxyId;
use crate::runtime::{ForeignClass, ObjectId};

/// A host value crossing the bridge
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value (`nil`)
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer of any width
    Int(i64),
    /// Floating point of any width
    Float(f64),
    /// String
    Str(String),
    /// Reference to a foreign object
    Object(ObjectId),
    /// Reference to a foreign class
    Class(ForeignClass),
    /// Ordered sequence
    Array(Vec<Value>),
}

impl Value {
    /// Short name of the value's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
            Value::Array(_) => "array",
        }
    }

    /// Check if this is `Nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get as an integer if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a string slice if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// A foreign object as addressed from host code.
///
/// `id` is the non-owning back-reference to the foreign instance; `class`
/// selects the proxy type used for host-side dispatch.
#[derive(Debug, Clone)]
pub struct HostObject {
    /// Foreign object identity
    pub id: ObjectId,
    /// Proxy type of the receiver
    pub class: ProxyId,
    fields: FxHashMap<String, Value>,
}

impl HostObject {
    /// Create an object with no instance fields
    pub fn new(id: ObjectId, class: ProxyId) -> Self {
        Self {
            id,
            class,
            fields: FxHashMap::default(),
        }
    }

    /// Read an instance field, `Nil` when unset
    pub fn field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Write an instance field
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Mutable access to an assigned instance field
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Check whether the field has ever been assigned
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}
