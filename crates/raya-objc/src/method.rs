//! Host methods attached to proxy types

use std::fmt;
use std::sync::Arc;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::runtime::ForeignRuntime;
use crate::value::{HostObject, Value};

/// Implementation of a host method
pub type MethodFn = Arc<dyn Fn(&mut Invocation<'_>, &[Value]) -> BridgeResult<Value>>;

/// What generated a method.
///
/// Key-value setter wrappers are tagged so a hand-written setter defined
/// later can be told apart from the wrapper it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodRole {
    /// Ordinary host method
    Plain,
    /// Notification-aware setter wrapper for a key
    KvcWrapper(String),
}

/// A host method: declared arity plus implementation
#[derive(Clone)]
pub struct HostMethod {
    arity: usize,
    role: MethodRole,
    body: MethodFn,
}

impl HostMethod {
    /// Create a method taking `arity` arguments
    pub fn new<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> BridgeResult<Value> + 'static,
    {
        Self {
            arity,
            role: MethodRole::Plain,
            body: Arc::new(body),
        }
    }

    pub(crate) fn with_role(mut self, role: MethodRole) -> Self {
        self.role = role;
        self
    }

    /// Declared argument count
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Generator tag of the method
    pub fn role(&self) -> &MethodRole {
        &self.role
    }

    /// Check whether two handles share one implementation
    pub fn same_body(&self, other: &HostMethod) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    /// Run the method after checking the argument count
    pub fn call(
        &self,
        name: &str,
        invocation: &mut Invocation<'_>,
        args: &[Value],
    ) -> BridgeResult<Value> {
        if args.len() != self.arity {
            return Err(BridgeError::ArgumentCount {
                method: name.to_string(),
                expected: self.arity,
                given: args.len(),
            });
        }
        (self.body)(invocation, args)
    }
}

impl fmt::Debug for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMethod")
            .field("arity", &self.arity)
            .field("role", &self.role)
            .finish()
    }
}

/// Context of a running host method
pub struct Invocation<'a> {
    bridge: &'a Bridge,
    receiver: &'a mut HostObject,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(bridge: &'a Bridge, receiver: &'a mut HostObject) -> Self {
        Self { bridge, receiver }
    }

    /// The bridge dispatching the call
    pub fn bridge(&self) -> &'a Bridge {
        self.bridge
    }

    /// The foreign runtime
    pub fn runtime(&self) -> &'a dyn ForeignRuntime {
        self.bridge.runtime()
    }

    /// The receiving object
    pub fn receiver(&mut self) -> &mut HostObject {
        &mut *self.receiver
    }

    /// Call another host method on the receiver
    pub fn send(&mut self, name: &str, args: &[Value]) -> BridgeResult<Value> {
        self.bridge.send(&mut *self.receiver, name, args)
    }
}
