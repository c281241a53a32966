//! Bridge context
//!
//! `Bridge` owns every piece of process-wide bridge state: configuration,
//! the signature marks, the module table and the proxy type arena. All
//! operations are methods on it; they are spread across the modules that
//! implement them (`loader`, `importer`, `overrides`, `kvc`).

use log::debug;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::encoding::{BoxedType, TypeEncoder};
use crate::error::{BridgeError, BridgeResult};
use crate::importer::{CocoaNaming, Imported, NamingPolicy};
use crate::loader::Module;
use crate::method::Invocation;
use crate::proxy::{ProxyId, ProxyRegistry, ProxyType};
use crate::runtime::{ForeignRuntime, MethodKind, Receiver};
use crate::signatures::SignatureLoader;
use crate::value::{HostObject, Value};

/// Name of the restricted constructor selector
const NEW_SELECTOR: &str = "new";

/// Result of resolving a constant name
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// A C constant supplied by signature metadata
    Value(Value),
    /// A foreign class, imported on demand
    Class(ProxyId),
}

/// The Objective-C bridge
pub struct Bridge {
    config: BridgeConfig,
    runtime: Arc<dyn ForeignRuntime>,
    naming: Box<dyn NamingPolicy>,
    signatures: SignatureLoader,
    modules: FxHashMap<String, Module>,
    proxies: ProxyRegistry,
    encoder: TypeEncoder,
    ignore_overrides: bool,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("signatures", &self.signatures)
            .field("modules", &self.modules)
            .field("proxy_types", &self.proxies.len())
            .field("ignore_overrides", &self.ignore_overrides)
            .finish()
    }
}

impl Bridge {
    /// Create a bridge holding only the two root proxy types
    pub fn new(config: BridgeConfig, runtime: Arc<dyn ForeignRuntime>) -> Self {
        let proxies = ProxyRegistry::new(&config.proxy_root_class);
        Self {
            config,
            runtime,
            naming: Box::new(CocoaNaming),
            signatures: SignatureLoader::new(),
            modules: FxHashMap::default(),
            proxies,
            encoder: TypeEncoder::new(),
            ignore_overrides: false,
        }
    }

    /// Create a bridge and load the foundation frameworks.
    ///
    /// Foundation signatures are applied and every public class is imported
    /// with override interception disabled.
    pub fn bootstrap(config: BridgeConfig, runtime: Arc<dyn ForeignRuntime>) -> Self {
        let mut bridge = Self::new(config, runtime);
        bridge.with_overrides_ignored(|bridge| {
            let frameworks = bridge.config.foundation_frameworks.clone();
            for framework in &frameworks {
                if !bridge.load_signatures(framework) {
                    debug!("no signatures for {}", framework);
                }
            }
            bridge.import_all();
        });
        bridge
    }

    /// Replace the naming policy used by imports
    pub fn with_naming_policy(mut self, naming: impl NamingPolicy + 'static) -> Self {
        self.naming = Box::new(naming);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The foreign runtime
    pub fn runtime(&self) -> &dyn ForeignRuntime {
        self.runtime.as_ref()
    }

    /// Naming policy for imports
    pub fn naming(&self) -> &dyn NamingPolicy {
        self.naming.as_ref()
    }

    /// Proxy type arena
    pub fn proxies(&self) -> &ProxyRegistry {
        &self.proxies
    }

    pub(crate) fn proxies_mut(&mut self) -> &mut ProxyRegistry {
        &mut self.proxies
    }

    /// Get a proxy type by id
    pub fn proxy(&self, id: ProxyId) -> BridgeResult<&ProxyType> {
        self.proxies.get(id).ok_or(BridgeError::UnknownProxy(id.0))
    }

    pub(crate) fn proxy_mut(&mut self, id: ProxyId) -> BridgeResult<&mut ProxyType> {
        self.proxies.get_mut(id).ok_or(BridgeError::UnknownProxy(id.0))
    }

    /// Signature marks
    pub fn signatures(&self) -> &SignatureLoader {
        &self.signatures
    }

    pub(crate) fn signature_parts(
        &mut self,
    ) -> (&BridgeConfig, &dyn ForeignRuntime, &mut SignatureLoader) {
        (&self.config, self.runtime.as_ref(), &mut self.signatures)
    }

    pub(crate) fn modules(&self) -> &FxHashMap<String, Module> {
        &self.modules
    }

    pub(crate) fn modules_mut(&mut self) -> &mut FxHashMap<String, Module> {
        &mut self.modules
    }

    /// Type encoder used by explicit exports
    pub fn encoder(&self) -> &TypeEncoder {
        &self.encoder
    }

    /// Make a boxed type usable by name in type lists
    pub fn register_boxed_type(&mut self, boxed: BoxedType) {
        self.encoder.register_boxed(boxed);
    }

    // ========================================================================
    // Override interception switch
    // ========================================================================

    /// Check whether method definitions currently skip override handling
    pub fn ignores_overrides(&self) -> bool {
        self.ignore_overrides
    }

    /// Run `f` with override handling disabled, restoring the previous
    /// setting afterwards
    pub fn with_overrides_ignored<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.ignore_overrides, true);
        let result = f(self);
        self.ignore_overrides = previous;
        result
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Call a host instance method on an object
    pub fn send(&self, object: &mut HostObject, name: &str, args: &[Value]) -> BridgeResult<Value> {
        let method = self
            .proxies
            .find_method(object.class, name, MethodKind::Instance)
            .cloned()
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: self.type_name(object.class),
                method: name.to_string(),
            })?;
        let mut invocation = Invocation::new(self, object);
        method.call(name, &mut invocation, args)
    }

    /// Check whether instances (or the class) of a type answer `name`
    pub fn responds_to(&self, proxy: ProxyId, name: &str, kind: MethodKind) -> bool {
        self.proxies.find_method(proxy, name, kind).is_some()
    }

    /// Route a foreign selector to the host method exported for it
    pub fn dispatch_selector(
        &self,
        object: &mut HostObject,
        selector: &str,
        args: &[Value],
    ) -> BridgeResult<Value> {
        let implementation = self
            .proxies
            .find_export(object.class, selector, MethodKind::Instance)
            .map(|export| export.implementation.clone())
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: self.type_name(object.class),
                method: selector.to_string(),
            })?;
        self.send(object, &implementation, args)
    }

    /// Instantiate a type through the foreign `new`.
    ///
    /// Only allowed when the foreign class itself declares `new`; otherwise
    /// objects must be created with an explicit alloc/init sequence.
    pub fn new_instance(&self, proxy: ProxyId) -> BridgeResult<Value> {
        let ty = self.proxy(proxy)?;
        let class = ty
            .foreign
            .ok_or_else(|| BridgeError::NoForeignClass(ty.name.clone()))?;

        if self
            .runtime
            .method_type(class, NEW_SELECTOR, MethodKind::Class)
            .is_none()
        {
            return Err(BridgeError::RestrictedNew(ty.name.clone()));
        }
        self.runtime
            .send_message(Receiver::Class(class), NEW_SELECTOR, &[])
    }

    /// Resolve an unknown constant name: C constants first, then classes
    pub fn resolve_constant(&mut self, name: &str) -> BridgeResult<Constant> {
        if let Some(value) = self.runtime.lookup_constant(name) {
            return Ok(Constant::Value(value));
        }
        self.import(name)
            .map(|imported: Imported| Constant::Class(imported.id()))
            .ok_or_else(|| BridgeError::UndefinedConstant(name.to_string()))
    }

    fn type_name(&self, id: ProxyId) -> String {
        self.proxies
            .get(id)
            .map(|ty| ty.name.clone())
            .unwrap_or_default()
    }
}
