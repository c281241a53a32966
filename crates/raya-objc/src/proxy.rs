//! Proxy type arena
//!
//! Host proxy types mirroring foreign classes live in an append-only arena
//! indexed by `ProxyId`. Entries are never removed: a proxy created for a
//! class is returned again on every later request.
//!
//! Two roots terminate every hierarchy:
//!
//! | Id | Name      | Stands for                      |
//! |----|-----------|---------------------------------|
//! | 0  | `ObjcID`  | opaque foreign object           |
//! | 1  | `NSProxy` | foreign proxy-forwarding object |
//!
//! Types created directly under a root are *bridging* types; everything
//! below them inherits the capability.

use rustc_hash::FxHashMap;

use crate::kvc::{NotificationPolicy, SetterSlots};
use crate::method::HostMethod;
use crate::runtime::{ForeignClass, MethodExport, MethodKind};

/// Index of a proxy type in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub usize);

/// Root standing for any foreign object
pub const OBJECT_ROOT: ProxyId = ProxyId(0);

/// Root standing for foreign proxy objects
pub const PROXY_ROOT: ProxyId = ProxyId(1);

/// Name of the opaque object root
pub const OBJECT_ROOT_NAME: &str = "ObjcID";

/// Which sentinel a root proxy is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Opaque foreign object
    Object,
    /// Foreign proxy object
    Proxy,
}

/// How a proxy type came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// One of the two sentinels
    Root(RootKind),
    /// Mirrors a pre-existing foreign class
    Imported,
    /// Subclassed from host code; its foreign class was created by the bridge
    Derived,
}

/// A host type standing in for one foreign class
#[derive(Debug, Clone)]
pub struct ProxyType {
    /// Arena index
    pub id: ProxyId,
    /// Type name
    pub name: String,
    /// Foreign class identity (`None` for roots)
    pub foreign: Option<ForeignClass>,
    /// Synthesized superclass (`None` for roots)
    pub superclass: Option<ProxyId>,
    /// Origin of the type
    pub kind: ProxyKind,
    bridging: bool,
    instance_methods: FxHashMap<String, HostMethod>,
    class_methods: FxHashMap<String, HostMethod>,
    exports: Vec<MethodExport>,
    notification_policies: FxHashMap<String, NotificationPolicy>,
    setter_slots: FxHashMap<String, SetterSlots>,
}

impl ProxyType {
    fn new(
        id: ProxyId,
        name: String,
        foreign: Option<ForeignClass>,
        superclass: Option<ProxyId>,
        kind: ProxyKind,
    ) -> Self {
        let bridging = matches!(superclass, Some(OBJECT_ROOT) | Some(PROXY_ROOT));
        Self {
            id,
            name,
            foreign,
            superclass,
            kind,
            bridging,
            instance_methods: FxHashMap::default(),
            class_methods: FxHashMap::default(),
            exports: Vec::new(),
            notification_policies: FxHashMap::default(),
            setter_slots: FxHashMap::default(),
        }
    }

    /// Check whether the foreign class was created by host subclassing
    pub fn is_inherited(&self) -> bool {
        self.kind == ProxyKind::Derived
    }

    /// Check whether this type is one of the roots
    pub fn is_root(&self) -> bool {
        matches!(self.kind, ProxyKind::Root(_))
    }

    /// Check whether this type declares bridging itself (inherited
    /// bridging is answered by `ProxyRegistry::is_bridging`)
    pub fn declares_bridging(&self) -> bool {
        self.bridging
    }

    /// Methods defined directly on this type
    pub fn methods(&self, kind: MethodKind) -> &FxHashMap<String, HostMethod> {
        match kind {
            MethodKind::Instance => &self.instance_methods,
            MethodKind::Class => &self.class_methods,
        }
    }

    /// Look up a method defined directly on this type
    pub fn method(&self, name: &str, kind: MethodKind) -> Option<&HostMethod> {
        self.methods(kind).get(name)
    }

    /// Define or replace a method, returning the previous one
    pub fn insert_method(
        &mut self,
        name: impl Into<String>,
        kind: MethodKind,
        method: HostMethod,
    ) -> Option<HostMethod> {
        let table = match kind {
            MethodKind::Instance => &mut self.instance_methods,
            MethodKind::Class => &mut self.class_methods,
        };
        table.insert(name.into(), method)
    }

    /// Methods registered with the foreign runtime from this type
    pub fn exports(&self) -> &[MethodExport] {
        &self.exports
    }

    pub(crate) fn push_export(&mut self, export: MethodExport) {
        self.exports
            .retain(|e| !(e.selector == export.selector && e.kind == export.kind));
        self.exports.push(export);
    }

    pub(crate) fn set_notification_policy(&mut self, key: &str, policy: NotificationPolicy) {
        self.notification_policies.insert(key.to_string(), policy);
    }

    /// Setter wrapper and raw setter declared on this type for a key
    pub fn setter_slots(&self, key: &str) -> Option<&SetterSlots> {
        self.setter_slots.get(key)
    }

    pub(crate) fn set_setter_slots(&mut self, key: &str, slots: SetterSlots) {
        self.setter_slots.insert(key.to_string(), slots);
    }
}

/// Arena of proxy types with name and identity indexes
#[derive(Debug, Clone)]
pub struct ProxyRegistry {
    types: Vec<ProxyType>,
    by_name: FxHashMap<String, ProxyId>,
    by_foreign: FxHashMap<ForeignClass, ProxyId>,
}

impl ProxyRegistry {
    /// Create an arena holding only the two roots
    pub fn new(proxy_root_name: &str) -> Self {
        let mut registry = Self {
            types: Vec::new(),
            by_name: FxHashMap::default(),
            by_foreign: FxHashMap::default(),
        };
        registry.push(ProxyType::new(
            OBJECT_ROOT,
            OBJECT_ROOT_NAME.to_string(),
            None,
            None,
            ProxyKind::Root(RootKind::Object),
        ));
        registry.push(ProxyType::new(
            PROXY_ROOT,
            proxy_root_name.to_string(),
            None,
            None,
            ProxyKind::Root(RootKind::Proxy),
        ));
        registry
    }

    fn push(&mut self, ty: ProxyType) -> ProxyId {
        let id = ty.id;
        self.by_name.insert(ty.name.clone(), id);
        if let Some(foreign) = ty.foreign {
            self.by_foreign.insert(foreign, id);
        }
        self.types.push(ty);
        id
    }

    /// Append a proxy type
    pub fn insert(
        &mut self,
        name: &str,
        foreign: ForeignClass,
        superclass: ProxyId,
        kind: ProxyKind,
    ) -> ProxyId {
        let id = ProxyId(self.types.len());
        self.push(ProxyType::new(
            id,
            name.to_string(),
            Some(foreign),
            Some(superclass),
            kind,
        ))
    }

    /// Get a proxy type by id
    pub fn get(&self, id: ProxyId) -> Option<&ProxyType> {
        self.types.get(id.0)
    }

    /// Get a mutable proxy type by id
    pub fn get_mut(&mut self, id: ProxyId) -> Option<&mut ProxyType> {
        self.types.get_mut(id.0)
    }

    /// Look up a proxy type by name
    pub fn by_name(&self, name: &str) -> Option<ProxyId> {
        self.by_name.get(name).copied()
    }

    /// Look up the proxy type mirroring a foreign class
    pub fn by_foreign(&self, class: ForeignClass) -> Option<ProxyId> {
        self.by_foreign.get(&class).copied()
    }

    /// Number of proxy types, roots included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always `false`: the roots are present from creation
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all proxy types
    pub fn iter(&self) -> impl Iterator<Item = &ProxyType> {
        self.types.iter()
    }

    /// The type followed by its superclasses, ending at a root
    pub fn ancestors(&self, id: ProxyId) -> Vec<ProxyId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(ty) = self.get(cur) else { break };
            chain.push(cur);
            current = ty.superclass;
        }
        chain
    }

    /// Names along `ancestors`
    pub fn ancestor_names(&self, id: ProxyId) -> Vec<&str> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur).map(|ty| ty.name.as_str()))
            .collect()
    }

    /// Check whether `id` is `ancestor` or one of its subclasses
    pub fn is_subclass_of(&self, id: ProxyId, ancestor: ProxyId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Check whether the type or one of its ancestors is a bridging type
    pub fn is_bridging(&self, id: ProxyId) -> bool {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur))
            .any(|ty| ty.bridging)
    }

    /// Find a method along the ancestor chain, nearest first
    pub fn find_method(&self, id: ProxyId, name: &str, kind: MethodKind) -> Option<&HostMethod> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur))
            .find_map(|ty| ty.method(name, kind))
    }

    /// Find the export registered for a selector along the ancestor chain
    pub fn find_export(&self, id: ProxyId, selector: &str, kind: MethodKind) -> Option<&MethodExport> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur))
            .find_map(|ty| {
                ty.exports()
                    .iter()
                    .find(|e| e.selector == selector && e.kind == kind)
            })
    }

    /// Nearest declared notification policy for a key
    pub fn notification_policy(&self, id: ProxyId, key: &str) -> Option<NotificationPolicy> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur))
            .find_map(|ty| ty.notification_policies.get(key).copied())
    }

    /// Nearest setter slots for a key along the ancestor chain
    pub fn find_setter_slots(&self, id: ProxyId, key: &str) -> Option<&SetterSlots> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur))
            .find_map(|ty| ty.setter_slots(key))
    }

    /// Nearest foreign class along the ancestor chain
    pub fn foreign_class(&self, id: ProxyId) -> Option<ForeignClass> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|cur| self.get(cur))
            .find_map(|ty| ty.foreign)
    }
}
