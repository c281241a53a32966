//! Class import
//!
//! Creates proxy types for foreign classes on demand. Importing a class
//! first imports the nearest nameable ancestor, so every proxy type's
//! superclass exists before the type itself.

use log::debug;
use rustc_hash::FxHashSet;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::proxy::{ProxyId, ProxyKind, OBJECT_ROOT, PROXY_ROOT};
use crate::runtime::ForeignClass;

/// Decides which foreign class names the bridge can expose
pub trait NamingPolicy {
    /// Names imported by a full sweep
    fn is_public(&self, name: &str) -> bool;

    /// Names usable as a proxy type name at all
    fn is_nameable(&self, name: &str) -> bool;
}

/// Cocoa convention: exposed names start with an uppercase letter
#[derive(Debug, Clone, Copy, Default)]
pub struct CocoaNaming;

impl NamingPolicy for CocoaNaming {
    fn is_public(&self, name: &str) -> bool {
        name.starts_with(|c: char| c.is_ascii_uppercase())
    }

    fn is_nameable(&self, name: &str) -> bool {
        self.is_public(name) && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// Outcome of an import request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imported {
    /// A proxy type was created by this request
    New(ProxyId),
    /// The proxy type already existed
    Existing(ProxyId),
}

impl Imported {
    /// The proxy type, new or not
    pub fn id(self) -> ProxyId {
        match self {
            Imported::New(id) | Imported::Existing(id) => id,
        }
    }

    /// Check whether the request created the type
    pub fn is_new(self) -> bool {
        matches!(self, Imported::New(_))
    }
}

impl Bridge {
    /// Import a foreign class by name.
    ///
    /// Returns `None` when the runtime has no class of that name. Repeated
    /// imports return the same proxy type.
    pub fn import(&mut self, name: &str) -> Option<Imported> {
        if let Some(id) = self.proxies().by_name(name) {
            return Some(Imported::Existing(id));
        }
        let class = self.runtime().class_by_name(name)?;
        if let Some(id) = self.proxies().by_foreign(class) {
            return Some(Imported::Existing(id));
        }

        debug!("importing {}...", name);
        let superclass = self.lookup_superclass(class);
        let id = self
            .proxies_mut()
            .insert(name, class, superclass, ProxyKind::Imported);
        debug!(
            "importing {}... done ({})",
            name,
            self.proxies().ancestor_names(id).join(" < ")
        );
        Some(Imported::New(id))
    }

    /// Import a class, failing if the runtime does not know it
    pub fn require_class(&mut self, name: &str) -> BridgeResult<ProxyId> {
        self.import(name)
            .map(Imported::id)
            .ok_or_else(|| BridgeError::ClassNotFound(name.to_string()))
    }

    /// Import every public class the runtime currently knows.
    ///
    /// Returns the number of proxy types created.
    pub fn import_all(&mut self) -> usize {
        let mut created = 0;
        for name in self.runtime().class_names() {
            if !self.naming().is_public(&name) || self.proxies().by_name(&name).is_some() {
                continue;
            }
            if self.import(&name).is_some_and(Imported::is_new) {
                created += 1;
            }
        }
        debug!("import sweep created {} proxy types", created);
        created
    }

    /// Proxy type to use as the superclass of a foreign class.
    ///
    /// Walks the reflected superclass chain. Proxy-forwarding classes map to
    /// the proxy root; the first nameable ancestor is imported and used;
    /// reaching the top, or a cycle, maps to the object root.
    fn lookup_superclass(&mut self, class: ForeignClass) -> ProxyId {
        let mut seen = FxHashSet::default();
        seen.insert(class);
        let mut current = class;

        loop {
            let superclass = match self.runtime().superclass(current) {
                Some(s) if seen.insert(s) => s,
                _ => return OBJECT_ROOT,
            };
            if self.is_proxy_class(superclass) {
                return PROXY_ROOT;
            }

            let name = self.runtime().class_name(superclass);
            if self.naming().is_nameable(&name) {
                if let Some(id) = self.proxies().by_foreign(superclass) {
                    return id;
                }
                if let Some(imported) = self.import(&name) {
                    return imported.id();
                }
            }
            current = superclass;
        }
    }

    /// Check whether a class is the runtime's proxy root or derives from it
    fn is_proxy_class(&self, class: ForeignClass) -> bool {
        let Some(root) = self.runtime().class_by_name(&self.config().proxy_root_class) else {
            return false;
        };

        let mut seen = FxHashSet::default();
        let mut current = Some(class);
        while let Some(cur) = current {
            if cur == root {
                return true;
            }
            if !seen.insert(cur) {
                break;
            }
            current = self.runtime().superclass(cur);
        }
        false
    }

    // ========================================================================
    // Subclassing
    // ========================================================================

    /// Create a host subclass of an imported type.
    ///
    /// The foreign runtime creates a class of the same name and binds it to
    /// the current bundle. The new type is *inherited*: its overrides look
    /// up selectors on the foreign class itself.
    pub fn define_subclass(&mut self, name: &str, superclass: ProxyId) -> BridgeResult<ProxyId> {
        if self.proxies().by_name(name).is_some() {
            return Err(BridgeError::DuplicateClass(name.to_string()));
        }
        let parent = self.proxy(superclass)?;
        if parent.is_root() || parent.foreign.is_none() {
            return Err(BridgeError::NotSubclassable(parent.name.clone()));
        }
        let parent_name = parent.name.clone();

        let class = self
            .runtime()
            .derived_class_new(name, &parent_name)
            .ok_or_else(|| BridgeError::DerivedClassFailed {
                name: name.to_string(),
                superclass: parent_name.clone(),
            })?;
        let id = self
            .proxies_mut()
            .insert(name, class, superclass, ProxyKind::Derived);
        self.runtime().bind_class_with_current_bundle(class);

        debug!("defined {} < {}", name, parent_name);
        Ok(id)
    }
}
