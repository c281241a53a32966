//! Method definition and export
//!
//! Every host method defined on a proxy type goes through
//! [`Bridge::define_method`]. When the type is bridging, the new method is
//! checked against the foreign runtime and, if it overrides a known
//! selector, registered so foreign callers reach the host implementation.
//!
//! Methods can also be exported explicitly with a type list
//! ([`Bridge::objc_method`]); those do not need a pre-existing selector.

use log::debug;

use crate::bridge::Bridge;
use crate::encoding::{takes_no_arguments, TypeSpec};
use crate::error::{BridgeError, BridgeResult};
use crate::kvc::{setter_name, SetterSlots};
use crate::method::{HostMethod, MethodRole};
use crate::proxy::ProxyId;
use crate::runtime::{MethodExport, MethodKind};
use crate::selector::{selector_arity, selector_for_export, selector_for_method};
use crate::value::Value;

/// Selector and encoding of a foreign method a host method overrides
struct OverridePlan {
    selector: String,
    encoding: String,
}

impl Bridge {
    /// Define a host method on a proxy type.
    ///
    /// Returns the export registered with the foreign runtime, if the method
    /// overrides a foreign selector. An arity mismatch with that selector is
    /// rejected before the method is defined.
    ///
    /// Defining `key=` over a key-value setter wrapper keeps the wrapper
    /// visible and installs the new method as its raw setter. Such a setter
    /// must take exactly one argument.
    pub fn define_method(
        &mut self,
        proxy: ProxyId,
        name: &str,
        kind: MethodKind,
        method: HostMethod,
    ) -> BridgeResult<Option<MethodExport>> {
        let plan = self.plan_override(proxy, name, kind, method.arity())?;

        let realias = self.realias_setter(proxy, name, kind, &method);
        if realias.is_some() && method.arity() != 1 {
            return Err(BridgeError::ArgumentCount {
                method: name.to_string(),
                expected: 1,
                given: method.arity(),
            });
        }

        let visible = match realias {
            Some((key, wrapper)) => {
                self.proxy_mut(proxy)?.set_setter_slots(
                    &key,
                    SetterSlots {
                        wrapper: wrapper.clone(),
                        raw: method,
                    },
                );
                debug!("{} keeps notifying wrapper for {}", name, key);
                wrapper
            }
            None => method,
        };
        self.proxy_mut(proxy)?.insert_method(name, kind, visible);

        match plan {
            Some(plan) => {
                let export = self.export(proxy, plan.selector, plan.encoding, kind, name.to_string())?;
                Ok(Some(export))
            }
            None => Ok(None),
        }
    }

    /// Key and wrapper `method` should sit behind, if `name` is a setter
    /// shadowing a wrapper
    fn realias_setter(
        &self,
        proxy: ProxyId,
        name: &str,
        kind: MethodKind,
        method: &HostMethod,
    ) -> Option<(String, HostMethod)> {
        if kind != MethodKind::Instance {
            return None;
        }
        let key = name.strip_suffix('=')?;
        if matches!(method.role(), MethodRole::KvcWrapper(k) if k == key) {
            return None;
        }
        let slots = self.proxies().find_setter_slots(proxy, key)?;
        Some((key.to_string(), slots.wrapper.clone()))
    }

    fn plan_override(
        &self,
        proxy: ProxyId,
        name: &str,
        kind: MethodKind,
        arity: usize,
    ) -> BridgeResult<Option<OverridePlan>> {
        if self.ignores_overrides() || !self.proxies().is_bridging(proxy) {
            return Ok(None);
        }
        let ty = self.proxy(proxy)?;
        let Some(class) = ty.foreign else {
            return Ok(None);
        };

        let selector = selector_for_method(name, arity);
        let existing = if ty.is_inherited() {
            self.runtime().method_type(class, &selector, kind)
        } else {
            None
        };
        let Some(encoding) =
            existing.or_else(|| self.runtime().informal_protocol_method_type(&selector, kind))
        else {
            return Ok(None);
        };

        let expected = selector_arity(&selector);
        if expected != arity {
            return Err(BridgeError::ArityMismatch {
                selector,
                method: name.to_string(),
                expected,
                actual: arity,
            });
        }
        Ok(Some(OverridePlan { selector, encoding }))
    }

    /// Register a method with the foreign runtime and record it on the type
    pub(crate) fn export(
        &mut self,
        proxy: ProxyId,
        selector: String,
        encoding: String,
        kind: MethodKind,
        implementation: String,
    ) -> BridgeResult<MethodExport> {
        let ty = self.proxy(proxy)?;
        let class = ty
            .foreign
            .ok_or_else(|| BridgeError::NoForeignClass(ty.name.clone()))?;
        let export = MethodExport {
            class,
            selector,
            encoding,
            kind,
            implementation,
        };

        self.runtime().add_method(&export)?;
        debug!(
            "exported {}{} {} on {}",
            if kind.is_class_method() { "+" } else { "-" },
            export.selector,
            export.encoding,
            self.proxy(proxy)?.name
        );
        self.proxy_mut(proxy)?.push_export(export.clone());
        Ok(export)
    }

    // ========================================================================
    // Explicit export
    // ========================================================================

    /// Export an instance method with explicit types.
    ///
    /// When `method` is given it is defined first (without override
    /// checks); otherwise an existing host method of that name is exported.
    pub fn objc_method(
        &mut self,
        proxy: ProxyId,
        name: &str,
        types: TypeSpec,
        method: Option<HostMethod>,
    ) -> BridgeResult<MethodExport> {
        self.objc_export(proxy, name, types, MethodKind::Instance, method)
    }

    /// Export a class method with explicit types
    pub fn objc_class_method(
        &mut self,
        proxy: ProxyId,
        name: &str,
        types: TypeSpec,
        method: Option<HostMethod>,
    ) -> BridgeResult<MethodExport> {
        self.objc_export(proxy, name, types, MethodKind::Class, method)
    }

    fn objc_export(
        &mut self,
        proxy: ProxyId,
        name: &str,
        types: TypeSpec,
        kind: MethodKind,
        method: Option<HostMethod>,
    ) -> BridgeResult<MethodExport> {
        let encoding = self.encoder().encode(&types)?;
        let selector = selector_for_export(name, takes_no_arguments(&encoding)?);
        if let Some(method) = method {
            self.proxy_mut(proxy)?.insert_method(name, kind, method);
        }
        self.export(proxy, selector, encoding, kind, name.to_string())
    }

    /// Make `new_name` an alias of the instance method `old_name`.
    ///
    /// The foreign side is aliased too when `old_name` has a known
    /// selector; the returned export is that alias.
    pub fn objc_alias_method(
        &mut self,
        proxy: ProxyId,
        new_name: &str,
        old_name: &str,
    ) -> BridgeResult<Option<MethodExport>> {
        self.objc_alias(proxy, new_name, old_name, MethodKind::Instance)
    }

    /// Make `new_name` an alias of the class method `old_name`
    pub fn objc_alias_class_method(
        &mut self,
        proxy: ProxyId,
        new_name: &str,
        old_name: &str,
    ) -> BridgeResult<Option<MethodExport>> {
        self.objc_alias(proxy, new_name, old_name, MethodKind::Class)
    }

    fn objc_alias(
        &mut self,
        proxy: ProxyId,
        new_name: &str,
        old_name: &str,
        kind: MethodKind,
    ) -> BridgeResult<Option<MethodExport>> {
        let method = self
            .proxies()
            .find_method(proxy, old_name, kind)
            .cloned()
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: self
                    .proxy(proxy)
                    .map(|ty| ty.name.clone())
                    .unwrap_or_default(),
                method: old_name.to_string(),
            })?;
        let arity = method.arity();
        self.proxy_mut(proxy)?.insert_method(new_name, kind, method);

        let old_selector = selector_for_method(old_name, arity);
        let new_selector = selector_for_method(new_name, arity);
        let encoding = match self.proxies().find_export(proxy, &old_selector, kind) {
            Some(export) => Some(export.encoding.clone()),
            None => self
                .proxies()
                .foreign_class(proxy)
                .and_then(|class| self.runtime().method_type(class, &old_selector, kind)),
        };

        match encoding {
            Some(encoding) => self
                .export(proxy, new_selector, encoding, kind, new_name.to_string())
                .map(Some),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Interface builder
    // ========================================================================

    /// Define field writers for outlet connections
    pub fn ib_outlets(&mut self, proxy: ProxyId, names: &[&str]) -> BridgeResult<()> {
        for name in names {
            let field = name.to_string();
            let writer = HostMethod::new(1, move |inv, args| {
                inv.receiver().set_field(field.as_str(), args[0].clone());
                Ok(Value::Nil)
            });
            self.define_method(proxy, &setter_name(name), MethodKind::Instance, writer)?;
        }
        Ok(())
    }

    /// Define an action method. Actions take the sender as their only
    /// argument and are subject to the usual override checks.
    pub fn ib_action(
        &mut self,
        proxy: ProxyId,
        name: &str,
        method: HostMethod,
    ) -> BridgeResult<Option<MethodExport>> {
        self.define_method(proxy, name, MethodKind::Instance, method)
    }
}
