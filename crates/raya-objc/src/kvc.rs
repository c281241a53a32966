//! Key-value coding
//!
//! Generated accessors let foreign observers watch host objects:
//!
//! | Declaration          | Host methods                        | Notifications            |
//! |----------------------|-------------------------------------|--------------------------|
//! | `kvc_reader`         | `key`                               | none                     |
//! | `kvc_writer`         | `key=` (wrapper over a raw setter)  | will/did change value    |
//! | `kvc_array_accessor` | five indexed collection operations  | will/did change at index |
//! | `kvc_wrapper_*`      | `key`, `key=` routed to the runtime | the runtime's own        |
//!
//! A writer keeps two setters per key: the notifying *wrapper* visible as
//! `key=`, and the *raw* setter it calls. Defining `key=` later on the same
//! type or a subtype replaces only the raw slot, so notifications survive
//! hand-written setters.

use log::debug;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::method::{HostMethod, Invocation, MethodRole};
use crate::proxy::ProxyId;
use crate::runtime::{ChangeKind, MethodKind, Receiver};
use crate::value::{HostObject, Value};

/// Selector the runtime uses to declare dependent keys
pub const DEPENDENT_KEYS_SELECTOR: &str = "setKeys:triggerChangeNotificationsForDependentKey:";

/// Whether setter wrappers emit change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPolicy {
    /// Always notify
    Always,
    /// Never notify
    Never,
    /// Ask the foreign runtime on every change
    #[default]
    Queryable,
}

/// Wrapper and raw setter for one key
#[derive(Debug, Clone)]
pub struct SetterSlots {
    /// Notifying setter visible as `key=`
    pub wrapper: HostMethod,
    /// Setter doing the actual mutation
    pub raw: HostMethod,
}

/// Host name of the setter for a key
pub fn setter_name(key: &str) -> String {
    format!("{key}=")
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Names and encodings of the indexed collection operations for a key.
///
/// Each entry is `(host name, foreign selector, encoding)`.
pub fn array_accessor_exports(key: &str) -> [(String, String, &'static str); 5] {
    let k = capitalize(key);
    [
        (format!("countOf{k}"), format!("countOf{k}"), "i4@8:12"),
        (
            format!("objectIn{k}AtIndex"),
            format!("objectIn{k}AtIndex:"),
            "@4@8:12i16",
        ),
        (
            format!("insertObject_in{k}AtIndex"),
            format!("insertObject:in{k}AtIndex:"),
            "@4@8:12@16i20",
        ),
        (
            format!("removeObjectFrom{k}AtIndex"),
            format!("removeObjectFrom{k}AtIndex:"),
            "@4@8:12i16",
        ),
        (
            format!("replaceObjectIn{k}AtIndex_withObject"),
            format!("replaceObjectIn{k}AtIndex:withObject:"),
            "@4@8:12i16@20",
        ),
    ]
}

fn index_arg(value: &Value) -> BridgeResult<usize> {
    value
        .as_int()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| BridgeError::TypeMismatch {
            expected: "non-negative index".to_string(),
            got: value.kind_name().to_string(),
        })
}

fn array_field<'o>(object: &'o mut HostObject, key: &str) -> BridgeResult<&'o mut Vec<Value>> {
    match object.field_mut(key) {
        Some(Value::Array(items)) => Ok(items),
        other => Err(BridgeError::TypeMismatch {
            expected: "array".to_string(),
            got: other.map_or("nil", |v| v.kind_name()).to_string(),
        }),
    }
}

fn check_index(key: &str, index: usize, len: usize) -> BridgeResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(BridgeError::IndexOutOfRange {
            key: key.to_string(),
            index,
            len,
        })
    }
}

/// Run `mutate` between the indexed will/did notifications when the
/// receiver's type allows it
fn notify_indexed<F>(
    inv: &mut Invocation<'_>,
    key: &str,
    change: ChangeKind,
    index: usize,
    mutate: F,
) -> BridgeResult<()>
where
    F: FnOnce(&mut Vec<Value>),
{
    let bridge = inv.bridge();
    let runtime = inv.runtime();
    let object = inv.receiver();
    let notify = bridge.notifies_observers(object.class, key);
    let id = object.id;

    // shape check before anything is announced
    array_field(object, key)?;

    if notify {
        runtime.will_change_values_at_indexes(id, change, &[index], key);
    }
    mutate(array_field(inv.receiver(), key)?);
    if notify {
        runtime.did_change_values_at_indexes(id, change, &[index], key);
    }
    Ok(())
}

impl Bridge {
    // ========================================================================
    // Generic access
    // ========================================================================

    /// Read a key through the receiver's host methods.
    ///
    /// Tries a method named `key`, then `key?`.
    pub fn value_for_key(&self, object: &mut HostObject, key: &str) -> BridgeResult<Value> {
        let predicate = format!("{key}?");
        for name in [key, predicate.as_str()] {
            if self
                .proxies()
                .find_method(object.class, name, MethodKind::Instance)
                .is_some()
            {
                return self.send(object, name, &[]);
            }
        }
        Err(self.not_compliant(object.class, key))
    }

    /// Write a key through the receiver's host methods.
    ///
    /// The raw setter is preferred so the foreign runtime, which already
    /// notifies around its own `setValue:forKey:`, is not notified twice.
    /// Falls back to `key=`.
    pub fn set_value_for_key(
        &self,
        object: &mut HostObject,
        value: Value,
        key: &str,
    ) -> BridgeResult<()> {
        if let Some(slots) = self.proxies().find_setter_slots(object.class, key) {
            let raw = slots.raw.clone();
            let mut inv = Invocation::new(self, object);
            raw.call(&setter_name(key), &mut inv, &[value])?;
            return Ok(());
        }

        let setter = setter_name(key);
        if self
            .proxies()
            .find_method(object.class, &setter, MethodKind::Instance)
            .is_some()
        {
            self.send(object, &setter, &[value])?;
            return Ok(());
        }
        Err(self.not_compliant(object.class, key))
    }

    fn not_compliant(&self, class: ProxyId, key: &str) -> BridgeError {
        BridgeError::NotKeyValueCodingCompliant {
            class: self
                .proxies()
                .get(class)
                .map(|ty| ty.name.clone())
                .unwrap_or_default(),
            key: key.to_string(),
        }
    }

    // ========================================================================
    // Notification policy
    // ========================================================================

    /// Set the notification policy of a key on a proxy type and its subtypes
    pub fn set_notification_policy(
        &mut self,
        proxy: ProxyId,
        key: &str,
        policy: NotificationPolicy,
    ) -> BridgeResult<()> {
        self.proxy_mut(proxy)?.set_notification_policy(key, policy);
        Ok(())
    }

    /// Check whether a change of `key` on instances of `class` is announced
    pub fn notifies_observers(&self, class: ProxyId, key: &str) -> bool {
        let policy = self
            .proxies()
            .notification_policy(class, key)
            .unwrap_or_default();
        match policy {
            NotificationPolicy::Always => true,
            NotificationPolicy::Never => false,
            NotificationPolicy::Queryable => self
                .proxies()
                .foreign_class(class)
                .map(|foreign| self.runtime().automatically_notifies_observers(foreign, key))
                .unwrap_or(false),
        }
    }

    // ========================================================================
    // Accessor generation
    // ========================================================================

    /// Define field-backed readers
    pub fn kvc_reader(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        for key in keys {
            let field = key.to_string();
            let reader = HostMethod::new(0, move |inv, _| Ok(inv.receiver().field(&field)));
            self.define_method(proxy, key, MethodKind::Instance, reader)?;
        }
        Ok(())
    }

    /// Define notifying writers.
    ///
    /// An existing `key=` becomes the raw setter; otherwise a field writer is
    /// generated. Keys that already have a wrapper along the chain are left
    /// alone.
    pub fn kvc_writer(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        for key in keys {
            if self.proxies().find_setter_slots(proxy, key).is_some() {
                continue;
            }

            let setter = setter_name(key);
            let raw = match self
                .proxies()
                .find_method(proxy, &setter, MethodKind::Instance)
            {
                Some(existing) => existing.clone(),
                None => {
                    let field = key.to_string();
                    HostMethod::new(1, move |inv, args| {
                        inv.receiver().set_field(field.as_str(), args[0].clone());
                        Ok(args[0].clone())
                    })
                }
            };

            let wrapper = setter_wrapper(key);
            self.proxy_mut(proxy)?.set_setter_slots(
                key,
                SetterSlots {
                    wrapper: wrapper.clone(),
                    raw,
                },
            );
            self.define_method(proxy, &setter, MethodKind::Instance, wrapper)?;
            debug!("kvc writer {} on {}", key, self.proxy(proxy)?.name);
        }
        Ok(())
    }

    /// `kvc_reader` followed by `kvc_writer`
    pub fn kvc_accessor(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        self.kvc_reader(proxy, keys)?;
        self.kvc_writer(proxy, keys)
    }

    /// Define indexed collection accessors over array fields and export them
    /// to the foreign runtime.
    ///
    /// Accessing an index outside the array fails with `IndexOutOfRange`
    /// before any notification is sent.
    pub fn kvc_array_accessor(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        for key in keys {
            let [count, get, insert, remove, replace] = array_accessor_exports(key);
            let methods = [
                (&count.0, array_count(key)),
                (&get.0, array_get(key)),
                (&insert.0, array_insert(key)),
                (&remove.0, array_remove(key)),
                (&replace.0, array_replace(key)),
            ];
            let ty = self.proxy_mut(proxy)?;
            for (name, method) in methods {
                ty.insert_method(name.as_str(), MethodKind::Instance, method);
            }

            for (name, selector, encoding) in [count, get, insert, remove, replace] {
                self.export(proxy, selector, encoding.to_string(), MethodKind::Instance, name)?;
            }
        }
        Ok(())
    }

    /// Declare that changes to `keys` also change each of `dependents`
    pub fn kvc_depends_on(
        &mut self,
        proxy: ProxyId,
        keys: &[&str],
        dependents: &[&str],
    ) -> BridgeResult<()> {
        let ty = self.proxy(proxy)?;
        let class = ty
            .foreign
            .ok_or_else(|| BridgeError::NoForeignClass(ty.name.clone()))?;
        let keys: Vec<Value> = keys.iter().map(|k| Value::from(*k)).collect();

        for dependent in dependents {
            self.runtime().send_message(
                Receiver::Class(class),
                DEPENDENT_KEYS_SELECTOR,
                &[Value::Array(keys.clone()), Value::from(*dependent)],
            )?;
        }
        Ok(())
    }

    // ========================================================================
    // Runtime-routed accessors
    // ========================================================================

    /// Readers that ask the foreign runtime through `valueForKey:`
    pub fn kvc_wrapper_reader(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        for key in keys {
            let name = key.to_string();
            let reader = HostMethod::new(0, move |inv, _| {
                let id = inv.receiver().id;
                inv.runtime()
                    .send_message(Receiver::Object(id), "valueForKey:", &[Value::from(name.as_str())])
            });
            self.define_method(proxy, key, MethodKind::Instance, reader)?;
        }
        Ok(())
    }

    /// Writers that go through the foreign runtime's `setValue:forKey:`
    pub fn kvc_wrapper_writer(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        for key in keys {
            let name = key.to_string();
            let writer = HostMethod::new(1, move |inv, args| {
                let id = inv.receiver().id;
                inv.runtime().send_message(
                    Receiver::Object(id),
                    "setValue:forKey:",
                    &[args[0].clone(), Value::from(name.as_str())],
                )
            });
            self.define_method(proxy, &setter_name(key), MethodKind::Instance, writer)?;
        }
        Ok(())
    }

    /// `kvc_wrapper_reader` followed by `kvc_wrapper_writer`
    pub fn kvc_wrapper(&mut self, proxy: ProxyId, keys: &[&str]) -> BridgeResult<()> {
        self.kvc_wrapper_reader(proxy, keys)?;
        self.kvc_wrapper_writer(proxy, keys)
    }
}

/// Setter wrapper: resolves the receiver's raw setter at call time and
/// surrounds it with change notifications
fn setter_wrapper(key: &str) -> HostMethod {
    let key = key.to_string();
    let role = MethodRole::KvcWrapper(key.clone());
    HostMethod::new(1, move |inv, args| {
        let bridge = inv.bridge();
        let (class, id) = {
            let object = inv.receiver();
            (object.class, object.id)
        };
        let raw = bridge
            .proxies()
            .find_setter_slots(class, &key)
            .map(|slots| slots.raw.clone())
            .ok_or_else(|| BridgeError::MethodNotFound {
                class: bridge
                    .proxies()
                    .get(class)
                    .map(|ty| ty.name.clone())
                    .unwrap_or_default(),
                method: setter_name(&key),
            })?;

        if !bridge.notifies_observers(class, &key) {
            return raw.call(&setter_name(&key), inv, args);
        }
        inv.runtime().will_change_value(id, &key);
        let result = raw.call(&setter_name(&key), inv, args)?;
        inv.runtime().did_change_value(id, &key);
        Ok(result)
    })
    .with_role(role)
}

fn array_count(key: &str) -> HostMethod {
    let key = key.to_string();
    HostMethod::new(0, move |inv, _| {
        let len = array_field(inv.receiver(), &key)?.len();
        Ok(Value::Int(len as i64))
    })
}

fn array_get(key: &str) -> HostMethod {
    let key = key.to_string();
    HostMethod::new(1, move |inv, args| {
        let index = index_arg(&args[0])?;
        let items = array_field(inv.receiver(), &key)?;
        check_index(&key, index, items.len())?;
        Ok(items[index].clone())
    })
}

fn array_insert(key: &str) -> HostMethod {
    let key = key.to_string();
    HostMethod::new(2, move |inv, args| {
        let item = args[0].clone();
        let index = index_arg(&args[1])?;
        let len = array_field(inv.receiver(), &key)?.len();
        // inserting at the end is allowed
        check_index(&key, index, len + 1)?;
        notify_indexed(inv, &key, ChangeKind::Insertion, index, |items| {
            items.insert(index, item)
        })?;
        Ok(Value::Nil)
    })
}

fn array_remove(key: &str) -> HostMethod {
    let key = key.to_string();
    HostMethod::new(1, move |inv, args| {
        let index = index_arg(&args[0])?;
        let len = array_field(inv.receiver(), &key)?.len();
        check_index(&key, index, len)?;
        notify_indexed(inv, &key, ChangeKind::Removal, index, |items| {
            items.remove(index);
        })?;
        Ok(Value::Nil)
    })
}

fn array_replace(key: &str) -> HostMethod {
    let key = key.to_string();
    HostMethod::new(2, move |inv, args| {
        let index = index_arg(&args[0])?;
        let item = args[1].clone();
        let len = array_field(inv.receiver(), &key)?.len();
        check_index(&key, index, len)?;
        notify_indexed(inv, &key, ChangeKind::Replacement, index, |items| {
            items[index] = item
        })?;
        Ok(Value::Nil)
    })
}
