//! Raya Objective-C Bridge
//!
//! This crate lets Raya code address an Objective-C style object runtime:
//! - **Loading**: framework resolution, bundle loading and BridgeSupport
//!   signature metadata (`resolver`, `loader`, `signatures` modules)
//! - **Import**: proxy types mirroring the foreign class hierarchy
//!   (`importer`, `proxy` modules)
//! - **Methods**: selector derivation, type encodings and override export
//!   (`selector`, `encoding`, `overrides` modules)
//! - **Key-value coding**: generic property access and generated,
//!   notification-aware accessors (`kvc` module)
//!
//! The runtime itself is reached through the [`ForeignRuntime`] trait;
//! message sending and value marshalling live behind it.
//!
//! # Example
//!
//! ```rust,ignore
//! use raya_objc::{Bridge, BridgeConfig, HostMethod, MethodKind, Value};
//!
//! let mut bridge = Bridge::bootstrap(BridgeConfig::from_env(), runtime);
//! bridge.require_framework("AppKit")?;
//!
//! let view = bridge.require_class("NSView")?;
//! let my_view = bridge.define_subclass("MyView", view)?;
//! bridge.define_method(
//!     my_view,
//!     "drawRect",
//!     MethodKind::Instance,
//!     HostMethod::new(1, |_, _| Ok(Value::Nil)),
//! )?;
//! bridge.kvc_accessor(my_view, &["title"])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Bridge context and dispatch
pub mod bridge;

/// Bridge configuration and search paths
pub mod config;

/// Error types
pub mod error;

/// Foreign runtime interface
pub mod runtime;

/// Host values and objects
pub mod value;

// ============================================================================
// Loading
// ============================================================================

/// Framework name resolution
pub mod resolver;

/// Signature metadata loading
pub mod signatures;

/// Framework loading and module table
pub mod loader;

// ============================================================================
// Classes and Methods
// ============================================================================

/// Class import and host subclassing
pub mod importer;

/// Proxy type arena
pub mod proxy;

/// Host methods and invocations
pub mod method;

/// Selector derivation
pub mod selector;

/// Type encodings
pub mod encoding;

/// Override interception and explicit exports
pub mod overrides;

/// Key-value coding
pub mod kvc;

// ============================================================================
// Re-exports
// ============================================================================

pub use bridge::{Bridge, Constant};
pub use config::{BridgeConfig, BRIDGE_SUPPORT_PATH_ENV};
pub use encoding::{takes_no_arguments, BoxedType, TypeArg, TypeEncoder, TypeSpec};
pub use error::{BridgeError, BridgeResult};
pub use importer::{CocoaNaming, Imported, NamingPolicy};
pub use kvc::{NotificationPolicy, SetterSlots};
pub use loader::{LoadState, Module};
pub use method::{HostMethod, Invocation, MethodRole};
pub use proxy::{ProxyId, ProxyKind, ProxyRegistry, ProxyType, RootKind, OBJECT_ROOT, PROXY_ROOT};
pub use resolver::{FrameworkResolver, ResolvedFramework};
pub use runtime::{
    ChangeKind, ForeignClass, ForeignRuntime, MethodExport, MethodKind, ObjectId, Receiver,
};
pub use selector::{selector_arity, selector_for_export, selector_for_method};
pub use signatures::SignatureLoader;
pub use value::{HostObject, Value};
