//! Framework loading
//!
//! Resolves framework names to bundles, asks the foreign runtime to load
//! them, applies their signature metadata and imports the classes they
//! bring in. Each framework the bridge has seen is tracked in a module
//! table.

use log::debug;
use std::path::PathBuf;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::resolver::FrameworkResolver;

/// Load state of a framework module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Resolved but not loaded by the bridge
    Unloaded,
    /// Loaded, or linked into the process
    Loaded,
    /// The runtime failed to load the bundle
    LoadFailed,
}

/// A framework the bridge has resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Name as requested
    pub name: String,
    /// Resolved bundle path
    pub path: PathBuf,
    /// Current load state
    pub state: LoadState,
}

impl Bridge {
    /// Load a framework by name or absolute bundle path.
    ///
    /// Returns `Ok(false)` if the framework was already loaded, `Ok(true)`
    /// after a fresh load. A fresh load applies the framework's signatures
    /// and imports every newly visible class.
    pub fn require_framework(&mut self, framework: &str) -> BridgeResult<bool> {
        if self.is_framework_loaded(framework)? {
            return Ok(false);
        }

        let resolved = FrameworkResolver::new(self.config()).require(framework)?;
        debug!("loading {} from {}", framework, resolved.path.display());
        self.runtime().load_bundle(&resolved.path);

        if !self.runtime().bundle_is_loaded(&resolved.path) {
            self.record_module(framework, resolved.path, LoadState::LoadFailed);
            return Err(BridgeError::FrameworkLoadFailed(framework.to_string()));
        }

        let path = resolved.path.to_string_lossy().into_owned();
        self.record_module(framework, resolved.path, LoadState::Loaded);
        self.load_signatures(&path);
        self.import_all();
        Ok(true)
    }

    /// Check whether a framework is loaded.
    ///
    /// A bundle the runtime reports as loaded gets its signatures applied
    /// on the way. Frameworks linked into every process count as loaded.
    /// Fails if the framework cannot be found at all.
    pub fn is_framework_loaded(&mut self, framework: &str) -> BridgeResult<bool> {
        let resolved = FrameworkResolver::new(self.config()).require(framework)?;

        if self.runtime().bundle_is_loaded(&resolved.path) {
            let path = resolved.path.to_string_lossy().into_owned();
            self.load_signatures(&path);
            self.record_module(framework, resolved.path, LoadState::Loaded);
            return Ok(true);
        }

        let linked = self
            .runtime()
            .bundle_identifier(&resolved.path)
            .is_some_and(|id| self.config().linked_bundle_identifiers.contains(&id));
        let state = if linked {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        };
        self.record_module(framework, resolved.path, state);
        Ok(linked)
    }

    /// Apply signature metadata for a framework name or bundle path.
    ///
    /// Returns `false` when no metadata was found; that is not an error.
    pub fn load_signatures(&mut self, framework: &str) -> bool {
        let (config, runtime, signatures) = self.signature_parts();
        signatures.load(config, runtime, framework)
    }

    /// Module table entry of a framework
    pub fn module(&self, framework: &str) -> Option<&Module> {
        self.modules().get(framework)
    }

    fn record_module(&mut self, framework: &str, path: PathBuf, state: LoadState) {
        let module = self
            .modules_mut()
            .entry(framework.to_string())
            .or_insert_with(|| Module {
                name: framework.to_string(),
                path: path.clone(),
                state,
            });
        // a failed load never downgrades a framework already loaded
        if module.state != LoadState::Loaded {
            module.state = state;
        }
        module.path = path;
    }
}
