//! Signature (BridgeSupport metadata) loading
//!
//! Finds the metadata files of a framework and hands them to the foreign
//! runtime, at most once per framework name per bridge.
//!
//! Directory search order, first hit wins:
//!
//! 1. override directories (`BRIDGE_SUPPORT_PATH`)
//! 2. `<bundle>/Resources/BridgeSupport` when given a bundle path
//! 3. the same subdirectory of the framework found by name in each
//!    framework search directory
//! 4. application and bridge-runtime metadata directories
//! 5. general metadata directories
//!
//! A hit at step 2 or 3 also loads every framework embedded under the
//! bundle's `Frameworks/` directory.

use log::{debug, trace, warn};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

use crate::config::BridgeConfig;
use crate::resolver::{is_bundle_path, FrameworkResolver};
use crate::runtime::ForeignRuntime;

/// Extension of signature files
pub const SIGNATURE_EXTENSION: &str = "bridgesupport";

/// Loads signature files and remembers which frameworks are done.
///
/// Marks are never cleared: a framework's metadata does not change during
/// the life of the process.
#[derive(Debug, Default)]
pub struct SignatureLoader {
    marks: FxHashSet<String>,
}

impl SignatureLoader {
    /// Create a loader with no frameworks marked
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether metadata for `name` was already applied
    pub fn is_loaded(&self, name: &str) -> bool {
        self.marks.contains(name)
    }

    /// Number of frameworks whose metadata was applied
    pub fn loaded_count(&self) -> usize {
        self.marks.len()
    }

    /// Load the signatures of a framework given by name or bundle path.
    ///
    /// Returns `true` if a signature file was found (now or earlier) and
    /// `false` if no directory had one. Absence is not an error.
    pub fn load(
        &mut self,
        config: &BridgeConfig,
        runtime: &dyn ForeignRuntime,
        framework: &str,
    ) -> bool {
        let resolver = FrameworkResolver::new(config);
        let name = resolver.framework_name(framework);

        if self.is_loaded(&name) {
            return true;
        }

        for dir in &config.pre_signature_paths {
            if self.load_from_dir(runtime, dir, &name) {
                return true;
            }
        }

        if is_bundle_path(framework) {
            let bundle = Path::new(framework);
            if self.load_from_dir(runtime, &bundle.join(&config.signature_subdir), &name) {
                self.load_embedded(config, runtime, bundle);
                return true;
            }
        }

        let candidates: Vec<PathBuf> = resolver.candidates(&name).collect();
        for bundle in candidates {
            if !bundle.exists() {
                continue;
            }
            if self.load_from_dir(runtime, &bundle.join(&config.signature_subdir), &name) {
                self.load_embedded(config, runtime, &bundle);
                return true;
            }
        }

        for dir in &config.app_signature_paths {
            if dir.exists() && self.load_from_dir(runtime, dir, &name) {
                return true;
            }
        }

        for dir in &config.signature_paths {
            if self.load_from_dir(runtime, dir, &name) {
                return true;
            }
        }

        if runtime.debug_enabled() {
            warn!("Can't find signatures file for {}", name);
        } else {
            debug!("Can't find signatures file for {}", name);
        }
        false
    }

    /// Apply `<name>.bridgesupport` and friends from one directory.
    ///
    /// Load order is companion library, regular file, then private file.
    fn load_from_dir(&mut self, runtime: &dyn ForeignRuntime, dir: &Path, name: &str) -> bool {
        if self.is_loaded(name) {
            return true;
        }

        let regular = dir.join(format!("{}.{}", name, SIGNATURE_EXTENSION));
        let private = dir.join(format!("{}Private.{}", name, SIGNATURE_EXTENSION));
        trace!("probing signatures for {} in {}", name, dir.display());

        if !regular.exists() && !private.exists() {
            return false;
        }

        let library = dir.join(format!("{}.dylib", name));
        if library.exists() {
            runtime.load_signature_library(&library);
        }
        if regular.exists() {
            runtime.load_signature_file(&regular);
        }
        if private.exists() {
            runtime.load_signature_file(&private);
        }

        debug!("loaded signatures for {} from {}", name, dir.display());
        self.marks.insert(name.to_string());
        true
    }

    /// Load signatures of every framework embedded in `bundle`
    fn load_embedded(&mut self, config: &BridgeConfig, runtime: &dyn ForeignRuntime, bundle: &Path) {
        let embedded = bundle.join(&config.embedded_subdir);
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&embedded.to_string_lossy()),
            config.bundle_extension
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("bad embedded framework pattern {}: {}", pattern, e);
                return;
            }
        };

        for sub in entries.flatten() {
            let sub = sub.to_string_lossy().into_owned();
            self.load(config, runtime, &sub);
        }
    }
}
