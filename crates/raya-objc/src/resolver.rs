//! Framework path resolution
//!
//! Turns a framework name, shortcut or absolute path into a bundle location.
//! Resolution order:
//!
//! 1. An absolute path is used as-is.
//! 2. The quick-framework alias table (frameworks nested in umbrellas).
//! 3. `<dir>/<name>.<ext>` for each framework search directory; the first
//!    existing path wins.

use std::path::{Path, PathBuf};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};

/// A framework located on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFramework {
    /// Canonical framework name (no directory, no extension)
    pub name: String,
    /// Bundle location
    pub path: PathBuf,
}

/// Framework resolver over a bridge config
pub struct FrameworkResolver<'a> {
    config: &'a BridgeConfig,
}

impl<'a> FrameworkResolver<'a> {
    /// Create a resolver
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self { config }
    }

    /// Resolve a framework name or path, `None` when nothing matches
    pub fn resolve(&self, framework: &str) -> Option<ResolvedFramework> {
        if is_bundle_path(framework) {
            return Some(ResolvedFramework {
                name: self.framework_name(framework),
                path: PathBuf::from(framework),
            });
        }

        if let Some(path) = self.config.quick_frameworks.get(framework) {
            return Some(ResolvedFramework {
                name: framework.to_string(),
                path: path.clone(),
            });
        }

        self.candidates(framework)
            .find(|path| path.exists())
            .map(|path| ResolvedFramework {
                name: framework.to_string(),
                path,
            })
    }

    /// Resolve a framework, failing with `FrameworkNotFound`
    pub fn require(&self, framework: &str) -> BridgeResult<ResolvedFramework> {
        self.resolve(framework)
            .ok_or_else(|| BridgeError::FrameworkNotFound(framework.to_string()))
    }

    /// Candidate bundle paths for a framework name, in search order.
    ///
    /// Existence is not checked.
    pub fn candidates<'s>(&'s self, name: &'s str) -> impl Iterator<Item = PathBuf> + 's {
        let file_name = self.config.bundle_file_name(name);
        self.config
            .framework_search_paths()
            .map(move |dir| dir.join(&file_name))
    }

    /// Canonical name of a framework name or bundle path.
    ///
    /// `/System/Library/Frameworks/WebKit.framework` gives `WebKit`; a plain
    /// name is returned unchanged.
    pub fn framework_name(&self, framework: &str) -> String {
        if !is_bundle_path(framework) {
            return framework.to_string();
        }

        let path = Path::new(framework);
        let stem = match path.extension() {
            Some(ext) if ext == self.config.bundle_extension.as_str() => path.file_stem(),
            _ => path.file_name(),
        };
        stem.map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| framework.to_string())
    }
}

/// Check if the argument names a bundle by absolute path
pub fn is_bundle_path(framework: &str) -> bool {
    Path::new(framework).is_absolute()
}
