//! Bridge configuration (search paths and naming conventions)
//!
//! Defaults mirror the standard macOS layout. A config can also be read from
//! TOML; every field is optional there and falls back to the default.
//!
//! ```toml
//! extra_framework_paths = ["/opt/frameworks"]
//! app_signature_paths = ["/Applications/App.app/Contents/Resources/BridgeSupport"]
//!
//! [quick_frameworks]
//! Private = "/opt/umbrella.framework/Frameworks/Private.framework"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, BridgeResult};

/// Environment variable holding colon-separated override signature paths
pub const BRIDGE_SUPPORT_PATH_ENV: &str = "BRIDGE_SUPPORT_PATH";

/// Search paths and conventions used by the resolver and loaders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// System and site framework directories, searched in order
    pub framework_paths: Vec<PathBuf>,

    /// Framework directories supplied by the embedder, searched after
    /// `framework_paths`
    pub extra_framework_paths: Vec<PathBuf>,

    /// Per-user framework directory, searched last
    pub user_framework_path: Option<PathBuf>,

    /// Signature directories consulted before anything else
    pub pre_signature_paths: Vec<PathBuf>,

    /// Application and bridge-runtime signature directories
    pub app_signature_paths: Vec<PathBuf>,

    /// General signature directories, searched last
    pub signature_paths: Vec<PathBuf>,

    /// Frameworks nested inside umbrella frameworks, by name
    pub quick_frameworks: BTreeMap<String, PathBuf>,

    /// Bundle extension without the dot
    pub bundle_extension: String,

    /// Signature directory inside a bundle
    pub signature_subdir: PathBuf,

    /// Embedded framework directory inside a bundle
    pub embedded_subdir: PathBuf,

    /// Bundles linked into the process at build time
    pub linked_bundle_identifiers: Vec<String>,

    /// Frameworks whose metadata is loaded at bootstrap
    pub foundation_frameworks: Vec<String>,

    /// Name of the foreign proxy root class
    pub proxy_root_class: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut quick_frameworks = BTreeMap::new();
        quick_frameworks.insert(
            "CoreGraphics".to_string(),
            PathBuf::from(
                "/System/Library/Frameworks/ApplicationServices.framework/Frameworks/CoreGraphics.framework",
            ),
        );
        quick_frameworks.insert(
            "PDFKit".to_string(),
            PathBuf::from("/System/Library/Frameworks/Quartz.framework/Frameworks/PDFKit.framework"),
        );
        quick_frameworks.insert(
            "QuartzComposer".to_string(),
            PathBuf::from(
                "/System/Library/Frameworks/Quartz.framework/Frameworks/QuartzComposer.framework",
            ),
        );
        quick_frameworks.insert(
            "ImageKit".to_string(),
            PathBuf::from("/System/Library/Frameworks/Quartz.framework/Frameworks/ImageKit.framework"),
        );

        Self {
            framework_paths: vec![
                PathBuf::from("/System/Library/Frameworks"),
                PathBuf::from("/Library/Frameworks"),
            ],
            extra_framework_paths: Vec::new(),
            user_framework_path: None,
            pre_signature_paths: Vec::new(),
            app_signature_paths: Vec::new(),
            signature_paths: vec![
                PathBuf::from("/System/Library/BridgeSupport"),
                PathBuf::from("/Library/BridgeSupport"),
            ],
            quick_frameworks,
            bundle_extension: "framework".to_string(),
            signature_subdir: PathBuf::from("Resources").join("BridgeSupport"),
            embedded_subdir: PathBuf::from("Frameworks"),
            linked_bundle_identifiers: vec![
                "com.apple.CoreFoundation".to_string(),
                "com.apple.Foundation".to_string(),
            ],
            foundation_frameworks: vec!["CoreFoundation".to_string(), "Foundation".to_string()],
            proxy_root_class: "NSProxy".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Build the default config from the process environment.
    ///
    /// Adds `~/Library/Frameworks` and `~/Library/BridgeSupport` when a home
    /// directory is known, and reads override signature paths from
    /// `BRIDGE_SUPPORT_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            config.apply_home(&home);
        }

        if let Ok(paths) = std::env::var(BRIDGE_SUPPORT_PATH_ENV) {
            config.pre_signature_paths = split_path_list(&paths);
        }

        config
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> BridgeResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a config from a TOML file
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BridgeError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set per-user framework and signature directories under `home`
    pub fn apply_home(&mut self, home: &Path) {
        let library = home.join("Library");
        self.user_framework_path = Some(library.join("Frameworks"));

        let user_signatures = library.join("BridgeSupport");
        if !self.signature_paths.contains(&user_signatures) {
            self.signature_paths.push(user_signatures);
        }
    }

    /// All framework directories in search order
    pub fn framework_search_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.framework_paths
            .iter()
            .chain(self.extra_framework_paths.iter())
            .chain(self.user_framework_path.iter())
    }

    /// File name of a bundle, e.g. `Foundation.framework`
    pub fn bundle_file_name(&self, name: &str) -> String {
        format!("{}.{}", name, self.bundle_extension)
    }
}

/// Split a colon-separated path list, dropping empty entries
pub fn split_path_list(list: &str) -> Vec<PathBuf> {
    list.split(':')
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}
