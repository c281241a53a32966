//! Recording in-memory foreign runtime shared by the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use raya_objc::{
    Bridge, BridgeConfig, BridgeError, BridgeResult, ChangeKind, ForeignClass, ForeignRuntime,
    MethodExport, MethodKind, ObjectId, Receiver, Value,
};

/// A change notification observed by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Will(ObjectId, String),
    Did(ObjectId, String),
    WillIndexed(ObjectId, ChangeKind, Vec<usize>, String),
    DidIndexed(ObjectId, ChangeKind, Vec<usize>, String),
}

#[derive(Debug, Clone)]
struct MockClass {
    name: String,
    superclass: Option<ForeignClass>,
}

#[derive(Default)]
struct State {
    classes: Vec<MockClass>,
    bundles_loaded: FxHashSet<PathBuf>,
    bundles_loadable: FxHashSet<PathBuf>,
    bundle_ids: FxHashMap<PathBuf, String>,
    bundle_loads: Vec<PathBuf>,
    signature_files: Vec<PathBuf>,
    signature_libraries: Vec<PathBuf>,
    constants: FxHashMap<String, Value>,
    method_types: FxHashMap<(ForeignClass, String, MethodKind), String>,
    informal: FxHashMap<(String, MethodKind), String>,
    added: Vec<MethodExport>,
    auto_notify: FxHashMap<String, bool>,
    notifications: Vec<Notification>,
    sent: Vec<(Receiver, String, Vec<Value>)>,
    responses: FxHashMap<String, Value>,
    bound: Vec<ForeignClass>,
    debug: bool,
}

/// In-memory runtime recording every call the bridge makes
#[derive(Default)]
pub struct MockRuntime {
    state: Mutex<State>,
}

impl MockRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Runtime with a tiny Foundation: `NSObject`, `NSProxy` and a few
    /// subclasses
    pub fn foundation() -> Arc<Self> {
        let runtime = Self::new();
        runtime.add_class("NSObject", None);
        runtime.add_class("NSProxy", None);
        runtime.add_class("NSString", Some("NSObject"));
        runtime.add_class("NSArray", Some("NSObject"));
        runtime
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    pub fn add_class(&self, name: &str, superclass: Option<&str>) -> ForeignClass {
        let mut state = self.state.lock();
        let superclass = superclass.map(|s| {
            let index = state
                .classes
                .iter()
                .position(|c| c.name == s)
                .unwrap_or_else(|| panic!("unknown superclass {}", s));
            ForeignClass(index as u64)
        });
        state.classes.push(MockClass {
            name: name.to_string(),
            superclass,
        });
        ForeignClass(state.classes.len() as u64 - 1)
    }

    /// Make a class its own superclass
    pub fn make_self_rooted(&self, name: &str) {
        let class = self.class(name);
        self.state.lock().classes[class.0 as usize].superclass = Some(class);
    }

    pub fn class(&self, name: &str) -> ForeignClass {
        self.class_by_name(name)
            .unwrap_or_else(|| panic!("unknown class {}", name))
    }

    pub fn set_method_type(&self, class: &str, selector: &str, kind: MethodKind, encoding: &str) {
        let class = self.class(class);
        self.state
            .lock()
            .method_types
            .insert((class, selector.to_string(), kind), encoding.to_string());
    }

    pub fn set_informal(&self, selector: &str, kind: MethodKind, encoding: &str) {
        self.state
            .lock()
            .informal
            .insert((selector.to_string(), kind), encoding.to_string());
    }

    pub fn set_auto_notify(&self, key: &str, notify: bool) {
        self.state.lock().auto_notify.insert(key.to_string(), notify);
    }

    pub fn set_constant(&self, name: &str, value: Value) {
        self.state.lock().constants.insert(name.to_string(), value);
    }

    pub fn set_response(&self, selector: &str, value: Value) {
        self.state.lock().responses.insert(selector.to_string(), value);
    }

    pub fn set_debug(&self, debug: bool) {
        self.state.lock().debug = debug;
    }

    /// Register a bundle that `load_bundle` can load
    pub fn add_bundle(&self, path: &Path, identifier: Option<&str>, loadable: bool) {
        let mut state = self.state.lock();
        if loadable {
            state.bundles_loadable.insert(path.to_path_buf());
        }
        if let Some(id) = identifier {
            state.bundle_ids.insert(path.to_path_buf(), id.to_string());
        }
    }

    /// Mark a bundle as loaded by other means
    pub fn preload_bundle(&self, path: &Path) {
        self.state.lock().bundles_loaded.insert(path.to_path_buf());
    }

    // ------------------------------------------------------------------
    // Probes
    // ------------------------------------------------------------------

    pub fn bundle_loads(&self) -> Vec<PathBuf> {
        self.state.lock().bundle_loads.clone()
    }

    pub fn signature_files(&self) -> Vec<PathBuf> {
        self.state.lock().signature_files.clone()
    }

    pub fn signature_libraries(&self) -> Vec<PathBuf> {
        self.state.lock().signature_libraries.clone()
    }

    pub fn added_methods(&self) -> Vec<MethodExport> {
        self.state.lock().added.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().notifications.clone()
    }

    pub fn clear_notifications(&self) {
        self.state.lock().notifications.clear();
    }

    pub fn sent(&self) -> Vec<(Receiver, String, Vec<Value>)> {
        self.state.lock().sent.clone()
    }

    pub fn bound(&self) -> Vec<ForeignClass> {
        self.state.lock().bound.clone()
    }
}

impl ForeignRuntime for MockRuntime {
    fn class_by_name(&self, name: &str) -> Option<ForeignClass> {
        self.state
            .lock()
            .classes
            .iter()
            .position(|c| c.name == name)
            .map(|i| ForeignClass(i as u64))
    }

    fn class_name(&self, class: ForeignClass) -> String {
        self.state.lock().classes[class.0 as usize].name.clone()
    }

    fn superclass(&self, class: ForeignClass) -> Option<ForeignClass> {
        self.state.lock().classes[class.0 as usize].superclass
    }

    fn class_names(&self) -> Vec<String> {
        self.state
            .lock()
            .classes
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn derived_class_new(&self, name: &str, superclass: &str) -> Option<ForeignClass> {
        if self.class_by_name(name).is_some() {
            return None;
        }
        self.class_by_name(superclass)?;
        Some(self.add_class(name, Some(superclass)))
    }

    fn bind_class_with_current_bundle(&self, class: ForeignClass) {
        self.state.lock().bound.push(class);
    }

    fn bundle_is_loaded(&self, path: &Path) -> bool {
        self.state.lock().bundles_loaded.contains(path)
    }

    fn load_bundle(&self, path: &Path) {
        let mut state = self.state.lock();
        state.bundle_loads.push(path.to_path_buf());
        if state.bundles_loadable.contains(path) {
            state.bundles_loaded.insert(path.to_path_buf());
        }
    }

    fn bundle_identifier(&self, path: &Path) -> Option<String> {
        self.state.lock().bundle_ids.get(path).cloned()
    }

    fn load_signature_file(&self, path: &Path) {
        self.state.lock().signature_files.push(path.to_path_buf());
    }

    fn load_signature_library(&self, path: &Path) {
        self.state.lock().signature_libraries.push(path.to_path_buf());
    }

    fn lookup_constant(&self, name: &str) -> Option<Value> {
        self.state.lock().constants.get(name).cloned()
    }

    fn method_type(&self, class: ForeignClass, selector: &str, kind: MethodKind) -> Option<String> {
        let state = self.state.lock();
        let mut seen = FxHashSet::default();
        let mut current = Some(class);
        while let Some(cur) = current {
            if !seen.insert(cur) {
                break;
            }
            if let Some(encoding) = state.method_types.get(&(cur, selector.to_string(), kind)) {
                return Some(encoding.clone());
            }
            current = state.classes[cur.0 as usize].superclass;
        }
        None
    }

    fn informal_protocol_method_type(&self, selector: &str, kind: MethodKind) -> Option<String> {
        self.state
            .lock()
            .informal
            .get(&(selector.to_string(), kind))
            .cloned()
    }

    fn add_method(&self, export: &MethodExport) -> BridgeResult<()> {
        let mut state = self.state.lock();
        if export.class.0 as usize >= state.classes.len() {
            return Err(BridgeError::Foreign(format!("no class {}", export.class)));
        }
        state.method_types.insert(
            (export.class, export.selector.clone(), export.kind),
            export.encoding.clone(),
        );
        state.added.push(export.clone());
        Ok(())
    }

    fn send_message(
        &self,
        receiver: Receiver,
        selector: &str,
        args: &[Value],
    ) -> BridgeResult<Value> {
        let mut state = self.state.lock();
        state
            .sent
            .push((receiver, selector.to_string(), args.to_vec()));
        Ok(state.responses.get(selector).cloned().unwrap_or_default())
    }

    fn automatically_notifies_observers(&self, _class: ForeignClass, key: &str) -> bool {
        self.state
            .lock()
            .auto_notify
            .get(key)
            .copied()
            .unwrap_or(true)
    }

    fn will_change_value(&self, object: ObjectId, key: &str) {
        self.state
            .lock()
            .notifications
            .push(Notification::Will(object, key.to_string()));
    }

    fn did_change_value(&self, object: ObjectId, key: &str) {
        self.state
            .lock()
            .notifications
            .push(Notification::Did(object, key.to_string()));
    }

    fn will_change_values_at_indexes(
        &self,
        object: ObjectId,
        change: ChangeKind,
        indexes: &[usize],
        key: &str,
    ) {
        self.state.lock().notifications.push(Notification::WillIndexed(
            object,
            change,
            indexes.to_vec(),
            key.to_string(),
        ));
    }

    fn did_change_values_at_indexes(
        &self,
        object: ObjectId,
        change: ChangeKind,
        indexes: &[usize],
        key: &str,
    ) {
        self.state.lock().notifications.push(Notification::DidIndexed(
            object,
            change,
            indexes.to_vec(),
            key.to_string(),
        ));
    }

    fn debug_enabled(&self) -> bool {
        self.state.lock().debug
    }
}

/// Config whose search paths all live under `root`
pub fn config_in(root: &Path) -> BridgeConfig {
    BridgeConfig {
        framework_paths: vec![root.join("Frameworks")],
        extra_framework_paths: Vec::new(),
        user_framework_path: None,
        pre_signature_paths: Vec::new(),
        app_signature_paths: Vec::new(),
        signature_paths: vec![root.join("BridgeSupport")],
        quick_frameworks: Default::default(),
        ..BridgeConfig::default()
    }
}

/// Bridge over a mock runtime with an empty filesystem layout
pub fn bridge_with(runtime: &Arc<MockRuntime>, root: &Path) -> Bridge {
    Bridge::new(config_in(root), runtime.clone())
}

/// Create `<root>/Frameworks/<name>.framework`, optionally with a signature
/// file in its `Resources/BridgeSupport`
pub fn make_framework(root: &Path, name: &str, with_signatures: bool) -> PathBuf {
    let bundle = root.join("Frameworks").join(format!("{}.framework", name));
    fs::create_dir_all(&bundle).unwrap();
    if with_signatures {
        write_signatures(&bundle.join("Resources").join("BridgeSupport"), name);
    }
    bundle
}

/// Write `<dir>/<name>.bridgesupport`
pub fn write_signatures(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let file = dir.join(format!("{}.bridgesupport", name));
    fs::write(&file, "<signatures version='1.0'/>").unwrap();
    file
}
