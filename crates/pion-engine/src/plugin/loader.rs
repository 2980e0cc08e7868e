//! Resolves plugin type names to live instances.

use crate::error::PluginError;
use libloading::Library;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Constructor entry point exported by a plugin library.
pub type CreateFn<B> = unsafe extern "C" fn() -> *mut B;

/// Destructor entry point exported by a plugin library.
pub type DestroyFn<B> = unsafe extern "C" fn(*mut B);

enum PluginHandle<B: ?Sized> {
    Static(Box<B>),
    Dynamic {
        raw: *mut B,
        destroy: DestroyFn<B>,
        /// Keeps the code mapped while the instance lives.
        _library: Arc<Library>,
    },
}

/// A live plugin of base contract `B`.
///
/// For dynamically loaded plugins the instance owns a reference to the
/// backing library; the library handle is shared, so the shared object
/// stays loaded until the last instance from it is destroyed, at which
/// point its `destroy_<Name>` entry point is invoked.
pub struct PluginInstance<B: ?Sized> {
    handle: PluginHandle<B>,
}

// The raw pointer is owned exclusively by this instance; thread safety
// reduces to the base contract's own bounds.
unsafe impl<B: ?Sized + Send> Send for PluginInstance<B> {}
unsafe impl<B: ?Sized + Sync> Sync for PluginInstance<B> {}

impl<B: ?Sized> std::fmt::Debug for PluginInstance<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance").finish_non_exhaustive()
    }
}

impl<B: ?Sized> Deref for PluginInstance<B> {
    type Target = B;

    fn deref(&self) -> &B {
        match &self.handle {
            PluginHandle::Static(plugin) => plugin.as_ref(),
            PluginHandle::Dynamic { raw, .. } => unsafe { &**raw },
        }
    }
}

impl<B: ?Sized> DerefMut for PluginInstance<B> {
    fn deref_mut(&mut self) -> &mut B {
        match &mut self.handle {
            PluginHandle::Static(plugin) => plugin.as_mut(),
            PluginHandle::Dynamic { raw, .. } => unsafe { &mut **raw },
        }
    }
}

impl<B: ?Sized> Drop for PluginInstance<B> {
    fn drop(&mut self) {
        if let PluginHandle::Dynamic { raw, destroy, .. } = &self.handle {
            unsafe { destroy(*raw) };
        }
    }
}

/// Resolves plugin type names to factory/destructor pairs.
///
/// Static factories take precedence; unresolved names fall through to a
/// library search over the configured path. Opened libraries are cached
/// weakly, so a shared object is reference-counted by its live
/// instances and unloaded when the last one drops.
pub struct PluginLoader<B: ?Sized> {
    search_path: RwLock<Vec<PathBuf>>,
    #[allow(clippy::type_complexity)]
    factories: RwLock<HashMap<String, Arc<dyn Fn() -> Box<B> + Send + Sync>>>,
    libraries: Mutex<HashMap<PathBuf, Weak<Library>>>,
}

impl<B: ?Sized> PluginLoader<B> {
    /// Creates a loader with an empty search path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            search_path: RwLock::new(Vec::new()),
            factories: RwLock::new(HashMap::new()),
            libraries: Mutex::new(HashMap::new()),
        }
    }

    /// Appends a directory to the library search path.
    pub fn add_search_path(&self, path: impl Into<PathBuf>) {
        self.search_path.write().push(path.into());
    }

    /// Registers an in-process factory for a plugin type.
    pub fn register_static<F>(&self, plugin: &str, factory: F)
    where
        F: Fn() -> Box<B> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(plugin.to_owned(), Arc::new(factory));
    }

    /// Returns whether a type name resolves without dynamic loading.
    #[must_use]
    pub fn has_static(&self, plugin: &str) -> bool {
        self.factories.read().contains_key(plugin)
    }

    /// Creates a plugin instance for a type name.
    ///
    /// # Errors
    ///
    /// `PLUGIN_NOT_FOUND` when neither a static factory nor a library
    /// matches, `PLUGIN_LIBRARY`/`PLUGIN_SYMBOL` when a library exists
    /// but cannot be used.
    pub fn create(&self, plugin: &str) -> Result<PluginInstance<B>, PluginError> {
        if let Some(factory) = self.factories.read().get(plugin).cloned() {
            return Ok(PluginInstance {
                handle: PluginHandle::Static(factory()),
            });
        }
        self.create_dynamic(plugin)
    }

    fn create_dynamic(&self, plugin: &str) -> Result<PluginInstance<B>, PluginError> {
        let path = self.locate(plugin).ok_or_else(|| PluginError::NotFound {
            plugin: plugin.to_owned(),
        })?;
        debug!(plugin, path = %path.display(), "loading plugin library");
        let library = self.open_library(plugin, path)?;

        let create_symbol = format!("create_{plugin}");
        let destroy_symbol = format!("destroy_{plugin}");
        let create: CreateFn<B> = unsafe {
            *library
                .get::<CreateFn<B>>(create_symbol.as_bytes())
                .map_err(|err| PluginError::Symbol {
                    symbol: create_symbol.clone(),
                    message: err.to_string(),
                })?
        };
        let destroy: DestroyFn<B> = unsafe {
            *library
                .get::<DestroyFn<B>>(destroy_symbol.as_bytes())
                .map_err(|err| PluginError::Symbol {
                    symbol: destroy_symbol.clone(),
                    message: err.to_string(),
                })?
        };

        let raw = unsafe { create() };
        if raw.is_null() {
            return Err(PluginError::Library {
                plugin: plugin.to_owned(),
                message: "factory returned null".into(),
            });
        }

        Ok(PluginInstance {
            handle: PluginHandle::Dynamic {
                raw,
                destroy,
                _library: library,
            },
        })
    }

    fn open_library(&self, plugin: &str, path: PathBuf) -> Result<Arc<Library>, PluginError> {
        let mut cache = self.libraries.lock();
        if let Some(live) = cache.get(&path).and_then(Weak::upgrade) {
            return Ok(live);
        }
        let library = unsafe { Library::new(&path) }.map_err(|err| PluginError::Library {
            plugin: plugin.to_owned(),
            message: err.to_string(),
        })?;
        let library = Arc::new(library);
        cache.insert(path, Arc::downgrade(&library));
        Ok(library)
    }

    fn locate(&self, plugin: &str) -> Option<PathBuf> {
        let candidates = [
            format!("{DLL_PREFIX}{plugin}{DLL_SUFFIX}"),
            format!("{plugin}{DLL_SUFFIX}"),
        ];
        for dir in self.search_path.read().iter() {
            for candidate in &candidates {
                let path = dir.join(candidate);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }
}

impl<B: ?Sized> Default for PluginLoader<B> {
    fn default() -> Self {
        Self::new()
    }
}
