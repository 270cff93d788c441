use std::ffi::{c_char, CStr, CString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap_sys::entry::clap_plugin_entry;
use clap_sys::factory::plugin_factory::{clap_plugin_factory, CLAP_PLUGIN_FACTORY_ID};
use libloading::Library;

/// Represents a dynamically loaded CLAP library.
pub struct ClapLibrary {
    path: PathBuf,
    entry: *const clap_plugin_entry,
    initialized: bool,
    _lib: Library,
}

unsafe impl Send for ClapLibrary {}
unsafe impl Sync for ClapLibrary {}

impl ClapLibrary {
    /// Loads the library at `path` and initializes its entry point.
    ///
    /// # Safety
    /// Loading a library runs arbitrary initialization code from it.
    pub unsafe fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let binary = bundle_binary(&path_buf);
        let lib = Library::new(&binary)
            .with_context(|| format!("Failed to load CLAP library: {}", binary.display()))?;
        let entry_sym: libloading::Symbol<*const clap_plugin_entry> =
            lib.get(b"clap_entry\0").with_context(|| {
                format!("CLAP library missing entry symbol: {}", binary.display())
            })?;
        let entry = *entry_sym;
        if entry.is_null() {
            anyhow::bail!("CLAP library {} has null entry", binary.display());
        }

        let mut initialized = false;
        if let Some(init) = (*entry).init {
            let c_path = CString::new(path_buf.to_string_lossy().as_bytes())
                .context("CLAP library path contains a NUL byte")?;
            initialized = init(c_path.as_ptr());
            if !initialized {
                anyhow::bail!("CLAP entry init failed for {}", path_buf.display());
            }
        }
        log::debug!("loaded CLAP library {}", path_buf.display());

        Ok(Self {
            path: path_buf,
            entry,
            initialized,
            _lib: lib,
        })
    }

    pub fn factory(&self) -> Result<&clap_plugin_factory> {
        let get_factory = unsafe { (*self.entry).get_factory }
            .ok_or_else(|| anyhow::anyhow!("get_factory missing"))?;
        let ptr = unsafe { get_factory(CLAP_PLUGIN_FACTORY_ID.as_ptr()) } as *const clap_plugin_factory;
        if ptr.is_null() {
            anyhow::bail!("CLAP library {} returned null factory", self.path.display());
        }
        Ok(unsafe { &*ptr })
    }

    /// Lists the plug-ins exported by this library.
    pub fn plugins(&self) -> Result<Vec<ClapPluginDescriptor>> {
        Ok(PluginDiscovery::new(self.factory()?).list())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ClapLibrary {
    fn drop(&mut self) {
        unsafe {
            if self.initialized {
                if let Some(deinit) = (*self.entry).deinit {
                    deinit();
                }
            }
        }
    }
}

/// On macOS a `.clap` is a bundle directory with the binary inside it.
fn bundle_binary(path: &Path) -> PathBuf {
    if cfg!(target_os = "macos") && path.is_dir() {
        if let Some(stem) = path.file_stem() {
            return path.join("Contents").join("MacOS").join(stem);
        }
    }
    path.to_path_buf()
}

/// Lightweight description of a plug-in discovered in a CLAP library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClapPluginDescriptor {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: String,
}

pub struct PluginDiscovery<'a> {
    factory: &'a clap_plugin_factory,
}

impl<'a> PluginDiscovery<'a> {
    pub fn new(factory: &'a clap_plugin_factory) -> Self {
        Self { factory }
    }

    pub fn list(self) -> Vec<ClapPluginDescriptor> {
        let Some(get_plugin_count) = self.factory.get_plugin_count else {
            return Vec::new();
        };
        let Some(get_plugin_descriptor) = self.factory.get_plugin_descriptor else {
            return Vec::new();
        };
        let count = unsafe { get_plugin_count(self.factory) };
        let mut plugins = Vec::with_capacity(count as usize);
        for index in 0..count {
            unsafe {
                let descriptor = get_plugin_descriptor(self.factory, index);
                if descriptor.is_null() {
                    continue;
                }
                let descriptor = &*descriptor;
                plugins.push(ClapPluginDescriptor {
                    id: c_string(descriptor.id),
                    name: c_string(descriptor.name),
                    vendor: c_string(descriptor.vendor),
                    version: c_string(descriptor.version),
                });
            }
        }
        plugins
    }
}

/// Copies a nullable C string, replacing invalid UTF-8.
pub(crate) unsafe fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}
