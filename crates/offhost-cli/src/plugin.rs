use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap_host::{ClapInstance, ClapLibrary, ClapPluginDescriptor};
use tracing::info;

/// Loads the library at `path` and lists the plug-ins it exports.
pub fn open_library(path: &Path) -> Result<Arc<ClapLibrary>> {
    let library = unsafe { ClapLibrary::load(path) }
        .with_context(|| format!("invalid plugin identifier: {}", path.display()))?;
    Ok(Arc::new(library))
}

/// Creates the plug-in `plugin_id` from the library at `path`, or the first
/// plug-in when no id is given.
pub fn load_plugin(path: &Path, plugin_id: Option<&str>) -> Result<ClapInstance> {
    let library = open_library(path)?;
    let descriptors = library.plugins()?;
    let descriptor = select_plugin(&descriptors, plugin_id)?.clone();
    let instance = unsafe { ClapInstance::create(library, &descriptor) }
        .with_context(|| format!("error creating plugin instance of {}", descriptor.id))?;
    info!(id = %descriptor.id, name = %descriptor.name, "created plugin instance");
    Ok(instance)
}

pub fn select_plugin<'a>(
    descriptors: &'a [ClapPluginDescriptor],
    plugin_id: Option<&str>,
) -> Result<&'a ClapPluginDescriptor> {
    match plugin_id {
        None => descriptors
            .first()
            .context("plugin library does not contain any plugins"),
        Some(id) => match descriptors.iter().find(|descriptor| descriptor.id == id) {
            Some(descriptor) => Ok(descriptor),
            None => {
                let available: Vec<_> = descriptors.iter().map(|d| d.id.as_str()).collect();
                bail!(
                    "no plugin with id '{id}' in library (available: {})",
                    available.join(", ")
                )
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str) -> ClapPluginDescriptor {
        ClapPluginDescriptor {
            id: id.into(),
            name: id.into(),
            vendor: "Test".into(),
            version: "1.0".into(),
        }
    }

    #[test]
    fn first_plugin_is_the_default() {
        let descriptors = [descriptor("com.test.a"), descriptor("com.test.b")];
        assert_eq!(select_plugin(&descriptors, None).unwrap().id, "com.test.a");
        assert_eq!(
            select_plugin(&descriptors, Some("com.test.b")).unwrap().id,
            "com.test.b"
        );
    }

    #[test]
    fn unknown_ids_list_the_alternatives() {
        let descriptors = [descriptor("com.test.a")];
        let error = select_plugin(&descriptors, Some("com.test.z")).unwrap_err();
        assert!(error.to_string().contains("available: com.test.a"));
        assert!(select_plugin(&[], None).is_err());
    }
}
