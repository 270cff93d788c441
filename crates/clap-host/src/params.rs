use std::ffi::{c_char, CStr, CString};

use clap_sys::ext::params::{clap_param_info, clap_plugin_params, CLAP_PARAM_IS_STEPPED};
use clap_sys::id::clap_id;
use clap_sys::plugin::clap_plugin;
use offhost_automation::Parameter;

/// Step count reported for continuous parameters.
pub const CONTINUOUS_STEPS: u32 = 0x7fff_ffff;

const TEXT_CAPACITY: usize = 256;

/// Cached description of a CLAP parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamInfo {
    pub id: clap_id,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub stepped: bool,
}

impl ParamInfo {
    fn from_raw(raw: &clap_param_info) -> Self {
        let name = unsafe { CStr::from_ptr(raw.name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        Self {
            id: raw.id,
            name,
            min: raw.min_value,
            max: raw.max_value,
            default: raw.default_value,
            stepped: raw.flags & CLAP_PARAM_IS_STEPPED != 0,
        }
    }

    pub fn num_steps(&self) -> u32 {
        if self.stepped {
            ((self.max - self.min).round() as u32).saturating_add(1)
        } else {
            CONTINUOUS_STEPS
        }
    }

    /// Maps a plain value into `[0, 1]`. Values outside the parameter's
    /// range map outside as well.
    pub fn normalize(&self, plain: f64) -> f32 {
        let range = self.max - self.min;
        if range <= 0.0 {
            return 0.0;
        }
        ((plain - self.min) / range) as f32
    }

    /// Maps a normalized value to the parameter's plain range, snapping
    /// stepped parameters to the nearest step.
    pub fn denormalize(&self, normalized: f32) -> f64 {
        let plain = self.min + (self.max - self.min) * f64::from(normalized.clamp(0.0, 1.0));
        if self.stepped {
            plain.round()
        } else {
            plain
        }
    }
}

/// A parameter of a live [`ClapInstance`](crate::ClapInstance).
///
/// Writes are buffered and reach the plug-in as parameter events on the
/// next processed block.
pub struct ClapParameter {
    info: ParamInfo,
    pending: Option<f64>,
    plugin: *const clap_plugin,
    ext: *const clap_plugin_params,
}

impl ClapParameter {
    /// Reads every parameter the plug-in exposes.
    ///
    /// # Safety
    /// `plugin` must be an initialized instance and `ext` its params
    /// extension, both outliving the returned parameters.
    pub(crate) unsafe fn query_all(
        plugin: *const clap_plugin,
        ext: *const clap_plugin_params,
    ) -> Vec<Self> {
        let Some(ext_ref) = ext.as_ref() else {
            return Vec::new();
        };
        let (Some(count), Some(get_info)) = (ext_ref.count, ext_ref.get_info) else {
            return Vec::new();
        };

        let total = count(plugin);
        let mut params = Vec::with_capacity(total as usize);
        for index in 0..total {
            let mut raw: clap_param_info = std::mem::zeroed();
            if !get_info(plugin, index, &mut raw) {
                log::warn!("plug-in did not describe parameter {index}");
                continue;
            }
            params.push(Self {
                info: ParamInfo::from_raw(&raw),
                pending: None,
                plugin,
                ext,
            });
        }
        params
    }

    #[cfg(test)]
    pub(crate) fn detached(info: ParamInfo) -> Self {
        Self {
            info,
            pending: None,
            plugin: std::ptr::null(),
            ext: std::ptr::null(),
        }
    }

    pub fn info(&self) -> &ParamInfo {
        &self.info
    }

    pub fn id(&self) -> clap_id {
        self.info.id
    }

    pub fn default_normalized(&self) -> f32 {
        self.info.normalize(self.info.default)
    }

    pub(crate) fn take_pending(&mut self) -> Option<f64> {
        self.pending.take()
    }

    fn params(&self) -> Option<&clap_plugin_params> {
        unsafe { self.ext.as_ref() }
    }
}

impl Parameter for ClapParameter {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn num_steps(&self) -> u32 {
        self.info.num_steps()
    }

    fn text_for_value(&self, normalized: f32) -> Option<String> {
        let value_to_text = self.params()?.value_to_text?;
        let mut buffer = [0 as c_char; TEXT_CAPACITY];
        let ok = unsafe {
            value_to_text(
                self.plugin,
                self.info.id,
                self.info.denormalize(normalized),
                buffer.as_mut_ptr(),
                TEXT_CAPACITY as u32,
            )
        };
        if !ok {
            return None;
        }
        // Some plug-ins fill the whole buffer without a terminator.
        buffer[TEXT_CAPACITY - 1] = 0;
        Some(unsafe { crate::discover::c_string(buffer.as_ptr()) })
    }

    fn value_for_text(&self, text: &str) -> Option<f32> {
        let text_to_value = self.params()?.text_to_value?;
        let text = CString::new(text).ok()?;
        let mut plain = 0.0_f64;
        let ok = unsafe { text_to_value(self.plugin, self.info.id, text.as_ptr(), &mut plain) };
        ok.then(|| self.info.normalize(plain))
    }

    fn set_value(&mut self, normalized: f32) {
        self.pending = Some(self.info.denormalize(normalized));
    }
}
