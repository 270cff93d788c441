//! Safe(-ish) wrappers around the CLAP ABI for hosting plug-ins offline.
//!
//! A [`ClapInstance`] exposes its parameters through the
//! [`offhost_automation::Plugin`] trait, so automation tables can drive it
//! directly.

mod audio_buffer;
mod discover;
mod error;
mod events;
mod host;
mod instance;
mod params;
mod state;

pub use audio_buffer::AudioBuffer;
pub use discover::{ClapLibrary, ClapPluginDescriptor, PluginDiscovery};
pub use error::{ActivationError, HostError};
pub use events::MidiEvent;
pub use instance::{AudioConfig, AudioPortInfo, BusLayout, ClapInstance};
pub use params::{ClapParameter, ParamInfo, CONTINUOUS_STEPS};

/// Re-export the raw bindings for users that need to drop down to the ABI.
pub use clap_sys as ffi;
