use std::ffi::{c_char, c_void, CString};
use std::ptr;
use std::sync::Arc;

use clap_sys::audio_buffer::clap_audio_buffer;
use clap_sys::ext::audio_ports::{
    clap_audio_port_info, clap_plugin_audio_ports, CLAP_AUDIO_PORT_IS_MAIN, CLAP_EXT_AUDIO_PORTS,
};
use clap_sys::ext::latency::{clap_plugin_latency, CLAP_EXT_LATENCY};
use clap_sys::ext::params::{clap_plugin_params, CLAP_EXT_PARAMS};
use clap_sys::ext::state::{clap_plugin_state, CLAP_EXT_STATE};
use clap_sys::plugin::clap_plugin;
use clap_sys::process::{clap_process, CLAP_PROCESS_ERROR};
use offhost_automation::Plugin;

use crate::audio_buffer::AudioBuffer;
use crate::discover::{ClapLibrary, ClapPluginDescriptor};
use crate::error::{ActivationError, HostError};
use crate::events::{discard_output, EventList, MidiEvent};
use crate::host::host;
use crate::params::ClapParameter;
use crate::state::StateReader;

/// Room for MIDI events on top of one change per parameter.
const EVENT_HEADROOM: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    pub sample_rate: f64,
    pub min_frames_count: u32,
    pub max_frames_count: u32,
}

/// Channel counts of the audio ports handed to the plug-in, one entry per
/// port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusLayout {
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
}

impl BusLayout {
    pub fn input_channels(&self) -> usize {
        self.inputs.iter().map(|&count| count as usize).sum()
    }

    pub fn output_channels(&self) -> usize {
        self.outputs.iter().map(|&count| count as usize).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioPortInfo {
    pub channels: u32,
    pub main: bool,
}

/// Represents a running CLAP plug-in instance.
pub struct ClapInstance {
    plugin: *const clap_plugin,
    descriptor: ClapPluginDescriptor,
    params: Vec<ClapParameter>,
    audio_ports: *const clap_plugin_audio_ports,
    latency: *const clap_plugin_latency,
    state: *const clap_plugin_state,
    layout: BusLayout,
    activated: bool,
    processing: bool,
    steady_time: i64,
    events: EventList,
    input_pointers: Vec<*mut f32>,
    output_pointers: Vec<*mut f32>,
    input_buffers: Vec<clap_audio_buffer>,
    output_buffers: Vec<clap_audio_buffer>,
    // Dropped last so the plug-in code outlives the instance.
    _library: Arc<ClapLibrary>,
}

unsafe impl Send for ClapInstance {}

impl ClapInstance {
    /// Creates and initializes the plug-in described by `descriptor`.
    ///
    /// # Safety
    /// Runs plug-in code. Must be called from the thread that will drive the
    /// instance.
    pub unsafe fn create(
        library: Arc<ClapLibrary>,
        descriptor: &ClapPluginDescriptor,
    ) -> Result<Self, ActivationError> {
        let factory = library
            .factory()
            .map_err(|_| ActivationError::MissingFactory)?;
        let id = CString::new(descriptor.id.clone()).map_err(|_| ActivationError::InvalidId)?;
        let Some(create_plugin) = factory.create_plugin else {
            return Err(ActivationError::MissingCreatePlugin);
        };
        let plugin = create_plugin(factory, host(), id.as_ptr());
        if plugin.is_null() {
            return Err(ActivationError::NullInstance);
        }

        let plugin_ref = &*plugin;
        if let Some(init) = plugin_ref.init {
            if !init(plugin) {
                if let Some(destroy) = plugin_ref.destroy {
                    destroy(plugin);
                }
                return Err(ActivationError::InitFailed);
            }
        }

        let extension = |id: *const c_char| -> *const c_void {
            match plugin_ref.get_extension {
                Some(get_extension) => get_extension(plugin, id),
                None => ptr::null(),
            }
        };
        let params = extension(CLAP_EXT_PARAMS.as_ptr()) as *const clap_plugin_params;
        let audio_ports = extension(CLAP_EXT_AUDIO_PORTS.as_ptr()) as *const clap_plugin_audio_ports;
        let latency = extension(CLAP_EXT_LATENCY.as_ptr()) as *const clap_plugin_latency;
        let state = extension(CLAP_EXT_STATE.as_ptr()) as *const clap_plugin_state;

        let params = ClapParameter::query_all(plugin, params);
        log::debug!(
            "created {} ({} parameters, audio ports: {}, latency: {}, state: {})",
            descriptor.id,
            params.len(),
            !audio_ports.is_null(),
            !latency.is_null(),
            !state.is_null()
        );

        Ok(Self {
            plugin,
            descriptor: descriptor.clone(),
            params,
            audio_ports,
            latency,
            state,
            layout: BusLayout::default(),
            activated: false,
            processing: false,
            steady_time: 0,
            events: EventList::default(),
            input_pointers: Vec::new(),
            output_pointers: Vec::new(),
            input_buffers: Vec::new(),
            output_buffers: Vec::new(),
            _library: library,
        })
    }

    pub fn descriptor(&self) -> &ClapPluginDescriptor {
        &self.descriptor
    }

    /// Audio ports the plug-in declares on one side.
    pub fn audio_ports(&self, is_input: bool) -> Vec<AudioPortInfo> {
        let Some(ports) = (unsafe { self.audio_ports.as_ref() }) else {
            return Vec::new();
        };
        let (Some(count), Some(get)) = (ports.count, ports.get) else {
            return Vec::new();
        };
        unsafe {
            (0..count(self.plugin, is_input))
                .filter_map(|index| {
                    let mut info: clap_audio_port_info = std::mem::zeroed();
                    get(self.plugin, index, is_input, &mut info).then_some(AudioPortInfo {
                        channels: info.channel_count,
                        main: info.flags & CLAP_AUDIO_PORT_IS_MAIN != 0,
                    })
                })
                .collect()
        }
    }

    /// Channel count of the main output port, falling back to the first one.
    pub fn main_output_channels(&self) -> u32 {
        let ports = self.audio_ports(false);
        ports
            .iter()
            .find(|port| port.main)
            .or_else(|| ports.first())
            .map_or(0, |port| port.channels)
    }

    /// The port layout the plug-in declares by default.
    pub fn default_layout(&self) -> BusLayout {
        BusLayout {
            inputs: self.audio_ports(true).iter().map(|port| port.channels).collect(),
            outputs: self.audio_ports(false).iter().map(|port| port.channels).collect(),
        }
    }

    /// Loads a preset blob through the state extension.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), HostError> {
        let load = unsafe { self.state.as_ref() }
            .and_then(|state| state.load)
            .ok_or_else(|| HostError::Unsupported("plug-in cannot load presets".into()))?;
        let mut reader = StateReader::new(data);
        let stream = reader.as_raw();
        if !unsafe { load(self.plugin, &stream) } {
            return Err(HostError::Unsupported(
                "plug-in rejected the preset data".into(),
            ));
        }
        log::debug!("loaded {} bytes of state into {}", data.len(), self.descriptor.id);
        Ok(())
    }

    /// Activates the plug-in for the given port layout.
    ///
    /// # Safety
    /// Runs plug-in code.
    pub unsafe fn activate(
        &mut self,
        config: AudioConfig,
        layout: BusLayout,
    ) -> Result<(), ActivationError> {
        if self.activated {
            return Ok(());
        }
        let plugin = &*self.plugin;
        if let Some(activate) = plugin.activate {
            if !activate(
                self.plugin,
                config.sample_rate,
                config.min_frames_count,
                config.max_frames_count,
            ) {
                return Err(ActivationError::ActivationFailed);
            }
        }

        self.events = EventList::with_capacity(self.params.len() + EVENT_HEADROOM);
        self.input_pointers = Vec::with_capacity(layout.input_channels());
        self.output_pointers = Vec::with_capacity(layout.output_channels());
        self.input_buffers = Vec::with_capacity(layout.inputs.len());
        self.output_buffers = Vec::with_capacity(layout.outputs.len());
        self.layout = layout;
        self.steady_time = 0;
        self.activated = true;
        Ok(())
    }

    pub unsafe fn deactivate(&mut self) {
        if !self.activated {
            return;
        }
        self.stop_processing();
        let plugin = &*self.plugin;
        if let Some(deactivate) = plugin.deactivate {
            deactivate(self.plugin);
        }
        self.activated = false;
    }

    pub unsafe fn start_processing(&mut self) -> Result<(), ActivationError> {
        if self.processing {
            return Ok(());
        }
        let plugin = &*self.plugin;
        if let Some(start_processing) = plugin.start_processing {
            if !start_processing(self.plugin) {
                return Err(ActivationError::StartProcessingFailed);
            }
        }
        self.processing = true;
        Ok(())
    }

    pub unsafe fn stop_processing(&mut self) {
        if !self.processing {
            return;
        }
        let plugin = &*self.plugin;
        if let Some(stop_processing) = plugin.stop_processing {
            stop_processing(self.plugin);
        }
        self.processing = false;
    }

    /// Samples of delay the plug-in adds to its output.
    pub fn latency(&self) -> u32 {
        unsafe { self.latency.as_ref() }
            .and_then(|latency| latency.get)
            .map_or(0, |get| unsafe { get(self.plugin) })
    }

    /// Processes `frames` samples.
    ///
    /// Pending parameter writes are sent first, at offset 0, followed by the
    /// MIDI events of the block.
    pub fn process(
        &mut self,
        inputs: &mut AudioBuffer,
        outputs: &mut AudioBuffer,
        midi: &[MidiEvent],
        frames: usize,
    ) -> Result<(), HostError> {
        if !self.activated || !self.processing {
            return Err(HostError::NotActivated);
        }
        check_buffer(inputs, self.layout.input_channels(), frames)?;
        check_buffer(outputs, self.layout.output_channels(), frames)?;
        let process_fn = unsafe { (*self.plugin).process }.ok_or(HostError::ProcessFailed)?;

        self.events.clear();
        for param in &mut self.params {
            if let Some(value) = param.take_pending() {
                self.events.push_param_value(param.id(), value);
            }
        }
        for &event in midi {
            self.events.push_midi(event);
        }
        self.events.sort();

        inputs.write_pointers(&mut self.input_pointers);
        outputs.write_pointers(&mut self.output_pointers);
        port_buffers(&self.layout.inputs, &mut self.input_pointers, &mut self.input_buffers);
        port_buffers(&self.layout.outputs, &mut self.output_pointers, &mut self.output_buffers);

        let in_events = self.events.as_raw();
        let out_events = discard_output();
        let process = clap_process {
            steady_time: self.steady_time,
            frames_count: frames as u32,
            transport: ptr::null(),
            audio_inputs: self.input_buffers.as_ptr(),
            audio_outputs: self.output_buffers.as_mut_ptr(),
            audio_inputs_count: self.input_buffers.len() as u32,
            audio_outputs_count: self.output_buffers.len() as u32,
            in_events: &in_events,
            out_events: &out_events,
        };

        let status = unsafe { process_fn(self.plugin, &process) };
        self.steady_time += frames as i64;
        if status == CLAP_PROCESS_ERROR {
            return Err(HostError::ProcessFailed);
        }
        Ok(())
    }
}

impl Plugin for ClapInstance {
    type Param = ClapParameter;

    fn parameters(&self) -> &[ClapParameter] {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut [ClapParameter] {
        &mut self.params
    }
}

fn check_buffer(buffer: &AudioBuffer, channels: usize, frames: usize) -> Result<(), HostError> {
    if buffer.channels() != channels {
        return Err(HostError::ChannelMismatch {
            expected: channels,
            actual: buffer.channels(),
        });
    }
    if frames > buffer.frames() {
        return Err(HostError::BlockTooLarge {
            frames,
            capacity: buffer.frames(),
        });
    }
    Ok(())
}

/// Splits the flat channel pointer list into one buffer per port.
fn port_buffers(
    ports: &[u32],
    pointers: &mut [*mut f32],
    buffers: &mut Vec<clap_audio_buffer>,
) {
    buffers.clear();
    let mut offset = 0;
    for &channels in ports {
        buffers.push(clap_audio_buffer {
            data32: pointers[offset..].as_mut_ptr(),
            data64: ptr::null_mut(),
            channel_count: channels,
            latency: 0,
            constant_mask: 0,
        });
        offset += channels as usize;
    }
}

impl Drop for ClapInstance {
    fn drop(&mut self) {
        unsafe {
            self.deactivate();
            let plugin = &*self.plugin;
            if let Some(destroy) = plugin.destroy {
                destroy(self.plugin);
            }
        }
    }
}
