use std::ffi::c_void;
use std::ptr;

use clap_sys::events::{
    clap_event_header, clap_event_midi, clap_event_param_value, clap_input_events,
    clap_output_events, CLAP_CORE_EVENT_SPACE_ID, CLAP_EVENT_MIDI, CLAP_EVENT_PARAM_VALUE,
};
use clap_sys::id::clap_id;

/// A short MIDI message at a sample offset inside the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub offset: u32,
    pub data: [u8; 3],
}

enum InputEvent {
    Param(clap_event_param_value),
    Midi(clap_event_midi),
}

impl InputEvent {
    fn header(&self) -> &clap_event_header {
        match self {
            Self::Param(event) => &event.header,
            Self::Midi(event) => &event.header,
        }
    }
}

fn event_header<T>(time: u32, type_: u16) -> clap_event_header {
    clap_event_header {
        size: std::mem::size_of::<T>() as u32,
        time,
        space_id: CLAP_CORE_EVENT_SPACE_ID,
        type_,
        flags: 0,
    }
}

/// Input events for a single `process` call, ordered by time.
#[derive(Default)]
pub(crate) struct EventList {
    events: Vec<InputEvent>,
}

impl EventList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn push_param_value(&mut self, param_id: clap_id, value: f64) {
        self.events.push(InputEvent::Param(clap_event_param_value {
            header: event_header::<clap_event_param_value>(0, CLAP_EVENT_PARAM_VALUE),
            param_id,
            cookie: ptr::null_mut(),
            note_id: -1,
            port_index: -1,
            channel: -1,
            key: -1,
            value,
        }));
    }

    pub fn push_midi(&mut self, event: MidiEvent) {
        self.events.push(InputEvent::Midi(clap_event_midi {
            header: event_header::<clap_event_midi>(event.offset, CLAP_EVENT_MIDI),
            port_index: 0,
            data: event.data,
        }));
    }

    /// Stable, so parameter changes stay ahead of MIDI at the same offset.
    pub fn sort(&mut self) {
        self.events.sort_by_key(|event| event.header().time);
    }

    /// The list as seen by the plug-in. Valid while `self` is neither moved
    /// nor modified.
    pub fn as_raw(&self) -> clap_input_events {
        clap_input_events {
            ctx: self as *const Self as *mut c_void,
            size: Some(input_size),
            get: Some(input_get),
        }
    }
}

unsafe extern "C" fn input_size(list: *const clap_input_events) -> u32 {
    let events = &*((*list).ctx as *const EventList);
    events.events.len() as u32
}

unsafe extern "C" fn input_get(list: *const clap_input_events, index: u32) -> *const clap_event_header {
    let events = &*((*list).ctx as *const EventList);
    events
        .events
        .get(index as usize)
        .map_or(ptr::null(), |event| event.header() as *const clap_event_header)
}

/// Output events are not used offline.
pub(crate) fn discard_output() -> clap_output_events {
    clap_output_events {
        ctx: ptr::null_mut(),
        try_push: Some(discard_event),
    }
}

unsafe extern "C" fn discard_event(
    _list: *const clap_output_events,
    _event: *const clap_event_header,
) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_visible_through_the_abi() {
        let mut list = EventList::with_capacity(4);
        list.push_midi(MidiEvent {
            offset: 12,
            data: [0x90, 60, 100],
        });
        list.push_param_value(3, 0.25);
        list.sort();

        let raw = list.as_raw();
        unsafe {
            assert_eq!(input_size(&raw), 2);
            let first = &*input_get(&raw, 0);
            assert_eq!(first.type_, CLAP_EVENT_PARAM_VALUE);
            assert_eq!(first.time, 0);
            let param = &*(first as *const clap_event_header as *const clap_event_param_value);
            assert_eq!(param.param_id, 3);
            assert_eq!(param.value, 0.25);

            let second = &*input_get(&raw, 1);
            assert_eq!(second.type_, CLAP_EVENT_MIDI);
            assert_eq!(second.time, 12);
            let midi = &*(second as *const clap_event_header as *const clap_event_midi);
            assert_eq!(midi.data, [0x90, 60, 100]);

            assert!(input_get(&raw, 2).is_null());
        }
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut list = EventList::with_capacity(8);
        list.push_param_value(1, 1.0);
        list.clear();
        assert_eq!(list.len(), 0);
        assert!(list.events.capacity() >= 8);
    }
}
