use std::ffi::c_void;

use clap_sys::stream::clap_istream;

/// Feeds a preset blob to the plug-in through a `clap_istream`.
pub(crate) struct StateReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> StateReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The stream borrows `self` mutably for as long as the plug-in reads.
    pub fn as_raw(&mut self) -> clap_istream {
        clap_istream {
            ctx: self as *mut Self as *mut c_void,
            read: Some(read_state),
        }
    }

    fn read(&mut self, out: &mut [u8]) -> usize {
        let remaining = &self.data[self.position..];
        let count = remaining.len().min(out.len());
        out[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        count
    }
}

unsafe extern "C" fn read_state(stream: *const clap_istream, buffer: *mut c_void, size: u64) -> i64 {
    let reader = &mut *((*stream).ctx as *mut StateReader<'_>);
    if buffer.is_null() {
        return -1;
    }
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    let remaining = reader.data.len() - reader.position;
    let out = std::slice::from_raw_parts_mut(buffer as *mut u8, size.min(remaining));
    reader.read(out) as i64
}
