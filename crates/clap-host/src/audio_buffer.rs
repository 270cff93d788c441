use std::ops::{Index, IndexMut};

/// Channel-major audio data handed to and from a plug-in.
///
/// The buffer is allocated once for the largest block and reused, so the
/// processing loop does not allocate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBuffer {
    /// Creates a buffer with the provided number of channels and frames,
    /// initialised to silence.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channels],
            frames,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Clears the contents of the buffer back to silence.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    pub fn channel_slices(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(|channel| channel.as_slice())
    }

    /// Raw pointers to each channel, for the plug-in ABI.
    pub(crate) fn write_pointers(&mut self, pointers: &mut Vec<*mut f32>) {
        pointers.clear();
        pointers.extend(self.channels.iter_mut().map(|channel| channel.as_mut_ptr()));
    }
}

impl Index<usize> for AudioBuffer {
    type Output = [f32];

    fn index(&self, index: usize) -> &Self::Output {
        self.channels[index].as_slice()
    }
}

impl IndexMut<usize> for AudioBuffer {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.channels[index].as_mut_slice()
    }
}
