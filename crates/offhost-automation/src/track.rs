use std::collections::btree_map::{self, BTreeMap};

use crate::error::{AutomationError, Result};
use crate::param::{Parameter, Plugin};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub sample: u64,
    pub value: f32,
}

impl Keyframe {
    pub fn new(sample: u64, value: f32) -> Self {
        Self { sample, value }
    }
}

/// Keyframes of a single parameter, sorted by sample with unique samples.
///
/// A track always holds at least one keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationTrack {
    keyframes: Vec<Keyframe>,
}

impl AutomationTrack {
    pub fn new(first: Keyframe) -> Self {
        Self {
            keyframes: vec![first],
        }
    }

    /// A single keyframe at sample 0, holding `value` for the whole run.
    pub fn constant(value: f32) -> Self {
        Self::new(Keyframe::new(0, value))
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn first(&self) -> &Keyframe {
        &self.keyframes[0]
    }

    pub fn last(&self) -> &Keyframe {
        &self.keyframes[self.keyframes.len() - 1]
    }

    pub fn contains(&self, sample: u64) -> bool {
        self.keyframes
            .binary_search_by_key(&sample, |keyframe| keyframe.sample)
            .is_ok()
    }

    /// Inserts a keyframe in sample order. Returns `false` and leaves the
    /// track untouched if a keyframe already exists at that sample.
    pub fn insert(&mut self, keyframe: Keyframe) -> bool {
        match self
            .keyframes
            .binary_search_by_key(&keyframe.sample, |existing| existing.sample)
        {
            Ok(_) => false,
            Err(index) => {
                self.keyframes.insert(index, keyframe);
                true
            }
        }
    }

    /// Value of the parameter at `sample`.
    ///
    /// Linear between neighbouring keyframes, flat before the first and after
    /// the last keyframe. Exact at keyframe samples.
    pub fn value_at(&self, sample: u64) -> f32 {
        let index = self
            .keyframes
            .partition_point(|keyframe| keyframe.sample <= sample);
        if index == 0 {
            return self.keyframes[0].value;
        }

        let prev = &self.keyframes[index - 1];
        if prev.sample == sample || index == self.keyframes.len() {
            return prev.value;
        }

        let next = &self.keyframes[index];
        let position = (sample - prev.sample) as f64;
        let span = (next.sample - prev.sample) as f64;
        let t = (position / span) as f32;
        prev.value + (next.value - prev.value) * t
    }
}

/// Automation tracks keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterAutomation {
    tracks: BTreeMap<String, AutomationTrack>,
}

impl ParameterAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.tracks.contains_key(parameter)
    }

    pub fn get(&self, parameter: &str) -> Option<&AutomationTrack> {
        self.tracks.get(parameter)
    }

    /// Sets the track of a parameter, returning the track it replaced.
    pub fn insert(
        &mut self,
        parameter: impl Into<String>,
        track: AutomationTrack,
    ) -> Option<AutomationTrack> {
        self.tracks.insert(parameter.into(), track)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, AutomationTrack> {
        self.tracks.iter()
    }

    /// Pushes every automated parameter's value at `sample` into the plugin.
    ///
    /// Parameters are looked up by name on every call. Nothing is allocated
    /// unless a parameter no longer exists.
    pub fn apply<P>(&self, plugin: &mut P, sample: u64) -> Result<()>
    where
        P: Plugin + ?Sized,
    {
        for (name, track) in &self.tracks {
            let parameter =
                plugin
                    .parameter_mut(name)
                    .ok_or_else(|| AutomationError::UnknownParameter {
                        name: name.clone(),
                    })?;
            parameter.set_value(track.value_at(sample));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ParameterAutomation {
    type Item = (&'a String, &'a AutomationTrack);
    type IntoIter = btree_map::Iter<'a, String, AutomationTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
