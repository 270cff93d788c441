//! In-memory parameters for exercising the engine without a real plugin.

use crate::param::{Parameter, Plugin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMapping {
    /// `"40.000 %"`, parsed back exactly.
    Percent,
    /// One decimal place, unparseable text reads as 0.
    Lossy,
    /// The host refuses every conversion.
    Refusing,
    /// Text parses to NaN.
    NotANumber,
}

#[derive(Debug, Clone)]
pub struct FakeParameter {
    pub name: String,
    pub steps: u32,
    pub mapping: TextMapping,
    pub value: f32,
    pub writes: usize,
}

impl FakeParameter {
    pub fn continuous(name: &str) -> Self {
        Self::stepped(name, 0x7fff_ffff)
    }

    pub fn stepped(name: &str, steps: u32) -> Self {
        Self {
            name: name.to_owned(),
            steps,
            mapping: TextMapping::Percent,
            value: 0.0,
            writes: 0,
        }
    }

    pub fn with_mapping(mut self, mapping: TextMapping) -> Self {
        self.mapping = mapping;
        self
    }
}

impl Parameter for FakeParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_steps(&self) -> u32 {
        self.steps
    }

    fn text_for_value(&self, normalized: f32) -> Option<String> {
        match self.mapping {
            TextMapping::Percent => Some(format!("{:.3} %", normalized * 100.0)),
            TextMapping::Lossy => Some(format!("{normalized:.1}")),
            TextMapping::Refusing => None,
            TextMapping::NotANumber => Some("nan".to_owned()),
        }
    }

    fn value_for_text(&self, text: &str) -> Option<f32> {
        match self.mapping {
            TextMapping::Percent => {
                let number = text.trim().strip_suffix('%')?.trim();
                number.parse::<f32>().ok().map(|percent| percent / 100.0)
            }
            TextMapping::Lossy => Some(text.trim().parse().unwrap_or(0.0)),
            TextMapping::Refusing => None,
            TextMapping::NotANumber => Some(f32::NAN),
        }
    }

    fn set_value(&mut self, normalized: f32) {
        self.value = normalized;
        self.writes += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePlugin {
    pub parameters: Vec<FakeParameter>,
}

impl FakePlugin {
    pub fn new(parameters: impl IntoIterator<Item = FakeParameter>) -> Self {
        Self {
            parameters: parameters.into_iter().collect(),
        }
    }

    pub fn value(&self, name: &str) -> f32 {
        self.parameter(name).map(|param| param.value).unwrap_or(f32::NAN)
    }
}

impl Plugin for FakePlugin {
    type Param = FakeParameter;

    fn parameters(&self) -> &[FakeParameter] {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut [FakeParameter] {
        &mut self.parameters
    }
}
