use offhost_automation::{Parameter, Plugin};

/// A parameter whose display text is a percentage with two decimals.
pub struct PercentParameter {
    pub name: String,
    pub value: f32,
}

/// A parameter that only knows "Off" and "On" and reads any other text as off.
pub struct SwitchParameter {
    pub name: String,
    pub value: f32,
}

pub enum TestParameter {
    Percent(PercentParameter),
    Switch(SwitchParameter),
}

impl TestParameter {
    pub fn percent(name: &str) -> Self {
        Self::Percent(PercentParameter {
            name: name.to_owned(),
            value: 0.0,
        })
    }

    pub fn switch(name: &str) -> Self {
        Self::Switch(SwitchParameter {
            name: name.to_owned(),
            value: 0.0,
        })
    }

    pub fn value(&self) -> f32 {
        match self {
            Self::Percent(param) => param.value,
            Self::Switch(param) => param.value,
        }
    }
}

impl Parameter for TestParameter {
    fn name(&self) -> &str {
        match self {
            Self::Percent(param) => &param.name,
            Self::Switch(param) => &param.name,
        }
    }

    fn num_steps(&self) -> u32 {
        // Both are continuous to the host, even though the switch text has two states.
        0x7fff_ffff
    }

    fn text_for_value(&self, normalized: f32) -> Option<String> {
        match self {
            Self::Percent(_) => Some(format!("{:.2}%", normalized * 100.0)),
            Self::Switch(_) => Some(if normalized >= 0.5 { "On" } else { "Off" }.to_owned()),
        }
    }

    fn value_for_text(&self, text: &str) -> Option<f32> {
        match self {
            Self::Percent(_) => text
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f32>()
                .ok()
                .map(|percent| percent / 100.0),
            Self::Switch(_) => Some(if text == "On" { 1.0 } else { 0.0 }),
        }
    }

    fn set_value(&mut self, normalized: f32) {
        match self {
            Self::Percent(param) => param.value = normalized,
            Self::Switch(param) => param.value = normalized,
        }
    }
}

pub struct TestPlugin {
    pub parameters: Vec<TestParameter>,
}

impl TestPlugin {
    pub fn new() -> Self {
        Self {
            parameters: vec![
                TestParameter::percent("Gain"),
                TestParameter::percent("Mix"),
                TestParameter::switch("Bypass"),
            ],
        }
    }

    pub fn value(&self, name: &str) -> f32 {
        self.parameter(name).map(TestParameter::value).unwrap_or(f32::NAN)
    }
}

impl Plugin for TestPlugin {
    type Param = TestParameter;

    fn parameters(&self) -> &[TestParameter] {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut [TestParameter] {
        &mut self.parameters
    }
}
