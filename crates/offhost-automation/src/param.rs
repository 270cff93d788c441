/// An automatable parameter of a hosted plugin.
///
/// Values crossing this trait are always normalized to `[0, 1]`. Conversions
/// return `None` when the host refuses them.
pub trait Parameter {
    fn name(&self) -> &str;

    /// Number of discrete values the parameter can take. Continuous parameters
    /// report a large number.
    fn num_steps(&self) -> u32;

    /// Display text for a normalized value.
    fn text_for_value(&self, normalized: f32) -> Option<String>;

    /// Normalized value for a display text. The result is not guaranteed to
    /// lie within `[0, 1]`.
    fn value_for_text(&self, text: &str) -> Option<f32>;

    fn set_value(&mut self, normalized: f32);
}

/// A hosted plugin exposing named parameters.
pub trait Plugin {
    type Param: Parameter;

    fn parameters(&self) -> &[Self::Param];

    fn parameters_mut(&mut self) -> &mut [Self::Param];

    /// Looks up a parameter by its exact name.
    fn parameter(&self, name: &str) -> Option<&Self::Param> {
        self.parameters()
            .iter()
            .find(|parameter| parameter.name() == name)
    }

    fn parameter_mut(&mut self, name: &str) -> Option<&mut Self::Param> {
        self.parameters_mut()
            .iter_mut()
            .find(|parameter| parameter.name() == name)
    }
}
