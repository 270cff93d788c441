use std::str::FromStr;

use tracing::warn;

use crate::error::{AutomationError, Result};
use crate::param::{Parameter, Plugin};
use crate::probe::supports_text_round_trip;
use crate::track::{AutomationTrack, ParameterAutomation};

#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    /// Display text, converted by the parameter.
    Text(String),
    /// An already normalized value in `[0, 1]`.
    Normalized(f32),
}

/// A parameter value given on the command line as `<name>:<value>[:n]`.
///
/// The `:n` suffix marks the value as normalized. Colons inside single or
/// double quotes do not split, and the quotes themselves are dropped, so
/// `"Cutoff: Hz":0.5:n` names the parameter `Cutoff: Hz`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterOverride {
    pub name: String,
    pub value: OverrideValue,
}

impl ParameterOverride {
    /// Resolves the override into a normalized value for `plugin`.
    pub fn resolve<P>(&self, plugin: &P) -> Result<f32>
    where
        P: Plugin + ?Sized,
    {
        let parameter =
            plugin
                .parameter(&self.name)
                .ok_or_else(|| AutomationError::UnknownParameter {
                    name: self.name.clone(),
                })?;

        match &self.value {
            OverrideValue::Normalized(value) => Ok(*value),
            OverrideValue::Text(text) => {
                if !supports_text_round_trip(parameter) {
                    return Err(AutomationError::TextUnsupportedForParameter {
                        parameter: self.name.clone(),
                    });
                }
                parameter
                    .value_for_text(text)
                    .ok_or_else(|| AutomationError::UnconvertibleText {
                        parameter: self.name.clone(),
                        text: text.clone(),
                    })
            }
        }
    }
}

impl FromStr for ParameterOverride {
    type Err = AutomationError;

    fn from_str(argument: &str) -> Result<Self> {
        let invalid = |reason: String| AutomationError::InvalidOverride {
            argument: argument.to_owned(),
            reason,
        };

        let tokens = split_unquoted(argument, ':');
        let (name, value) = match tokens.as_slice() {
            [name, text] => (name, OverrideValue::Text(text.clone())),
            [name, value, modifier] => {
                if modifier != "n" {
                    return Err(invalid(format!(
                        "invalid parameter modifier '{modifier}'; only 'n' is allowed"
                    )));
                }
                let value: f32 = value.trim().parse().map_err(|_| {
                    invalid(format!(
                        "normalized parameter value must be a number, but is '{value}'"
                    ))
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(AutomationError::ValueOutOfRange {
                        value: value as f64,
                    });
                }
                (name, OverrideValue::Normalized(value))
            }
            _ => return Err(invalid("not a colon-separated key-value pair".to_owned())),
        };

        if name.is_empty() {
            return Err(invalid("parameter name is empty".to_owned()));
        }

        Ok(Self {
            name: name.clone(),
            value,
        })
    }
}

/// Applies command-line overrides on top of an automation table.
///
/// Each override becomes a single keyframe at sample 0, replacing any
/// automation already present for that parameter.
pub fn merge_overrides<P>(
    automation: &mut ParameterAutomation,
    overrides: &[ParameterOverride],
    plugin: &P,
) -> Result<()>
where
    P: Plugin + ?Sized,
{
    for parameter_override in overrides {
        let value = parameter_override.resolve(plugin)?;
        let name = &parameter_override.name;
        if automation
            .insert(name.clone(), AutomationTrack::constant(value))
            .is_some()
        {
            warn!(
                parameter = %name,
                "plugin parameter '{name}' already has automation and is overridden by a command-line parameter"
            );
        }
    }
    Ok(())
}

fn split_unquoted(input: &str, separator: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote = None;

    for c in input.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == separator => tokens.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }
    tokens.push(current);
    tokens
}
