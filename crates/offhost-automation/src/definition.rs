use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AutomationError, Result};
use crate::param::{Parameter, Plugin};
use crate::probe::supports_text_round_trip;
use crate::time::parse_time;
use crate::track::{AutomationTrack, Keyframe, ParameterAutomation};
use crate::value::{normalize, type_name};

/// Parses an automation document from JSON text.
///
/// See [`parse_definition`].
pub fn parse_definition_str<P>(
    json: &str,
    plugin: &P,
    sample_rate: f64,
    total_length: u64,
) -> Result<ParameterAutomation>
where
    P: Plugin + ?Sized,
{
    let document: Value = serde_json::from_str(json)?;
    parse_definition(&document, plugin, sample_rate, total_length)
}

/// Builds the automation table for `plugin` from a parsed document.
///
/// The document maps parameter names to either a single value, held for the
/// whole run, or an object of time expression → value keyframes. Times are
/// resolved with [`parse_time`], values with [`normalize`]. Parameters that use
/// text values must pass [`supports_text_round_trip`].
///
/// Parameters and keyframes are visited in key order and the first error
/// aborts parsing.
pub fn parse_definition<P>(
    document: &Value,
    plugin: &P,
    sample_rate: f64,
    total_length: u64,
) -> Result<ParameterAutomation>
where
    P: Plugin + ?Sized,
{
    let Value::Object(definitions) = document else {
        return Err(AutomationError::MalformedDocument {
            reason: format!(
                "expected an object mapping parameter names to automation, found {}",
                type_name(document)
            ),
        });
    };

    let mut automation = ParameterAutomation::new();
    for (name, definition) in definitions {
        let parameter = plugin
            .parameter(name)
            .ok_or_else(|| AutomationError::UnknownParameter { name: name.clone() })?;

        let (track, used_text) = match definition {
            Value::Object(keyframes) => {
                parse_keyframes(name, keyframes, parameter, sample_rate, total_length)?
            }
            Value::Array(_) => {
                return Err(AutomationError::MalformedDocument {
                    reason: format!(
                        "automation of parameter '{name}' must be a value or an object of keyframes"
                    ),
                });
            }
            primitive => {
                let normalized =
                    normalize(primitive, parameter).map_err(|err| err.in_parameter(name, None))?;
                (
                    AutomationTrack::constant(normalized.value),
                    normalized.from_text,
                )
            }
        };

        if used_text && !supports_text_round_trip(parameter) {
            return Err(AutomationError::TextUnsupportedForParameter {
                parameter: name.clone(),
            });
        }

        debug!(
            parameter = %name,
            keyframes = track.keyframes().len(),
            "parsed parameter automation"
        );
        automation.insert(name.clone(), track);
    }

    Ok(automation)
}

fn parse_keyframes<P>(
    name: &str,
    keyframes: &Map<String, Value>,
    parameter: &P,
    sample_rate: f64,
    total_length: u64,
) -> Result<(AutomationTrack, bool)>
where
    P: Parameter + ?Sized,
{
    let mut track: Option<AutomationTrack> = None;
    let mut used_text = false;

    for (time, value) in keyframes {
        let sample = parse_time(time, sample_rate, total_length)
            .map_err(|err| err.in_parameter(name, Some(time)))?;

        if track.as_ref().is_some_and(|track| track.contains(sample)) {
            return Err(AutomationError::DuplicateKeyframeTime {
                parameter: name.to_owned(),
                sample,
                expression: time.clone(),
            });
        }

        let normalized =
            normalize(value, parameter).map_err(|err| err.in_parameter(name, Some(time)))?;
        used_text |= normalized.from_text;

        let keyframe = Keyframe::new(sample, normalized.value);
        match track.as_mut() {
            Some(track) => {
                track.insert(keyframe);
            }
            None => track = Some(AutomationTrack::new(keyframe)),
        }
    }

    let track = track.ok_or_else(|| AutomationError::EmptyAutomation {
        parameter: name.to_owned(),
    })?;
    Ok((track, used_text))
}
