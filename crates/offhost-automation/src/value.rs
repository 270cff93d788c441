use serde_json::Value;

use crate::error::{AutomationError, Result};
use crate::param::Parameter;

/// A parameter value resolved from an automation document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub value: f32,
    /// Whether the value was given as display text rather than a number.
    pub from_text: bool,
}

/// Resolves a JSON primitive into a normalized parameter value.
///
/// Numbers must already be normalized to `[0, 1]`. Strings are converted with
/// the parameter's text conversion and trusted as-is, since hosts may map text
/// outside of the nominal range.
pub fn normalize<P>(primitive: &Value, parameter: &P) -> Result<Normalized>
where
    P: Parameter + ?Sized,
{
    match primitive {
        Value::Number(number) => {
            let Some(value) = number.as_f64() else {
                return Err(AutomationError::InvalidValueType { found: "number" });
            };
            if !(0.0..=1.0).contains(&value) {
                return Err(AutomationError::ValueOutOfRange { value });
            }
            Ok(Normalized {
                value: value as f32,
                from_text: false,
            })
        }
        Value::String(text) => {
            let value = parameter.value_for_text(text).ok_or_else(|| {
                AutomationError::UnconvertibleText {
                    parameter: parameter.name().to_owned(),
                    text: text.clone(),
                }
            })?;
            Ok(Normalized {
                value,
                from_text: true,
            })
        }
        other => Err(AutomationError::InvalidValueType {
            found: type_name(other),
        }),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeParameter, TextMapping};
    use crate::ErrorKind;

    #[test]
    fn numbers_pass_through() {
        let param = FakeParameter::continuous("Gain");
        let normalized = normalize(&json!(0.25), &param).unwrap();
        assert_eq!(
            normalized,
            Normalized {
                value: 0.25,
                from_text: false
            }
        );
        assert_eq!(normalize(&json!(0), &param).unwrap().value, 0.0);
        assert_eq!(normalize(&json!(1), &param).unwrap().value, 1.0);
    }

    #[test]
    fn numbers_outside_unit_range_are_rejected() {
        let param = FakeParameter::continuous("Gain");
        for value in [json!(1.5), json!(-0.01), json!(2)] {
            let error = normalize(&value, &param).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::ValueOutOfRange);
        }
    }

    #[test]
    fn text_is_converted_by_parameter() {
        let param = FakeParameter::continuous("Mix");
        let normalized = normalize(&json!("40 %"), &param).unwrap();
        assert!((normalized.value - 0.4).abs() < 1e-6);
        assert!(normalized.from_text);
    }

    #[test]
    fn text_outside_nominal_range_is_trusted() {
        let param = FakeParameter::continuous("Mix");
        let normalized = normalize(&json!("150%"), &param).unwrap();
        assert!((normalized.value - 1.5).abs() < 1e-6);
    }

    #[test]
    fn refused_text_is_an_error() {
        let param = FakeParameter::continuous("Mode").with_mapping(TextMapping::Refusing);
        let error = normalize(&json!("Fast"), &param).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnconvertibleText);
    }

    #[test]
    fn other_types_are_rejected() {
        let param = FakeParameter::continuous("Gain");
        for (value, name) in [
            (json!(true), "boolean"),
            (json!(null), "null"),
            (json!([0.5]), "array"),
            (json!({"0": 0.5}), "object"),
        ] {
            let error = normalize(&value, &param).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidValueType);
            assert!(error.to_string().contains(name));
        }
    }
}
