use crate::error::{AutomationError, Result};

/// Converts seconds to samples, truncating toward zero. Negative inputs
/// saturate to sample 0.
pub fn seconds_to_samples(seconds: f64, sample_rate: f64) -> u64 {
    (seconds * sample_rate) as u64
}

/// Converts a keyframe time expression into an absolute sample index.
///
/// - `<integer>` is a sample index. Only ASCII digits are accepted.
/// - `<float>s` is a time in seconds, truncated toward zero.
/// - `<float>%` is relative to `total_length`, rounded half away from zero.
///
/// Whitespace around the expression and between the number and its suffix is
/// ignored. Negative and non-finite times are rejected.
pub fn parse_time(expression: &str, sample_rate: f64, total_length: u64) -> Result<u64> {
    let trimmed = expression.trim();

    if let Some(seconds) = trimmed.strip_suffix('s') {
        let seconds = parse_offset(expression, seconds)?;
        return Ok(seconds_to_samples(seconds, sample_rate));
    }

    if let Some(percent) = trimmed.strip_suffix('%') {
        let percent = parse_offset(expression, percent)?;
        return Ok(((percent / 100.0) * total_length as f64).round() as u64);
    }

    let invalid = || AutomationError::InvalidSampleIndex {
        expression: expression.to_owned(),
    };
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    trimmed.parse().map_err(|_| invalid())
}

fn parse_offset(expression: &str, number: &str) -> Result<f64> {
    let invalid = |reason| AutomationError::InvalidTimeFormat {
        expression: expression.to_owned(),
        reason,
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| invalid("not a floating-point number"))?;
    if !value.is_finite() {
        return Err(invalid("not a finite number"));
    }
    if value < 0.0 {
        return Err(invalid("negative times are not allowed"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const RATE: f64 = 44_100.0;

    fn kind_of(expression: &str) -> ErrorKind {
        parse_time(expression, RATE, 1000).unwrap_err().kind()
    }

    #[test]
    fn plain_integers_are_samples() {
        assert_eq!(parse_time("1000", RATE, 0).unwrap(), 1000);
        assert_eq!(parse_time("0", RATE, 0).unwrap(), 0);
        assert_eq!(parse_time("  42 ", RATE, 0).unwrap(), 42);
    }

    #[test]
    fn seconds_use_sample_rate() {
        assert_eq!(parse_time("1s", RATE, 0).unwrap(), 44_100);
        assert_eq!(parse_time("0.5 s", RATE, 0).unwrap(), 22_050);
        assert_eq!(parse_time(" 2s ", 48_000.0, 0).unwrap(), 96_000);
        assert_eq!(parse_time("1e-3s", 48_000.0, 0).unwrap(), 48);
    }

    #[test]
    fn seconds_truncate_toward_zero() {
        assert_eq!(parse_time("1.5s", 3.0, 0).unwrap(), 4);
        assert_eq!(parse_time("0.9s", 1.0, 0).unwrap(), 0);
    }

    #[test]
    fn percentages_use_total_length() {
        assert_eq!(parse_time("50%", RATE, 1000).unwrap(), 500);
        assert_eq!(parse_time("100 %", RATE, 1000).unwrap(), 1000);
        assert_eq!(parse_time("150%", RATE, 1000).unwrap(), 1500);
        assert_eq!(parse_time("0%", RATE, 0).unwrap(), 0);
    }

    #[test]
    fn percentages_round_half_away_from_zero() {
        assert_eq!(parse_time("2.5%", RATE, 100).unwrap(), 3);
        assert_eq!(parse_time("3.5%", RATE, 100).unwrap(), 4);
        assert_eq!(parse_time("2.4%", RATE, 100).unwrap(), 2);
    }

    #[test]
    fn integers_must_be_fully_consumed() {
        assert_eq!(kind_of("12abc"), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of("abc"), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of("1 000"), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of("-5"), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of("+5"), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of("1.5"), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of(""), ErrorKind::InvalidSampleIndex);
        assert_eq!(kind_of("1S"), ErrorKind::InvalidSampleIndex);
        assert_eq!(
            kind_of("18446744073709551616"),
            ErrorKind::InvalidSampleIndex
        );
    }

    #[test]
    fn suffixed_values_must_be_floats() {
        assert_eq!(kind_of("s"), ErrorKind::InvalidTimeFormat);
        assert_eq!(kind_of("abcs"), ErrorKind::InvalidTimeFormat);
        assert_eq!(kind_of("1.2.3%"), ErrorKind::InvalidTimeFormat);
        assert_eq!(kind_of("-1s"), ErrorKind::InvalidTimeFormat);
        assert_eq!(kind_of("infs"), ErrorKind::InvalidTimeFormat);
        assert_eq!(kind_of("NaN%"), ErrorKind::InvalidTimeFormat);
    }

    #[test]
    fn error_keeps_raw_expression() {
        let error = parse_time(" 5x ", RATE, 0).unwrap_err();
        assert_eq!(error.to_string(), "invalid sample index ' 5x '");
    }
}
