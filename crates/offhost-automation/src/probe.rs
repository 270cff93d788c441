use crate::param::Parameter;

const MAX_PROBES: u32 = 100;
const ROUND_TRIP_TOLERANCE: f32 = 1e-4;

/// Checks whether a parameter's value → text → value conversion returns the
/// original value, which is required before text can be used to automate it.
///
/// Up to 100 values spread evenly across `[0, 1]` are converted to text and
/// back. This is a sampled approximation: a parameter whose text mapping is
/// lossy only between the probed values passes, and one that fails only at a
/// probed value is rejected even if every other value would round-trip.
/// A conversion refused by the host, or producing NaN, counts as a failure.
pub fn supports_text_round_trip<P>(parameter: &P) -> bool
where
    P: Parameter + ?Sized,
{
    let probes = parameter.num_steps().min(MAX_PROBES);
    if probes <= 1 {
        return true;
    }

    (0..probes).all(|index| {
        let value = index as f32 / (probes - 1) as f32;
        let Some(text) = parameter.text_for_value(value) else {
            return false;
        };
        parameter
            .value_for_text(&text)
            .is_some_and(|parsed| (value - parsed).abs() < ROUND_TRIP_TOLERANCE)
    })
}
