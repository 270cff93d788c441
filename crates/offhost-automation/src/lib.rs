//! Parameter automation for offline plugin rendering.
//!
//! An automation document maps plugin parameter names either to a single value
//! that is held for the whole run, or to a set of keyframes keyed by a time
//! expression (`"4410"`, `"0.5s"`, `"25%"`). Parsing resolves every time to an
//! absolute sample index and every value to a normalized `[0, 1]` parameter
//! value, producing a [`ParameterAutomation`] table. During rendering the table
//! is evaluated once per processing block with [`ParameterAutomation::apply`],
//! which linearly interpolates between keyframes and holds the first/last value
//! outside of the keyframe range.
//!
//! The crate never talks to a plugin directly. Hosts expose their parameters
//! through the [`Plugin`] and [`Parameter`] traits.

mod definition;
mod error;
mod overrides;
mod param;
mod probe;
mod time;
mod track;
mod value;

#[cfg(test)]
mod testing;

pub use definition::{parse_definition, parse_definition_str};
pub use error::{AutomationError, ErrorKind, Result};
pub use overrides::{merge_overrides, OverrideValue, ParameterOverride};
pub use param::{Parameter, Plugin};
pub use probe::supports_text_round_trip;
pub use time::{parse_time, seconds_to_samples};
pub use track::{AutomationTrack, Keyframe, ParameterAutomation};
pub use value::{normalize, Normalized};
