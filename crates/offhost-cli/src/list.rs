use std::fmt::{self, Write as _};

use anyhow::Result;
use clap_host::{AudioConfig, ClapParameter};
use offhost_automation::{supports_text_round_trip, Parameter, Plugin};

use crate::plugin::{load_plugin, open_library};
use crate::{ListParametersArgs, ListPluginsArgs};

/// Stepped parameters with at most this many values list every value.
const MAX_LISTED_STEPS: u32 = 100;

pub fn list_parameters(args: ListParametersArgs) -> Result<()> {
    let mut plugin = load_plugin(&args.plugin, args.plugin_id.as_deref())?;
    let config = AudioConfig {
        sample_rate: f64::from(args.sample_rate),
        min_frames_count: 1,
        max_frames_count: args.block_size,
    };
    let layout = plugin.default_layout();
    unsafe { plugin.activate(config, layout) }?;
    print!("{}", format_parameters(plugin.parameters())?);
    Ok(())
}

pub fn list_plugins(args: ListPluginsArgs) -> Result<()> {
    let library = open_library(&args.plugin)?;
    let descriptors = library.plugins()?;
    if descriptors.is_empty() {
        println!("No plugins found in {}", args.plugin.display());
        return Ok(());
    }
    println!("Plugins in {}:", args.plugin.display());
    for descriptor in descriptors {
        println!(
            "  {}: {} by {} (version {})",
            descriptor.id, descriptor.name, descriptor.vendor, descriptor.version
        );
    }
    Ok(())
}

/// A parameter that knows its default value.
pub trait ListedParameter: Parameter {
    fn default_normalized(&self) -> f32;
}

impl ListedParameter for ClapParameter {
    fn default_normalized(&self) -> f32 {
        ClapParameter::default_normalized(self)
    }
}

/// Renders the parameter listing, one block per parameter.
pub fn format_parameters<P: ListedParameter>(parameters: &[P]) -> Result<String, fmt::Error> {
    let width = parameters.len().saturating_sub(1).to_string().len();
    let indent = " ".repeat(2 + width);
    let text = |parameter: &P, value: f32| parameter.text_for_value(value).unwrap_or_default();

    let mut out = String::from("Plugin parameters:\n");
    for (index, parameter) in parameters.iter().enumerate() {
        writeln!(out, "{index:>width$}: {}", parameter.name())?;

        let steps = parameter.num_steps();
        let values = if (2..=MAX_LISTED_STEPS).contains(&steps) {
            (0..steps)
                .map(|step| text(parameter, step as f32 / (steps - 1) as f32))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            format!("{} to {}", text(parameter, 0.0), text(parameter, 1.0))
        };
        writeln!(out, "{indent}Values:  {values}")?;
        writeln!(
            out,
            "{indent}Default: {}",
            text(parameter, parameter.default_normalized())
        )?;
        writeln!(
            out,
            "{indent}Supports text values: {}",
            supports_text_round_trip(parameter)
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Listed {
        name: &'static str,
        steps: u32,
        default: f32,
    }

    impl Parameter for Listed {
        fn name(&self) -> &str {
            self.name
        }

        fn num_steps(&self) -> u32 {
            self.steps
        }

        fn text_for_value(&self, normalized: f32) -> Option<String> {
            Some(format!("{:.0}%", normalized * 100.0))
        }

        fn value_for_text(&self, text: &str) -> Option<f32> {
            let percent: f32 = text.strip_suffix('%')?.parse().ok()?;
            Some(percent / 100.0)
        }

        fn set_value(&mut self, _normalized: f32) {}
    }

    impl ListedParameter for Listed {
        fn default_normalized(&self) -> f32 {
            self.default
        }
    }

    #[test]
    fn lists_ranges_and_steps() {
        let mut parameters: Vec<_> = (0..10)
            .map(|_| Listed {
                name: "Filler",
                steps: 0x7fff_ffff,
                default: 0.5,
            })
            .collect();
        parameters.push(Listed {
            name: "Mode",
            steps: 3,
            default: 0.0,
        });

        let listing = format_parameters(&parameters).unwrap();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "Plugin parameters:");
        assert_eq!(lines[1], " 0: Filler");
        assert_eq!(lines[2], "    Values:  0% to 100%");
        assert_eq!(lines[3], "    Default: 50%");
        assert_eq!(lines[4], "    Supports text values: false");
        assert_eq!(
            &lines[41..],
            &[
                "10: Mode",
                "    Values:  0%, 50%, 100%",
                "    Default: 0%",
                "    Supports text values: true",
            ]
        );
    }
}
