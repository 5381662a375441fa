//! Caller-facing chain factory.
//!
//! A [`ChainSpec`] names which effect chain an export should run its source
//! through; `build_graph` turns it into a fresh validated [`OfflineGraph`]
//! for one export call. Specs parse from the CLI surface
//! (`identity`, `reverb[:preset[:mix]]`, `rate:<multiplier>`).

use crate::graph::{GraphBuilder, GraphConfigError, OfflineGraph};
use corte_core::{AudioFormat, Effect};
use corte_effects::{Reverb, ReverbPreset};
use std::fmt;
use std::str::FromStr;

/// Selection of the effect chain between source and sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainSpec {
    /// No processing; source passes straight to the sink.
    Identity,
    /// Reverb with a named preset and a wet/dry mix in `[0, 100]`.
    Reverb {
        /// Room preset.
        preset: ReverbPreset,
        /// Wet/dry mix in percent wet.
        wet_dry: f32,
    },
    /// Playback-rate change with a multiplier greater than zero.
    Rate {
        /// Rate multiplier (2.0 = double speed).
        multiplier: f64,
    },
}

impl ChainSpec {
    /// Build a fresh unarmed graph for this chain at the given format.
    ///
    /// Parameter validation happens here, so an out-of-range mix or rate is
    /// a typed configuration error rather than a silently clamped value.
    pub fn build_graph(
        &self,
        format: AudioFormat,
    ) -> std::result::Result<OfflineGraph, GraphConfigError> {
        let builder = GraphBuilder::new(format);
        let builder = match self {
            ChainSpec::Identity => builder,
            ChainSpec::Reverb { preset, wet_dry } => {
                if !(0.0..=100.0).contains(wet_dry) {
                    return Err(GraphConfigError::InvalidParameter(format!(
                        "reverb wet/dry mix must be in [0, 100], got {wet_dry}"
                    )));
                }
                let units: Vec<Box<dyn Effect + Send>> = (0..format.channels)
                    .map(|_| {
                        Box::new(Reverb::new(format.sample_rate, *preset, *wet_dry))
                            as Box<dyn Effect + Send>
                    })
                    .collect();
                builder.stage(units)?
            }
            ChainSpec::Rate { multiplier } => builder.rate(*multiplier)?,
        };
        Ok(builder.build())
    }
}

impl fmt::Display for ChainSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainSpec::Identity => write!(f, "identity"),
            ChainSpec::Reverb { preset, wet_dry } => {
                write!(f, "reverb:{}:{wet_dry}", preset_name(*preset))
            }
            ChainSpec::Rate { multiplier } => write!(f, "rate:{multiplier}"),
        }
    }
}

fn preset_name(preset: ReverbPreset) -> &'static str {
    match preset {
        ReverbPreset::SmallRoom => "small-room",
        ReverbPreset::MediumHall => "medium-hall",
        ReverbPreset::LargeHall => "large-hall",
    }
}

fn parse_preset(name: &str) -> Result<ReverbPreset, String> {
    match name {
        "small-room" => Ok(ReverbPreset::SmallRoom),
        "medium-hall" => Ok(ReverbPreset::MediumHall),
        "large-hall" => Ok(ReverbPreset::LargeHall),
        other => Err(format!(
            "unknown reverb preset '{other}' (expected small-room, medium-hall, or large-hall)"
        )),
    }
}

impl FromStr for ChainSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let head = parts.next().unwrap_or_default();
        match head {
            "identity" | "none" => Ok(ChainSpec::Identity),
            "reverb" => {
                let preset = match parts.next() {
                    Some(name) => parse_preset(name)?,
                    None => ReverbPreset::default(),
                };
                let wet_dry = match parts.next() {
                    Some(mix) => mix
                        .parse::<f32>()
                        .map_err(|_| format!("invalid reverb mix '{mix}'"))?,
                    None => 50.0,
                };
                Ok(ChainSpec::Reverb { preset, wet_dry })
            }
            "rate" => {
                let multiplier = parts
                    .next()
                    .ok_or_else(|| "rate chain needs a multiplier, e.g. rate:1.5".to_string())?
                    .parse::<f64>()
                    .map_err(|_| "invalid rate multiplier".to_string())?;
                Ok(ChainSpec::Rate { multiplier })
            }
            other => Err(format!(
                "unknown chain '{other}' (expected identity, reverb, or rate)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_specs() {
        assert_eq!("identity".parse::<ChainSpec>().unwrap(), ChainSpec::Identity);
        assert_eq!("none".parse::<ChainSpec>().unwrap(), ChainSpec::Identity);
        assert_eq!(
            "reverb".parse::<ChainSpec>().unwrap(),
            ChainSpec::Reverb {
                preset: ReverbPreset::MediumHall,
                wet_dry: 50.0
            }
        );
        assert_eq!(
            "reverb:large-hall:80".parse::<ChainSpec>().unwrap(),
            ChainSpec::Reverb {
                preset: ReverbPreset::LargeHall,
                wet_dry: 80.0
            }
        );
        assert_eq!(
            "rate:1.5".parse::<ChainSpec>().unwrap(),
            ChainSpec::Rate { multiplier: 1.5 }
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("flanger".parse::<ChainSpec>().is_err());
        assert!("reverb:cathedral".parse::<ChainSpec>().is_err());
        assert!("rate".parse::<ChainSpec>().is_err());
        assert!("rate:fast".parse::<ChainSpec>().is_err());
    }

    #[test]
    fn out_of_range_mix_is_a_config_error() {
        let format = AudioFormat::new(48000.0, 2).unwrap();
        let spec = ChainSpec::Reverb {
            preset: ReverbPreset::MediumHall,
            wet_dry: 140.0,
        };
        assert!(matches!(
            spec.build_graph(format),
            Err(GraphConfigError::InvalidParameter(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        for spec in [
            ChainSpec::Identity,
            ChainSpec::Reverb {
                preset: ReverbPreset::SmallRoom,
                wet_dry: 25.0,
            },
            ChainSpec::Rate { multiplier: 0.75 },
        ] {
            let rendered = spec.to_string();
            assert_eq!(rendered.parse::<ChainSpec>().unwrap(), spec);
        }
    }
}
