//! TOML job files for the compose command.

use corte_io::probe;
use corte_render::{Timeline, TimelineClip, VolumeAutomation, VolumeMarker, VolumeSegment};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A timeline composition described in a TOML file.
///
/// ```toml
/// output = "mix.wav"
///
/// [[clip]]
/// source = "intro.wav"
///
/// [[clip]]
/// source = "verse.wav"
/// at = 12.5
/// from = 1.0
/// to = 9.0
///
/// [[ramp]]
/// start = 0.0
/// end = 2.0
/// from_gain = 0.0
/// to_gain = 1.0
/// ```
#[derive(Debug, Deserialize)]
pub struct ComposeJob {
    /// Destination file; a CLI `--output` flag overrides it.
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub clip: Vec<ClipEntry>,
    #[serde(default)]
    pub ramp: Vec<RampEntry>,
}

/// One clip placement. Without `at`, the clip follows the previous one.
#[derive(Debug, Deserialize)]
pub struct ClipEntry {
    pub source: PathBuf,
    pub at: Option<f64>,
    pub from: Option<f64>,
    pub to: Option<f64>,
}

/// One linear volume ramp on the destination timeline.
#[derive(Debug, Deserialize)]
pub struct RampEntry {
    pub start: f64,
    pub end: f64,
    pub from_gain: f32,
    pub to_gain: f32,
}

impl ComposeJob {
    /// Parse a job file from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Resolve clip placements into a timeline. Paths are taken relative to
    /// `base_dir`, and unplaced clips are chained after their predecessor.
    pub fn timeline(&self, base_dir: &Path) -> anyhow::Result<Timeline> {
        let mut clips = Vec::with_capacity(self.clip.len());
        let mut cursor = 0.0f64;
        for entry in &self.clip {
            let source = if entry.source.is_absolute() {
                entry.source.clone()
            } else {
                base_dir.join(&entry.source)
            };
            let start_secs = entry.at.unwrap_or(cursor);
            let source_range = match (entry.from, entry.to) {
                (None, None) => None,
                (from, to) => {
                    let info = probe(&source)?;
                    Some((from.unwrap_or(0.0), to.unwrap_or(info.duration_secs)))
                }
            };
            let duration = match source_range {
                Some((from, to)) => to - from,
                None => probe(&source)?.duration_secs,
            };
            cursor = start_secs + duration;
            clips.push(TimelineClip {
                source,
                start_secs,
                source_range,
            });
        }
        Ok(Timeline::new(clips))
    }

    /// Build the validated automation curve, or `None` when no ramps exist.
    pub fn automation(&self) -> anyhow::Result<Option<VolumeAutomation>> {
        if self.ramp.is_empty() {
            return Ok(None);
        }
        let segments = self
            .ramp
            .iter()
            .map(|r| VolumeSegment {
                start: VolumeMarker {
                    time_secs: r.start,
                    gain: r.from_gain,
                },
                end: VolumeMarker {
                    time_secs: r.end,
                    gain: r.to_gain,
                },
            })
            .collect();
        Ok(Some(VolumeAutomation::new(segments)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_job() {
        let job: ComposeJob = toml::from_str(
            r#"
            output = "mix.wav"

            [[clip]]
            source = "a.wav"

            [[clip]]
            source = "b.wav"
            at = 3.0
            from = 0.5
            to = 2.5

            [[ramp]]
            start = 0.0
            end = 1.0
            from_gain = 0.0
            to_gain = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(job.output.as_deref(), Some(Path::new("mix.wav")));
        assert_eq!(job.clip.len(), 2);
        assert_eq!(job.clip[1].at, Some(3.0));
        assert_eq!(job.ramp.len(), 1);
        let automation = job.automation().unwrap().unwrap();
        assert_eq!(automation.segments().len(), 1);
    }

    #[test]
    fn empty_ramp_list_means_no_automation() {
        let job: ComposeJob = toml::from_str(
            r#"
            [[clip]]
            source = "a.wav"
            "#,
        )
        .unwrap();
        assert!(job.automation().unwrap().is_none());
    }

    #[test]
    fn invalid_ramp_gains_are_rejected() {
        let job: ComposeJob = toml::from_str(
            r#"
            [[ramp]]
            start = 0.0
            end = 1.0
            from_gain = 0.0
            to_gain = 2.0
            "#,
        )
        .unwrap();
        assert!(job.automation().is_err());
    }
}
