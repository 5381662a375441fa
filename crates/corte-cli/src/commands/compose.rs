//! Compose a timeline described by a TOML job file.

use crate::job::ComposeJob;
use clap::Args;
use corte_render::{CancelToken, Composer, WavTimelineExporter};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ComposeArgs {
    /// TOML job file describing clips and volume ramps
    #[arg(value_name = "JOB")]
    job: PathBuf,

    /// Output WAV file (overrides the job file's `output`)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: ComposeArgs) -> anyhow::Result<()> {
    let job = ComposeJob::load(&args.job)?;
    let base_dir = args.job.parent().unwrap_or_else(|| Path::new("."));

    let output = args
        .output
        .or_else(|| job.output.clone().map(|p| base_dir.join(p)))
        .ok_or_else(|| anyhow::anyhow!("no output file: pass --output or set `output` in the job"))?;

    let timeline = job.timeline(base_dir)?;
    if timeline.is_empty() {
        anyhow::bail!("job has no clips");
    }
    let automation = job.automation()?;
    tracing::debug!(
        clips = timeline.clips().len(),
        ramps = automation.as_ref().map_or(0, |a| a.segments().len()),
        "job loaded"
    );

    // Ctrl-C requests a cooperative stop; the exporter checks between blocks.
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("cancelling...");
        handler_token.cancel();
    })?;

    Composer::new().compose(
        &timeline,
        automation.as_ref(),
        &WavTimelineExporter::default(),
        &output,
        &cancel,
    )?;

    println!(
        "{}: {} clip(s) composed",
        output.display(),
        timeline.clips().len()
    );
    Ok(())
}
