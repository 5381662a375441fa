//! Split, render, and reassemble a source in one pass.
//!
//! The export flow renders the source interval as independent segment files
//! next to the output, then concatenates them into the final track. Segment
//! files are kept unless `--clean` is given, so a failed run leaves its
//! partial work inspectable.

use clap::Args;
use corte_io::probe;
use corte_render::{ChainSpec, Composer, DEFAULT_SEGMENT_LENGTH, SegmentPlan, Segmenter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct ExportArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Effect chain applied per segment
    #[arg(short, long, default_value = "identity")]
    chain: ChainSpec,

    /// Segment length in seconds
    #[arg(short = 'l', long, default_value_t = DEFAULT_SEGMENT_LENGTH)]
    segment_length: f64,

    /// Remove the intermediate segment files after a successful export
    #[arg(long)]
    clean: bool,
}

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let info = probe(&args.input)?;
    let plan = SegmentPlan::Interval {
        from_secs: 0.0,
        to_secs: info.duration_secs,
        segment_length: args.segment_length,
    };

    let out_dir = args
        .output
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = args
        .output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".into());

    let total = plan.intervals()?.len();
    println!(
        "Exporting {} ({:.3}s) in {} segment(s)...",
        args.input.display(),
        info.duration_secs,
        total
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments")?
            .progress_chars("##-"),
    );

    let segmenter = Segmenter::new(args.chain);
    let segments = segmenter.run_with(&args.input, &plan, &out_dir, &stem, "wav", |_| {
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    let paths: Vec<PathBuf> = segments.iter().map(|s| s.path.clone()).collect();
    let frames = Composer::new().concatenate(&paths, &ChainSpec::Identity, &args.output)?;

    if args.clean {
        for path in &paths {
            std::fs::remove_file(path)?;
        }
    }

    println!("{}: {frames} frames", args.output.display());
    Ok(())
}
