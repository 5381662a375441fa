//! Split a source file into per-segment files.

use clap::Args;
use corte_io::probe;
use corte_render::{ChainSpec, DEFAULT_SEGMENT_LENGTH, SegmentPlan, Segmenter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct SplitArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for the segment files (defaults to the input's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Output file stem (defaults to the input's stem)
    #[arg(long)]
    stem: Option<String>,

    /// Effect chain ("identity", "reverb[:preset[:mix]]", "rate:x")
    #[arg(short, long, default_value = "identity")]
    chain: ChainSpec,

    /// Segment length in seconds
    #[arg(short = 'l', long, default_value_t = DEFAULT_SEGMENT_LENGTH)]
    segment_length: f64,

    /// Start of the interval to split, in seconds
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// End of the interval, in seconds (defaults to the source duration)
    #[arg(long)]
    to: Option<f64>,

    /// Render exactly this many segments instead of covering an interval
    #[arg(long, conflicts_with_all = ["from", "to"])]
    count: Option<usize>,
}

pub fn run(args: SplitArgs) -> anyhow::Result<()> {
    let info = probe(&args.input)?;
    let plan = match args.count {
        Some(count) => SegmentPlan::Count {
            start_secs: 0.0,
            segment_length: args.segment_length,
            count,
        },
        None => SegmentPlan::Interval {
            from_secs: args.from,
            to_secs: args.to.unwrap_or(info.duration_secs),
            segment_length: args.segment_length,
        },
    };

    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => args
            .input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let stem = match args.stem {
        Some(stem) => stem,
        None => args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "segment".into()),
    };

    let total = plan.intervals()?.len();
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

    for segment in &segments {
        println!(
            "{}  [{:.3}s - {:.3}s]",
            segment.path.display(),
            segment.start_secs,
            segment.end_secs
        );
    }
    println!("{} segment(s) written", segments.len());
    Ok(())
}
