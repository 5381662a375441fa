//! Concatenate files through a render graph.

use clap::Args;
use corte_render::{ChainSpec, Composer};
use std::path::PathBuf;

#[derive(Args)]
pub struct ConcatArgs {
    /// Input WAV files, in output order
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Effect chain applied while concatenating
    #[arg(short, long, default_value = "identity")]
    chain: ChainSpec,
}

pub fn run(args: ConcatArgs) -> anyhow::Result<()> {
    let frames = Composer::new().concatenate(&args.inputs, &args.chain, &args.output)?;
    println!(
        "{}: {} frames from {} input(s)",
        args.output.display(),
        frames,
        args.inputs.len()
    );
    Ok(())
}
