use clap::Parser;
use ligsieve::diversity::pick_diverse;
use ligsieve::io::{read_smiles_file, write_smiles_file};
use ligsieve::settings::{MORGAN_RADIUS, PICK_COUNT, PICK_SEED};
use ligsieve::{LigError, MorganFingerprint, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// SMILES file to pick from
    #[arg(short, long)]
    input: PathBuf,

    /// SMILES file receiving the picks, in pick order
    #[arg(short, long)]
    output: PathBuf,

    /// Number of molecules to pick; capped at the library size
    #[arg(short = 'n', long = "num-picks", default_value_t = PICK_COUNT)]
    num_picks: usize,

    /// Seed for the first pick
    #[arg(long, default_value_t = PICK_SEED)]
    seed: u64,

    /// Morgan fingerprint radius
    #[arg(long, default_value_t = MORGAN_RADIUS)]
    radius: u32,

    /// The first line of the input is a record, not a header
    #[arg(long = "no-title-line", default_value_t = false)]
    no_title_line: bool,

    /// Number of threads to use for parallel processing (0 for all cores)
    #[arg(short = 'j', long = "num-threads", default_value_t = 0)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let input_path = args
        .input
        .canonicalize()
        .map_err(|e| LigError::io(&args.input, e))?;
    let mols = read_smiles_file(&input_path, !args.no_title_line)?;

    let picks = ligsieve::run_with_threads(args.num_threads, || {
        debug!("Using {} thread(s)", rayon::current_num_threads());
        let fps: Vec<MorganFingerprint> = mols
            .par_iter()
            .map(|mol| MorganFingerprint::new(mol, args.radius))
            .collect();
        pick_diverse(&fps, args.num_picks.min(fps.len()), args.seed)
    })??;

    write_smiles_file(&args.output, picks.iter().map(|&i| &mols[i]))?;
    info!(
        "Picked {} of {} molecules into {}",
        picks.len(),
        mols.len(),
        args.output.display()
    );
    Ok(())
}
