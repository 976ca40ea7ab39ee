use clap::Parser;
use ligsieve::io::read_smiles_file;
use ligsieve::pipeline::build_catalog;
use ligsieve::{
    descriptor_frame, write_df_to_file, DataFrameFileType, FilterSettings, LigError, Result,
};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// SMILES file to describe
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Name of the output file
    #[arg(short = 'f', long = "filename", default_value_t = String::from("descriptors"))]
    filename: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,

    /// TOML settings file selecting the alert catalogue
    #[arg(short, long)]
    config: Option<PathBuf>,

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
    let output_path =
        std::path::absolute(&args.output).map_err(|e| LigError::io(&args.output, e))?;
    let settings = match &args.config {
        Some(path) => FilterSettings::from_file(path)?,
        None => FilterSettings::default(),
    };

    let mols = read_smiles_file(&input_path, !args.no_title_line)?;
    let catalog = build_catalog(&settings)?;
    let mut df_desc = ligsieve::run_with_threads(args.num_threads, || {
        debug!("Using {} thread(s)", rayon::current_num_threads());
        descriptor_frame(&mols, &catalog)
    })??;

    std::fs::create_dir_all(&output_path).map_err(|e| LigError::io(&output_path, e))?;
    let output_file = output_path.join(&args.filename);
    info!("Computed descriptors for {} molecules\n{}", df_desc.height(), df_desc);

    let path = write_df_to_file(&mut df_desc, &output_file, args.output_format)?;
    debug!("Results saved to {}", path.display());
    Ok(())
}
