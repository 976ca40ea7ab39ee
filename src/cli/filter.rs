use clap::Parser;
use ligsieve::pipeline::{build_catalog, prepare_all, write_descriptor_table};
use ligsieve::{write_df_to_file, DataFrameFileType, FilterSettings, LigError, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Folder holding one sub-directory per target, each with its own ligand library
    master_folder: PathBuf,

    /// TOML file overriding the default thresholds and file names
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of threads to use for parallel processing (0 for all cores)
    #[arg(short = 'j', long = "num-threads", default_value_t = 0)]
    num_threads: usize,

    /// Path of the per-folder summary table
    #[arg(short, long)]
    summary: Option<PathBuf>,

    /// Output file type of the summary and descriptor tables
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,

    /// Also write the descriptor table of every input library into its folder
    #[arg(long, default_value_t = false)]
    descriptors: bool,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let master = args
        .master_folder
        .canonicalize()
        .map_err(|e| LigError::io(&args.master_folder, e))?;
    let settings = match &args.config {
        Some(path) => FilterSettings::from_file(path)?,
        None => FilterSettings::default(),
    };
    debug!("Using master folder {}", master.display());
    debug!("{settings:?}");

    let (reports, mut df_summary) = prepare_all(&master, &settings, args.num_threads)?;
    info!("Prepared {} target folders\n{}", reports.len(), df_summary);

    if args.descriptors {
        let catalog = build_catalog(&settings)?;
        for report in &reports {
            let path =
                write_descriptor_table(&report.folder, &settings, &catalog, args.output_format)?;
            debug!("Descriptors saved to {}", path.display());
        }
    }

    if let Some(summary) = &args.summary {
        if let Some(parent) = summary.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LigError::io(parent, e))?;
        }
        let path = write_df_to_file(&mut df_summary, summary, args.output_format)?;
        info!("Summary saved to {}", path.display());
    }
    Ok(())
}
