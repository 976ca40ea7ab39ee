use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{LigError, Result};

/// Run `f` inside a rayon pool with `num_threads` workers (0 uses every core).
pub fn run_with_threads<R, F>(num_threads: usize, f: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()?;
    Ok(pool.install(f))
}

/// Write a DataFrame to `file_path` with the extension of `file_type`.
///
/// Returns the path that was written.
pub fn write_df_to_file(
    df: &mut DataFrame,
    file_path: &Path,
    file_type: DataFrameFileType,
) -> Result<PathBuf> {
    let file_suffix = file_type.to_string();
    let output = file_path.with_extension(file_suffix);
    let mut file = std::fs::File::create(&output).map_err(|e| LigError::io(&output, e))?;
    match file_type {
        DataFrameFileType::Csv => {
            CsvWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Json => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(df)?;
        }
        DataFrameFileType::NDJson => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(df)?;
        }
    }
    Ok(output)
}

/// File format for writing DataFrames.
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum DataFrameFileType {
    /// Comma-separated values
    Csv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
    /// Newline-delimited JSON
    #[value(name = "ndjson")]
    NDJson,
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
            DataFrameFileType::NDJson => write!(f, "ndjson"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_follows_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = df!("name" => ["a", "b"], "count" => [1u32, 2]).unwrap();

        let csv = write_df_to_file(&mut df, &dir.path().join("table"), DataFrameFileType::Csv).unwrap();
        assert_eq!(csv.extension().unwrap(), "csv");
        let content = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(content.lines().next(), Some("name,count"));
        assert_eq!(content.lines().count(), 3);

        let ndjson =
            write_df_to_file(&mut df, &dir.path().join("table.csv"), DataFrameFileType::NDJson)
                .unwrap();
        assert_eq!(ndjson, dir.path().join("table.ndjson"));
        assert_eq!(std::fs::read_to_string(&ndjson).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_thread_pool_size() {
        let n = run_with_threads(2, rayon::current_num_threads).unwrap();
        assert_eq!(n, 2);
    }
}
