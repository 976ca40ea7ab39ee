#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! # ligsieve library
//!
//! Sequential filtering of virtual screening ligand libraries. Molecules are
//! read from SMILES files and removed when they have too many rotatable
//! bonds, too much polar surface, match a PAINS alert or break the rule of
//! five. The survivors are reduced to a diverse subset by MaxMin picking on
//! Morgan fingerprints.
//!
//! Descriptor tables and run summaries are returned as Polars DataFrames.

pub mod alerts;
pub mod chem;
pub mod descriptors;
pub mod diversity;
mod error;
pub mod fingerprint;
pub mod io;
pub mod pipeline;
pub mod settings;
mod utils;

// Re-export key public types
pub use alerts::{Alert, AlertCatalog, PainsFamily};
pub use chem::{parse_smiles, Molecule, Smarts};
pub use descriptors::{descriptor_frame, Descriptors};
pub use diversity::MaxMinPicker;
pub use error::{LigError, Result, SmartsError, SmilesError};
pub use fingerprint::MorganFingerprint;
pub use pipeline::{ligand_preparation, prepare_all, PipelineReport, Stage};
pub use settings::FilterSettings;
pub use utils::{run_with_threads, write_df_to_file, DataFrameFileType};
