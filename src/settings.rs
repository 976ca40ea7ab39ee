//! Filter thresholds and file names for the ligand preparation pipeline.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::alerts::PainsFamily;
use crate::error::{LigError, Result};

/// Name of the library file looked up in every target folder
pub const INPUT_FILE: &str = "actives_final.smi";
/// Rotatable bond cutoff (Veber et al. 2002)
pub const MAX_ROTATABLE_BONDS: u32 = 10;
/// Polar surface area cutoff in Å² (Veber et al. 2002)
pub const MAX_TPSA: f64 = 140.0;
/// Lipinski (1997): molecular weight below 500 Da
pub const MAX_MOL_WEIGHT: f64 = 500.0;
/// Lipinski (1997): logP below 5
pub const MAX_LOGP: f64 = 5.0;
/// Lipinski (1997): at most 5 hydrogen bond donors
pub const MAX_HBD: u32 = 5;
/// Lipinski (1997): at most 10 hydrogen bond acceptors
pub const MAX_HBA: u32 = 10;
/// Size of the diverse subset
pub const PICK_COUNT: usize = 30;
/// Seed of the first MaxMin pick
pub const PICK_SEED: u64 = 23;
/// Morgan fingerprint radius
pub const MORGAN_RADIUS: u32 = 3;

/// Thresholds and file names of the ligand preparation pipeline.
///
/// Every field has a default, so a settings file only lists what it changes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    /// Library file name inside each target folder
    pub input_file: String,
    /// Whether the first line of the library file is a header
    pub title_line: bool,
    /// Most rotatable bonds a molecule may have
    pub max_rotatable_bonds: u32,
    /// Upper bound on TPSA in Å²
    pub max_tpsa: f64,
    /// Built-in PAINS families to screen against
    pub pains_families: Vec<PainsFamily>,
    /// Optional `name<TAB>SMARTS` file of extra alerts
    pub extra_alerts: Option<PathBuf>,
    /// Upper bound on the monoisotopic mass
    pub max_mol_weight: f64,
    /// Upper bound on Wildman-Crippen logP
    pub max_logp: f64,
    /// Most hydrogen bond donors allowed
    pub max_hbd: u32,
    /// Most hydrogen bond acceptors allowed
    pub max_hba: u32,
    /// Size of the diverse subset
    pub pick_count: usize,
    /// Seed for the first MaxMin pick
    pub pick_seed: u64,
    /// Morgan fingerprint radius
    pub morgan_radius: u32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            input_file: INPUT_FILE.to_string(),
            title_line: true,
            max_rotatable_bonds: MAX_ROTATABLE_BONDS,
            max_tpsa: MAX_TPSA,
            pains_families: vec![PainsFamily::A, PainsFamily::B, PainsFamily::C],
            extra_alerts: None,
            max_mol_weight: MAX_MOL_WEIGHT,
            max_logp: MAX_LOGP,
            max_hbd: MAX_HBD,
            max_hba: MAX_HBA,
            pick_count: PICK_COUNT,
            pick_seed: PICK_SEED,
            morgan_radius: MORGAN_RADIUS,
        }
    }
}

impl FilterSettings {
    /// Read settings from a TOML file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LigError::io(path, e))?;
        toml::from_str(&content).map_err(|source| LigError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
