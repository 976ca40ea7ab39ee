//! Sequential ligand filtering and diversity picking over target folders.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::alerts::AlertCatalog;
use crate::chem::Molecule;
use crate::descriptors::{
    descriptor_frame, mol_logp, num_h_acceptors, num_h_donors, num_rotatable_bonds, tpsa,
};
use crate::diversity::pick_diverse;
use crate::error::{LigError, Result};
use crate::fingerprint::MorganFingerprint;
use crate::io::{read_smiles_file, write_smiles_file};
use crate::settings::FilterSettings;
use crate::utils::{run_with_threads, write_df_to_file, DataFrameFileType};

/// File holding the diverse subset, in pick order.
pub const DIVERSE_FILE: &str = "ligs_diversified.smi";

/// One filtering step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// At most `max_rotatable_bonds` rotatable bonds
    RotatableBonds,
    /// TPSA of at most `max_tpsa`
    Tpsa,
    /// No alert of the catalogue matches
    Pains,
    /// No rule of five violation
    Ro5,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 4] = [Stage::RotatableBonds, Stage::Tpsa, Stage::Pains, Stage::Ro5];

    /// File the survivors of this stage are written to.
    pub fn output_file(&self) -> &'static str {
        match self {
            Stage::RotatableBonds => "RotBonds_filtered.smi",
            Stage::Tpsa => "RotTPSA.smi",
            Stage::Pains => "PAINs_filtered.smi",
            Stage::Ro5 => "actives_filtered.smi",
        }
    }

    fn passes(&self, mol: &Molecule, settings: &FilterSettings, catalog: &AlertCatalog) -> bool {
        match self {
            Stage::RotatableBonds => num_rotatable_bonds(mol) <= settings.max_rotatable_bonds,
            Stage::Tpsa => tpsa(mol) <= settings.max_tpsa,
            Stage::Pains => !catalog.has_match(mol),
            Stage::Ro5 => {
                mol.exact_mass() <= settings.max_mol_weight
                    && mol_logp(mol) <= settings.max_logp
                    && num_h_donors(mol) <= settings.max_hbd
                    && num_h_acceptors(mol) <= settings.max_hba
            }
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Stage::RotatableBonds => write!(f, "RotatableBonds"),
            Stage::Tpsa => write!(f, "TPSA"),
            Stage::Pains => write!(f, "PAINs"),
            Stage::Ro5 => write!(f, "Ro5"),
        }
    }
}

/// Outcome of preparing one target folder.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Target folder
    pub folder: PathBuf,
    /// Molecules read from the input file
    pub input: usize,
    /// Survivors after each stage that ran
    pub stage_counts: Vec<(Stage, usize)>,
    /// Size of the diverse subset, `None` if picking never ran
    pub picked: Option<usize>,
    /// Stage that removed the last molecule
    pub emptied_at: Option<Stage>,
}

impl PipelineReport {
    fn new(folder: &Path, input: usize) -> Self {
        PipelineReport {
            folder: folder.to_path_buf(),
            input,
            stage_counts: Vec::new(),
            picked: None,
            emptied_at: None,
        }
    }

    /// Number of molecules left after `stage`, if it ran.
    pub fn count_after(&self, stage: Stage) -> Option<usize> {
        self.stage_counts
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|&(_, n)| n)
    }
}

/// Alert catalogue described by the settings: the selected PAINS families
/// followed by any extra alerts file.
pub fn build_catalog(settings: &FilterSettings) -> Result<AlertCatalog> {
    let mut catalog = AlertCatalog::pains(&settings.pains_families)?;
    if let Some(path) = &settings.extra_alerts {
        catalog.load_file(path)?;
    }
    debug!("Screening against {} alerts", catalog.len());
    Ok(catalog)
}

/// Filter the library of one folder and pick a diverse subset of the survivors.
///
/// Every stage writes its survivors next to the input file. When a stage
/// leaves nothing, a warning is logged and the remaining stages are skipped.
/// The picker reads the molecules back from the last stage's file.
pub fn ligand_preparation(
    folder: &Path,
    settings: &FilterSettings,
    catalog: &AlertCatalog,
) -> Result<PipelineReport> {
    let mols = read_smiles_file(&folder.join(&settings.input_file), settings.title_line)?;
    let mut report = PipelineReport::new(folder, mols.len());

    let mut current = mols;
    for stage in Stage::ALL {
        current = current
            .into_par_iter()
            .filter(|mol| stage.passes(mol, settings, catalog))
            .collect();
        write_smiles_file(&folder.join(stage.output_file()), &current)?;
        debug!(
            "{}: {} molecules left after {stage} filtering",
            folder.display(),
            current.len()
        );
        report.stage_counts.push((stage, current.len()));

        if current.is_empty() {
            warn!("{}: No molecules left after {stage} filtering", folder.display());
            report.emptied_at = Some(stage);
            return Ok(report);
        }
    }

    let survivors = read_smiles_file(&folder.join(Stage::Ro5.output_file()), true)?;
    let fps: Vec<MorganFingerprint> = survivors
        .par_iter()
        .map(|mol| MorganFingerprint::new(mol, settings.morgan_radius))
        .collect();
    let pick_size = settings.pick_count.min(fps.len());
    let picks = pick_diverse(&fps, pick_size, settings.pick_seed)?;

    write_smiles_file(
        &folder.join(DIVERSE_FILE),
        picks.iter().map(|&i| &survivors[i]),
    )?;
    info!(
        "{}: picked {} of {} molecules",
        folder.display(),
        picks.len(),
        survivors.len()
    );
    report.picked = Some(picks.len());
    Ok(report)
}

/// Sub-directories of `master` that contain the input file, sorted by path.
pub fn target_folders(master: &Path, settings: &FilterSettings) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(master).map_err(|e| LigError::io(master, e))?;
    let mut folders = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LigError::io(master, e))?.path();
        if !path.is_dir() {
            continue;
        }
        if !path.join(&settings.input_file).is_file() {
            warn!("{}: no {} found, skipping", path.display(), settings.input_file);
            continue;
        }
        folders.push(path);
    }
    folders.sort();
    Ok(folders)
}

/// Run [`ligand_preparation`] on every target folder of `master` in parallel.
///
/// Folders that fail are logged and left out of the reports. Returns the
/// reports sorted by folder and a summary table with one row per report.
pub fn prepare_all(
    master: &Path,
    settings: &FilterSettings,
    num_threads: usize,
) -> Result<(Vec<PipelineReport>, DataFrame)> {
    let catalog = build_catalog(settings)?;
    let folders = target_folders(master, settings)?;
    info!("Preparing {} target folders", folders.len());

    let results: Vec<(PathBuf, Result<PipelineReport>)> = run_with_threads(num_threads, || {
        folders
            .par_iter()
            .map(|folder| (folder.clone(), ligand_preparation(folder, settings, &catalog)))
            .collect()
    })?;

    let reports: Vec<PipelineReport> = results
        .into_iter()
        .filter_map(|(folder, result)| match result {
            Ok(report) => Some(report),
            Err(e) => {
                error!("{}: {e}", folder.display());
                None
            }
        })
        .collect();
    let summary = summary_frame(&reports)?;
    Ok((reports, summary))
}

/// One row per report with the survivor count of every stage.
pub fn summary_frame(reports: &[PipelineReport]) -> Result<DataFrame> {
    let stage_column = |stage: Stage| {
        reports
            .iter()
            .map(|r| r.count_after(stage).map(|n| n as u32))
            .collect::<Vec<Option<u32>>>()
    };
    let df = df!(
        "folder" => reports.iter().map(|r| folder_name(&r.folder)).collect::<Vec<String>>(),
        "input" => reports.iter().map(|r| r.input as u32).collect::<Vec<u32>>(),
        "rotatable_bonds" => stage_column(Stage::RotatableBonds),
        "tpsa" => stage_column(Stage::Tpsa),
        "pains" => stage_column(Stage::Pains),
        "ro5" => stage_column(Stage::Ro5),
        "picked" => reports.iter().map(|r| r.picked.map(|n| n as u32)).collect::<Vec<Option<u32>>>(),
        "emptied_at" => reports.iter().map(|r| r.emptied_at.map(|s| s.to_string())).collect::<Vec<Option<String>>>(),
    )?;
    Ok(df)
}

/// Write the descriptor table of a folder's input library as `descriptors.<ext>`.
pub fn write_descriptor_table(
    folder: &Path,
    settings: &FilterSettings,
    catalog: &AlertCatalog,
    file_type: DataFrameFileType,
) -> Result<PathBuf> {
    let mols = read_smiles_file(&folder.join(&settings.input_file), settings.title_line)?;
    let mut df = descriptor_frame(&mols, catalog)?;
    write_df_to_file(&mut df, &folder.join("descriptors"), file_type)
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map_or_else(|| folder.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Copy the fixture library into a scratch directory the pipeline can write to.
    fn scratch_library() -> TempDir {
        let root = env!("CARGO_MANIFEST_DIR");
        let source = PathBuf::from(format!("{}/{}", root, "test-data/library"));
        let dir = tempfile::tempdir().unwrap();
        copy_dir(&source, dir.path());
        dir
    }

    fn copy_dir(from: &Path, to: &Path) {
        std::fs::create_dir_all(to).unwrap();
        for entry in std::fs::read_dir(from).unwrap() {
            let path = entry.unwrap().path();
            let target = to.join(path.file_name().unwrap());
            if path.is_dir() {
                copy_dir(&path, &target);
            } else {
                std::fs::copy(&path, &target).unwrap();
            }
        }
    }

    fn names_in(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(|l| l.split(' ').nth(1).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_every_stage_removes_one() {
        let dir = scratch_library();
        let folder = dir.path().join("target_a");
        let settings = FilterSettings::default();
        let catalog = build_catalog(&settings).unwrap();

        let report = ligand_preparation(&folder, &settings, &catalog).unwrap();
        assert_eq!(report.input, 10);
        assert_eq!(report.count_after(Stage::RotatableBonds), Some(9));
        assert_eq!(report.count_after(Stage::Tpsa), Some(8));
        assert_eq!(report.count_after(Stage::Pains), Some(7));
        assert_eq!(report.count_after(Stage::Ro5), Some(6));
        assert_eq!(report.picked, Some(6));
        assert_eq!(report.emptied_at, None);

        assert!(!names_in(&folder.join("RotBonds_filtered.smi")).contains(&"hexadecane".to_string()));
        assert!(!names_in(&folder.join("RotTPSA.smi")).contains(&"triamide".to_string()));
        assert!(!names_in(&folder.join("PAINs_filtered.smi")).contains(&"catechol".to_string()));
        let ro5 = names_in(&folder.join("actives_filtered.smi"));
        assert!(!ro5.contains(&"hexaiodobenzene".to_string()));
        assert_eq!(ro5[0], "ethanol");

        let mut picked = names_in(&folder.join(DIVERSE_FILE));
        picked.sort();
        let mut expected = ro5.clone();
        expected.sort();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_stereo_text_is_preserved() {
        let dir = scratch_library();
        let folder = dir.path().join("target_a");
        let settings = FilterSettings::default();
        ligand_preparation(&folder, &settings, &build_catalog(&settings).unwrap()).unwrap();
        let content = std::fs::read_to_string(folder.join("actives_filtered.smi")).unwrap();
        assert!(content.starts_with("SMILES Name\n"));
        assert!(content.contains("CC(C)Cc1ccc(cc1)[C@@H](C)C(=O)O ibuprofen"));
    }

    #[test]
    fn test_pick_count_limits_output() {
        let dir = scratch_library();
        let folder = dir.path().join("target_a");
        let settings = FilterSettings {
            pick_count: 2,
            ..Default::default()
        };
        let report = ligand_preparation(&folder, &settings, &build_catalog(&settings).unwrap()).unwrap();
        assert_eq!(report.picked, Some(2));
        assert_eq!(names_in(&folder.join(DIVERSE_FILE)).len(), 2);

        // same seed, same picks
        let first = std::fs::read_to_string(folder.join(DIVERSE_FILE)).unwrap();
        ligand_preparation(&folder, &settings, &build_catalog(&settings).unwrap()).unwrap();
        assert_eq!(std::fs::read_to_string(folder.join(DIVERSE_FILE)).unwrap(), first);
    }

    #[test]
    fn test_emptied_folder_stops() {
        let dir = scratch_library();
        let folder = dir.path().join("target_b");
        let settings = FilterSettings::default();
        let report = ligand_preparation(&folder, &settings, &build_catalog(&settings).unwrap()).unwrap();

        assert_eq!(report.emptied_at, Some(Stage::Tpsa));
        assert_eq!(report.count_after(Stage::Pains), None);
        assert_eq!(report.picked, None);
        assert_eq!(
            std::fs::read_to_string(folder.join("RotTPSA.smi")).unwrap(),
            "SMILES Name\n"
        );
        assert!(!folder.join("PAINs_filtered.smi").exists());
        assert!(!folder.join(DIVERSE_FILE).exists());
    }

    #[test]
    fn test_prepare_all() {
        let dir = scratch_library();
        let settings = FilterSettings::default();
        let (reports, summary) = prepare_all(dir.path(), &settings, 2).unwrap();

        // target_c has no library file and notes.txt is not a folder
        let folders: Vec<String> = reports.iter().map(|r| folder_name(&r.folder)).collect();
        assert_eq!(folders, vec!["target_a", "target_b"]);

        assert_eq!(summary.shape(), (2, 8));
        let emptied = summary.column("emptied_at").unwrap().str().unwrap();
        assert_eq!(emptied.get(0), None);
        assert_eq!(emptied.get(1), Some("TPSA"));
        let picked = summary.column("picked").unwrap().u32().unwrap();
        assert_eq!(picked.get(0), Some(6));
        assert_eq!(picked.get(1), None);
    }

    #[test]
    fn test_extra_alerts_extend_catalog() {
        let root = env!("CARGO_MANIFEST_DIR");
        let settings = FilterSettings {
            pains_families: vec![],
            extra_alerts: Some(PathBuf::from(format!("{}/{}", root, "test-data/extra_alerts.tsv"))),
            ..Default::default()
        };
        let catalog = build_catalog(&settings).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_missing_master_folder() {
        let settings = FilterSettings::default();
        assert!(matches!(
            prepare_all(Path::new("no/such/folder"), &settings, 1),
            Err(LigError::Io { .. })
        ));
    }

    #[test]
    fn test_descriptor_table() {
        let dir = scratch_library();
        let folder = dir.path().join("target_a");
        let settings = FilterSettings::default();
        let catalog = build_catalog(&settings).unwrap();
        let path =
            write_descriptor_table(&folder, &settings, &catalog, DataFrameFileType::Csv).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content.lines().next(),
            Some("name,smiles,rotatable_bonds,tpsa,exact_mw,logp,hbd,hba,pains")
        );
        assert_eq!(content.lines().count(), 11);
    }
}
