//! Structural alerts for pan-assay interference compounds (PAINS).
//!
//! The built-in patterns of the three published PAINS families (Baell &
//! Holloway, J. Med. Chem. 2010) are compiled in from `data/pains.tsv`.
//! Additional alerts can be loaded from a tab separated `name<TAB>SMARTS` file.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::chem::{Molecule, Smarts};
use crate::error::{LigError, Result};

/// PAINS family, ordered from the most to the least frequent offenders.
#[derive(clap::ValueEnum, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PainsFamily {
    /// More than 150 hits in the AlphaScreen study
    A,
    /// 15 to 150 hits
    B,
    /// Fewer than 15 hits
    C,
}

impl std::fmt::Display for PainsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PainsFamily::A => write!(f, "PAINS_A"),
            PainsFamily::B => write!(f, "PAINS_B"),
            PainsFamily::C => write!(f, "PAINS_C"),
        }
    }
}

/// Built-in alerts as `family<TAB>name<TAB>SMARTS` lines.
const PAINS_DEFINITIONS: &str = include_str!("../data/pains.tsv");
const PAINS_SOURCE: &str = "data/pains.tsv";

impl PainsFamily {
    fn letter(&self) -> &'static str {
        match self {
            PainsFamily::A => "A",
            PainsFamily::B => "B",
            PainsFamily::C => "C",
        }
    }

    /// `(name, SMARTS)` pairs of the built-in alerts of this family.
    fn definitions(&self) -> Result<Vec<(&'static str, &'static str)>> {
        let mut definitions = Vec::new();
        for (i, line) in alert_lines(PAINS_DEFINITIONS) {
            let mut fields = line.splitn(3, '\t');
            let (Some(family), Some(name), Some(smarts)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(LigError::AlertFile {
                    path: PAINS_SOURCE.into(),
                    line: i + 1,
                });
            };
            if family == self.letter() {
                definitions.push((name.trim(), smarts.trim()));
            }
        }
        Ok(definitions)
    }
}

/// Numbered lines that are neither blank nor `#` comments.
fn alert_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// A named substructure alert.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Alert name, e.g. `quinone_A`
    pub name: String,
    /// Catalogue the alert came from, `None` for user supplied alerts
    pub family: Option<PainsFamily>,
    /// Compiled substructure query
    pub query: Smarts,
}

/// An ordered collection of alerts; a molecule fails if any alert matches.
#[derive(Debug, Clone, Default)]
pub struct AlertCatalog {
    alerts: Vec<Alert>,
}

impl AlertCatalog {
    /// An empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding the built-in alerts of the given families.
    pub fn pains(families: &[PainsFamily]) -> Result<Self> {
        let mut catalog = Self::new();
        for &family in families {
            catalog.add_family(family)?;
        }
        Ok(catalog)
    }

    /// Append the built-in alerts of one family.
    pub fn add_family(&mut self, family: PainsFamily) -> Result<()> {
        let definitions = family.definitions()?;
        for &(name, smarts) in &definitions {
            self.alerts.push(Alert {
                name: name.to_string(),
                family: Some(family),
                query: Smarts::new(smarts)?,
            });
        }
        debug!("Loaded {} alerts from {family}", definitions.len());
        Ok(())
    }

    /// Add a user defined alert.
    pub fn add(&mut self, name: &str, smarts: &str) -> Result<()> {
        self.alerts.push(Alert {
            name: name.to_string(),
            family: None,
            query: Smarts::new(smarts)?,
        });
        Ok(())
    }

    /// Append alerts from a `name<TAB>SMARTS` file. Blank lines and lines
    /// starting with `#` are ignored. Returns the number of alerts added.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| LigError::io(path, e))?;
        let mut added = 0;
        for (i, line) in alert_lines(&content) {
            let Some((name, smarts)) = line.split_once('\t') else {
                return Err(LigError::AlertFile {
                    path: path.to_path_buf(),
                    line: i + 1,
                });
            };
            self.add(name.trim(), smarts.trim())?;
            added += 1;
        }
        debug!("Loaded {added} alerts from {}", path.display());
        Ok(added)
    }

    /// Number of alerts in the catalogue.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether the catalogue holds no alerts.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Alerts in matching order.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Whether any alert matches the molecule.
    pub fn has_match(&self, mol: &Molecule) -> bool {
        self.first_match(mol).is_some()
    }

    /// The first alert in catalogue order that matches the molecule.
    pub fn first_match(&self, mol: &Molecule) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.query.has_match(mol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn all_pains() -> AlertCatalog {
        AlertCatalog::pains(&[PainsFamily::A, PainsFamily::B, PainsFamily::C]).unwrap()
    }

    fn first(catalog: &AlertCatalog, smiles: &str) -> Option<String> {
        let mol = parse_smiles(smiles).unwrap();
        catalog.first_match(&mol).map(|a| a.name.clone())
    }

    #[test]
    fn test_builtin_catalogue() {
        let sizes: Vec<usize> = [PainsFamily::A, PainsFamily::B, PainsFamily::C]
            .iter()
            .map(|&f| AlertCatalog::pains(&[f]).unwrap().len())
            .collect();
        assert_eq!(sizes, vec![16, 10, 10]);
        assert_eq!(all_pains().len(), 36);

        let catalog = all_pains();
        let family_of = |name: &str| {
            catalog
                .alerts()
                .iter()
                .find(|a| a.name == name)
                .and_then(|a| a.family)
        };
        assert_eq!(family_of("indol_3yl_alk"), Some(PainsFamily::A));
        assert_eq!(family_of("amino_acridine_A"), Some(PainsFamily::A));
        assert_eq!(family_of("quinone_B"), Some(PainsFamily::B));
        assert_eq!(family_of("hydroquin_A"), Some(PainsFamily::C));
    }

    #[test]
    fn test_one_offender_per_family() {
        let hit = |family, smiles| first(&AlertCatalog::pains(&[family]).unwrap(), smiles);
        assert_eq!(hit(PainsFamily::A, "O=C1C=CC(=O)C=C1").as_deref(), Some("quinone_A"));
        assert_eq!(hit(PainsFamily::B, "O=C1C=CC(=O)c2ccccc12").as_deref(), Some("quinone_B"));
        assert_eq!(hit(PainsFamily::B, "CC(=S)C").as_deref(), Some("thio_ketone"));
        assert_eq!(hit(PainsFamily::C, "Oc1ccc(O)cc1").as_deref(), Some("hydroquin_A"));
        assert_eq!(hit(PainsFamily::A, "O=C1C=CC(=O)c2ccccc12"), None);
    }

    #[test]
    fn test_known_offenders() {
        let catalog = all_pains();
        assert_eq!(first(&catalog, "O=C1C=CC(=O)C=C1").as_deref(), Some("quinone_A"));
        assert_eq!(first(&catalog, "Oc1ccccc1O").as_deref(), Some("catechol_A"));
        assert_eq!(first(&catalog, "c1ccc(cc1)N=Nc1ccccc1").as_deref(), Some("azo_A"));
        assert_eq!(first(&catalog, "Oc1ccc(O)cc1").as_deref(), Some("hydroquin_A"));
        assert_eq!(
            first(&catalog, "Cc1ccc(C)n1-c1ccccc1").as_deref(),
            Some("pyrrole_A")
        );
        assert_eq!(
            first(&catalog, "Cc1ccc(C)n1c1ccccc1").as_deref(),
            Some("pyrrole_A")
        );
    }

    #[test]
    fn test_clean_molecules() {
        let catalog = all_pains();
        for smiles in [
            "CCO",
            "CC(=O)Oc1ccccc1C(=O)O",
            "Cn1cnc2c1c(=O)n(C)c(=O)n2C",
            "CC(C)Cc1ccc(cc1)C(C)C(=O)O",
        ] {
            assert_eq!(first(&catalog, smiles), None, "{smiles}");
        }
    }

    #[test]
    fn test_family_selection() {
        let only_a = AlertCatalog::pains(&[PainsFamily::A]).unwrap();
        assert!(!only_a.has_match(&parse_smiles("Oc1ccc(O)cc1").unwrap()));
        assert!(AlertCatalog::new().is_empty());
    }

    #[test]
    fn test_load_file() {
        let root = env!("CARGO_MANIFEST_DIR");
        let path = format!("{}/{}", root, "test-data/extra_alerts.tsv");
        let mut catalog = AlertCatalog::new();
        let added = catalog.load_file(Path::new(&path)).unwrap();
        assert_eq!(added, 2);
        assert_eq!(first(&catalog, "CC(=O)Cl").as_deref(), Some("acyl_halide"));
        assert_eq!(first(&catalog, "CCCC"), None);
        assert!(catalog.alerts().iter().all(|a| a.family.is_none()));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        std::fs::write(&path, "# comment\nacyl_halide [CX3](=O)[Cl,Br]\n").unwrap();
        let err = AlertCatalog::new().load_file(&path).unwrap_err();
        assert!(matches!(err, LigError::AlertFile { line: 2, .. }));
    }
}
