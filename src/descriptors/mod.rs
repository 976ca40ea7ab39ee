//! Physicochemical descriptors used by the filters.

mod crippen;
mod lipinski;
mod tpsa;

pub use crippen::mol_logp;
pub use lipinski::{num_h_acceptors, num_h_donors, num_rotatable_bonds};
pub use tpsa::tpsa;

use polars::prelude::*;
use rayon::prelude::*;

use crate::alerts::AlertCatalog;
use crate::chem::Molecule;
use crate::error::Result;

/// Descriptor values of one molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptors {
    /// Rotatable bonds, strict definition
    pub rotatable_bonds: u32,
    /// Topological polar surface area in Å²
    pub tpsa: f64,
    /// Monoisotopic mass in Da
    pub exact_mw: f64,
    /// Wildman-Crippen logP
    pub logp: f64,
    /// Lipinski hydrogen bond donors
    pub hbd: u32,
    /// Lipinski hydrogen bond acceptors
    pub hba: u32,
}

impl Descriptors {
    /// Compute every descriptor of `mol`.
    pub fn compute(mol: &Molecule) -> Self {
        Descriptors {
            rotatable_bonds: num_rotatable_bonds(mol),
            tpsa: tpsa(mol),
            exact_mw: mol.exact_mass(),
            logp: mol_logp(mol),
            hbd: num_h_donors(mol),
            hba: num_h_acceptors(mol),
        }
    }

    /// Number of broken rule-of-five criteria.
    pub fn ro5_violations(&self, max_mw: f64, max_logp: f64, max_hbd: u32, max_hba: u32) -> u32 {
        [
            self.exact_mw > max_mw,
            self.logp > max_logp,
            self.hbd > max_hbd,
            self.hba > max_hba,
        ]
        .iter()
        .filter(|&&broken| broken)
        .count() as u32
    }
}

/// Descriptor table with one row per molecule and the name of the first
/// matching alert in the `pains` column.
pub fn descriptor_frame(mols: &[Molecule], catalog: &AlertCatalog) -> Result<DataFrame> {
    let rows: Vec<(Descriptors, Option<String>)> = mols
        .par_iter()
        .map(|mol| {
            let alert = catalog.first_match(mol).map(|a| a.name.clone());
            (Descriptors::compute(mol), alert)
        })
        .collect();

    let df = df!(
        "name" => mols.iter().map(|m| m.name.to_owned()).collect::<Vec<String>>(),
        "smiles" => mols.iter().map(|m| m.smiles.to_owned()).collect::<Vec<String>>(),
        "rotatable_bonds" => rows.iter().map(|(d, _)| d.rotatable_bonds).collect::<Vec<u32>>(),
        "tpsa" => rows.iter().map(|(d, _)| d.tpsa).collect::<Vec<f64>>(),
        "exact_mw" => rows.iter().map(|(d, _)| d.exact_mw).collect::<Vec<f64>>(),
        "logp" => rows.iter().map(|(d, _)| d.logp).collect::<Vec<f64>>(),
        "hbd" => rows.iter().map(|(d, _)| d.hbd).collect::<Vec<u32>>(),
        "hba" => rows.iter().map(|(d, _)| d.hba).collect::<Vec<u32>>(),
        "pains" => rows.iter().map(|(_, a)| a.clone()).collect::<Vec<Option<String>>>(),
    )?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::PainsFamily;
    use crate::chem::parse_smiles;

    #[test]
    fn test_aspirin() {
        let aspirin = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let d = Descriptors::compute(&aspirin);
        assert!((d.tpsa - 63.6).abs() < 1e-6);
        assert!((d.exact_mw - 180.042_259).abs() < 1e-4);
        assert_eq!(d.hbd, 1);
        assert_eq!(d.hba, 3);
        assert_eq!(d.ro5_violations(500.0, 5.0, 5, 10), 0);
    }

    #[test]
    fn test_aryl_link_written_or_not() {
        let implicit = parse_smiles("c1ccccc1n1cccc1").unwrap();
        let dashed = parse_smiles("c1ccccc1-n1cccc1").unwrap();
        assert_eq!(Descriptors::compute(&implicit), Descriptors::compute(&dashed));
        assert_eq!(
            crate::fingerprint::MorganFingerprint::new(&implicit, 3),
            crate::fingerprint::MorganFingerprint::new(&dashed, 3)
        );

        let biphenyl = parse_smiles("c1ccccc1c1ccccc1").unwrap();
        assert!(crate::chem::Smarts::new("c-c").unwrap().has_match(&biphenyl));
        assert_eq!(Descriptors::compute(&biphenyl).rotatable_bonds, 1);
    }

    #[test]
    fn test_ro5_violations() {
        let d = Descriptors {
            rotatable_bonds: 4,
            tpsa: 80.0,
            exact_mw: 620.3,
            logp: 6.1,
            hbd: 2,
            hba: 11,
        };
        assert_eq!(d.ro5_violations(500.0, 5.0, 5, 10), 3);
    }

    #[test]
    fn test_descriptor_frame() {
        let mols: Vec<Molecule> = [("CCO", "ethanol"), ("Oc1ccccc1O", "catechol")]
            .iter()
            .map(|(s, n)| parse_smiles(s).unwrap().with_record(*s, *n))
            .collect();
        let catalog = AlertCatalog::pains(&[PainsFamily::A]).unwrap();
        let df = descriptor_frame(&mols, &catalog).unwrap();

        assert_eq!(df.shape(), (2, 9));
        let pains = df.column("pains").unwrap().str().unwrap();
        assert_eq!(pains.get(0), None);
        assert_eq!(pains.get(1), Some("catechol_A"));
        let hbd = df.column("hbd").unwrap().u32().unwrap();
        assert_eq!(hbd.get(1), Some(2));
    }
}
