//! Topological polar surface area from nitrogen and oxygen fragment contributions
//! (Ertl, Rohde and Selzer, J. Med. Chem. 2000).

use crate::chem::{BondOrder, Molecule};

/// Bond environment of a polar atom.
#[derive(Debug, Default)]
struct BondCounts {
    single: u8,
    double: u8,
    triple: u8,
    aromatic: u8,
}

impl BondCounts {
    fn of(mol: &Molecule, atom: usize) -> Self {
        let mut counts = BondCounts::default();
        for &(_, bi) in mol.neighbors(atom) {
            match mol.bonds[bi].order {
                BondOrder::Single => counts.single += 1,
                BondOrder::Double => counts.double += 1,
                BondOrder::Triple => counts.triple += 1,
                BondOrder::Aromatic => counts.aromatic += 1,
                BondOrder::Quadruple => {}
            }
        }
        counts
    }
}

/// Polar surface contribution of one atom. Atoms other than N and O contribute nothing.
pub fn atom_contribution(mol: &Molecule, atom: usize) -> f64 {
    let a = &mol.atoms[atom];
    let nbrs = mol.degree(atom);
    let h = a.hydrogens;
    let charge = a.charge;
    let b = BondCounts::of(mol, atom);
    let in_three_ring = mol.in_ring_of_size(atom, 3);

    match a.atomic_number() {
        7 => nitrogen(nbrs, h, charge, &b, in_three_ring)
            .unwrap_or_else(|| (30.5 - nbrs as f64 * 8.2 + h as f64 * 1.5).max(0.0)),
        8 => oxygen(nbrs, h, charge, &b, in_three_ring)
            .unwrap_or_else(|| (28.5 - nbrs as f64 * 8.6 + h as f64 * 1.5).max(0.0)),
        _ => 0.0,
    }
}

fn nitrogen(nbrs: usize, h: u8, charge: i8, b: &BondCounts, in_three_ring: bool) -> Option<f64> {
    let value = match (nbrs, h, charge) {
        (1, 0, 0) if b.triple == 1 => 23.79,
        (1, 1, 0) if b.double == 1 => 23.85,
        (1, 2, 0) if b.single == 1 => 26.02,
        (1, 2, 1) if b.double == 1 => 25.59,
        (1, 3, 1) if b.single == 1 => 27.64,
        (2, 0, 0) if b.single == 1 && b.double == 1 => 12.36,
        (2, 0, 0) if b.triple == 1 && b.double == 1 => 13.60,
        (2, 1, 0) if b.single == 2 => {
            if in_three_ring {
                21.94
            } else {
                12.03
            }
        }
        (2, 0, 1) if b.triple == 1 && b.single == 1 => 4.36,
        (2, 0, 1) if b.double == 2 => 13.60,
        (2, 1, 1) if b.double == 1 && b.single == 1 => 13.97,
        (2, 2, 1) if b.single == 2 => 16.61,
        (2, 0, 0) if b.aromatic == 2 => 12.89,
        (2, 1, 0) if b.aromatic == 2 => 15.79,
        (2, 1, 1) if b.aromatic == 2 => 14.14,
        (3, 0, 0) if b.single == 3 => {
            if in_three_ring {
                3.01
            } else {
                3.24
            }
        }
        (3, 0, 0) if b.single == 1 && b.double == 2 => 11.68,
        (3, 0, 1) if b.single == 2 && b.double == 1 => 3.01,
        (3, 1, 1) if b.single == 3 => 4.44,
        (3, 0, 0) if b.aromatic == 3 => 4.41,
        (3, 0, 0) if b.single == 1 && b.aromatic == 2 => 4.93,
        (3, 0, 0) if b.double == 1 && b.aromatic == 2 => 8.39,
        (3, 0, 1) if b.aromatic == 3 => 4.10,
        (3, 0, 1) if b.single == 1 && b.aromatic == 2 => 3.88,
        (4, 0, 1) if b.single == 4 => 0.0,
        _ => return None,
    };
    Some(value)
}

fn oxygen(nbrs: usize, h: u8, charge: i8, b: &BondCounts, in_three_ring: bool) -> Option<f64> {
    let value = match (nbrs, h, charge) {
        (1, 0, 0) if b.double == 1 => 17.07,
        (1, 1, 0) if b.single == 1 => 20.23,
        (1, 0, -1) if b.single == 1 => 23.06,
        (2, 0, 0) if b.single == 2 => {
            if in_three_ring {
                12.53
            } else {
                9.23
            }
        }
        (2, 0, 0) if b.aromatic == 2 => 13.14,
        _ => return None,
    };
    Some(value)
}

/// Topological polar surface area in Å².
pub fn tpsa(mol: &Molecule) -> f64 {
    (0..mol.atom_count())
        .map(|atom| atom_contribution(mol, atom))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn psa(smiles: &str) -> f64 {
        tpsa(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_simple_fragments() {
        assert!((psa("CCO") - 20.23).abs() < 1e-6);
        assert!((psa("CC#N") - 23.79).abs() < 1e-6);
        assert!((psa("c1ccncc1") - 12.89).abs() < 1e-6);
        assert!((psa("c1cc[nH]c1") - 15.79).abs() < 1e-6);
        assert!((psa("CN(C)C") - 3.24).abs() < 1e-6);
        assert!((psa("C1CO1") - 12.53).abs() < 1e-6);
        assert_eq!(psa("CCCC"), 0.0);
    }

    #[test]
    fn test_sulfur_is_ignored() {
        assert_eq!(psa("CSC"), 0.0);
        assert_eq!(psa("c1ccsc1"), 0.0);
    }

    #[test]
    fn test_drug_like() {
        // aspirin: two carbonyls, an ester oxygen and a hydroxyl
        assert!((psa("CC(=O)Oc1ccccc1C(=O)O") - 63.60).abs() < 1e-6);
        // caffeine
        assert!((psa("Cn1cnc2c1c(=O)n(C)c(=O)n2C") - 61.82).abs() < 1e-2);
    }

    #[test]
    fn test_fallback_formula() {
        let amine_oxide = parse_smiles("C[N+](C)(C)[O-]").unwrap();
        assert_eq!(atom_contribution(&amine_oxide, 1), 0.0);
        assert!((atom_contribution(&amine_oxide, 4) - 23.06).abs() < 1e-6);

        // isolated ions and water are not tabulated
        assert!((psa("[NH4+]") - 36.5).abs() < 1e-6);
        assert!((psa("O") - 31.5).abs() < 1e-6);
    }
}
