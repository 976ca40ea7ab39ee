//! Morgan circular fingerprints with feature counts.

use std::collections::{HashMap, HashSet};

use crate::chem::{BondOrder, Molecule};

/// Sparse count fingerprint keyed by 32-bit environment identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MorganFingerprint {
    counts: HashMap<u32, u32>,
}

fn hash_combine(seed: &mut u32, value: u32) {
    *seed ^= value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

fn bond_code(order: BondOrder) -> u32 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Quadruple => 4,
        BondOrder::Aromatic => 12,
    }
}

/// Connectivity invariant of an atom: element, connections, hydrogens,
/// charge, isotope shift and ring membership.
fn atom_invariant(mol: &Molecule, atom: usize) -> u32 {
    let a = &mol.atoms[atom];
    let mut seed = 0u32;
    hash_combine(&mut seed, a.atomic_number() as u32);
    hash_combine(&mut seed, mol.total_degree(atom) as u32);
    hash_combine(&mut seed, a.hydrogens as u32);
    hash_combine(&mut seed, a.charge as i32 as u32);
    let isotope_shift = a
        .isotope
        .map_or(0, |iso| (iso as f64 - a.element.monoisotopic_mass).round() as i32);
    hash_combine(&mut seed, isotope_shift as u32);
    if mol.is_ring_atom(atom) {
        hash_combine(&mut seed, 1);
    }
    seed
}

impl MorganFingerprint {
    /// Fingerprint with `radius` rounds of neighbourhood expansion.
    ///
    /// An environment is only counted the first time its set of bonds is
    /// seen, and an atom whose environment stops growing drops out.
    pub fn new(mol: &Molecule, radius: u32) -> Self {
        let n = mol.atom_count();
        let mut counts: HashMap<u32, u32> = HashMap::new();
        let mut invariants: Vec<u32> = (0..n).map(|a| atom_invariant(mol, a)).collect();
        for &id in &invariants {
            *counts.entry(id).or_default() += 1;
        }

        let mut neighborhoods: Vec<Vec<bool>> = vec![vec![false; mol.bond_count()]; n];
        let mut active = vec![true; n];
        let mut seen: HashSet<Vec<bool>> = HashSet::new();

        for layer in 0..radius {
            let mut round: Vec<(Vec<bool>, u32, usize)> = Vec::new();
            let mut next_invariants = invariants.clone();

            for atom in 0..n {
                if !active[atom] {
                    continue;
                }
                let mut env: Vec<(u32, u32)> = mol
                    .neighbors(atom)
                    .iter()
                    .map(|&(nbr, bi)| (bond_code(mol.bonds[bi].order), invariants[nbr]))
                    .collect();
                env.sort_unstable();

                let mut id = layer;
                hash_combine(&mut id, invariants[atom]);
                for (code, inv) in env {
                    hash_combine(&mut id, code);
                    hash_combine(&mut id, inv);
                }
                next_invariants[atom] = id;

                let mut grown = neighborhoods[atom].clone();
                for &(nbr, bi) in mol.neighbors(atom) {
                    grown[bi] = true;
                    for (covered, &b) in grown.iter_mut().zip(&neighborhoods[nbr]) {
                        *covered |= b;
                    }
                }
                if grown == neighborhoods[atom] {
                    active[atom] = false;
                    continue;
                }
                round.push((grown, id, atom));
            }

            round.sort();
            for (grown, id, atom) in round {
                if seen.insert(grown.clone()) {
                    *counts.entry(id).or_default() += 1;
                } else {
                    active[atom] = false;
                }
                neighborhoods[atom] = grown;
            }
            invariants = next_invariants;
        }

        MorganFingerprint { counts }
    }

    /// Occurrences of each environment identifier.
    pub fn counts(&self) -> &HashMap<u32, u32> {
        &self.counts
    }

    /// Total number of counted environments.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Dice similarity of the count vectors, `2 * sum(min) / (sum(a) + sum(b))`.
    pub fn dice_similarity(&self, other: &MorganFingerprint) -> f64 {
        let denominator = self.total() + other.total();
        if denominator == 0 {
            return 0.0;
        }
        let shared: u32 = self
            .counts
            .iter()
            .filter_map(|(id, &c)| other.counts.get(id).map(|&o| c.min(o)))
            .sum();
        2.0 * shared as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn fp(smiles: &str) -> MorganFingerprint {
        MorganFingerprint::new(&parse_smiles(smiles).unwrap(), 3)
    }

    #[test]
    fn test_environment_counts() {
        assert_eq!(fp("C").total(), 1);
        // two identical atoms, then a single environment covering the bond
        let ethane = fp("CC");
        assert_eq!(ethane.total(), 3);
        assert_eq!(ethane.counts().len(), 2);

        let radius_zero = MorganFingerprint::new(&parse_smiles("CCO").unwrap(), 0);
        assert_eq!(radius_zero.total(), 3);
    }

    #[test]
    fn test_dice_similarity() {
        let aspirin = fp("CC(=O)Oc1ccccc1C(=O)O");
        assert!((aspirin.dice_similarity(&aspirin) - 1.0).abs() < 1e-12);

        let salicylic = fp("Oc1ccccc1C(=O)O");
        let hexane = fp("CCCCCC");
        let close = aspirin.dice_similarity(&salicylic);
        let far = aspirin.dice_similarity(&hexane);
        assert!(close > far, "{close} <= {far}");
        assert!(close < 1.0);
        assert_eq!(aspirin.dice_similarity(&salicylic), salicylic.dice_similarity(&aspirin));
    }

    #[test]
    fn test_kekule_and_aromatic_input_agree() {
        assert_eq!(fp("C1=CC=CC=C1"), fp("c1ccccc1"));
    }

    #[test]
    fn test_empty_fingerprints() {
        let empty = MorganFingerprint::default();
        assert_eq!(empty.dice_similarity(&empty), 0.0);
    }
}
