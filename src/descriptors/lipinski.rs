//! Rotatable bond and hydrogen bond donor/acceptor counts.

use std::sync::LazyLock;

use crate::chem::{Molecule, Smarts};

/// Single non-ring bond between two non-terminal atoms, excluding triple bond
/// atoms, trihalomethyl and t-butyl groups, and amide, thioamide and amidine C-N bonds.
pub(crate) const ROTATABLE_BOND_SMARTS: &str = concat!(
    "[!$(*#*)&!D1&!$(C(F)(F)F)&!$(C(Cl)(Cl)Cl)&!$(C(Br)(Br)Br)&!$(C([CH3])([CH3])[CH3])",
    "&!$([CD3](=[N,O,S])-!@[#7,O,S!D1])&!$([#7,O,S!D1]-!@[CD3]=[N,O,S])",
    "&!$([CD3](=[N+])-!@[#7!D1])&!$([#7!D1]-!@[CD3]=[N+])]",
    "-,:;!@",
    "[!$(*#*)&!D1&!$(C(F)(F)F)&!$(C(Cl)(Cl)Cl)&!$(C(Br)(Br)Br)&!$(C([CH3])([CH3])[CH3])]",
);

pub(crate) const HBD_SMARTS: &str = "[N&!H0&v3,N&!H0&+1&v4,O&H1&+0,S&H1&+0,n&H1&+0]";

pub(crate) const HBA_SMARTS: &str = concat!(
    "[$([O,S;H1;v2]-[!$(*=[O,N,P,S])]),$([O,S;H0;v2]),$([O,S;-]),",
    "$([N;v3;!$(N-*=!@[O,N,P,S])]),$([nH0,o,s;+0]),$([F])]",
);

static ROTATABLE_BOND: LazyLock<Option<Smarts>> =
    LazyLock::new(|| Smarts::new(ROTATABLE_BOND_SMARTS).ok());
static HBD: LazyLock<Option<Smarts>> = LazyLock::new(|| Smarts::new(HBD_SMARTS).ok());
static HBA: LazyLock<Option<Smarts>> = LazyLock::new(|| Smarts::new(HBA_SMARTS).ok());

/// Number of rotatable bonds.
pub fn num_rotatable_bonds(mol: &Molecule) -> u32 {
    ROTATABLE_BOND
        .as_ref()
        .map_or(0, |q| q.unique_matches(mol).len() as u32)
}

/// Number of Lipinski hydrogen bond donors.
pub fn num_h_donors(mol: &Molecule) -> u32 {
    count_atoms(&HBD, mol)
}

/// Number of Lipinski hydrogen bond acceptors.
pub fn num_h_acceptors(mol: &Molecule) -> u32 {
    count_atoms(&HBA, mol)
}

fn count_atoms(query: &LazyLock<Option<Smarts>>, mol: &Molecule) -> u32 {
    let Some(query) = query.as_ref() else {
        return 0;
    };
    (0..mol.atom_count())
        .filter(|&atom| query.matches_at(mol, atom))
        .count() as u32
}
