//! Molecular graph model with SMILES input and SMARTS matching.

mod element;
mod molecule;
mod rings;
mod smarts;
mod smiles;

pub use element::{element_by_number, element_by_symbol, ElementInfo};
pub use molecule::{Atom, Bond, BondOrder, Molecule};
pub use smarts::Smarts;
pub use smiles::parse_smiles;
