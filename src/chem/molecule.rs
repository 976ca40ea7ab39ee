use super::element::ElementInfo;
use super::rings::{perceive_aromaticity, RingInfo};

/// Order of a bond between two heavy atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    /// Single bond
    Single,
    /// Double bond
    Double,
    /// Triple bond
    Triple,
    /// Quadruple bond
    Quadruple,
    /// Aromatic bond, valence 1.5
    Aromatic,
}

impl BondOrder {
    /// Contribution of the bond to the valence of each of its atoms.
    pub fn valence(&self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Quadruple => 4.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

/// A heavy atom. Hydrogens are never stored as atoms, only counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element table entry
    pub element: &'static ElementInfo,
    /// Member of an aromatic ring
    pub aromatic: bool,
    /// Formal charge
    pub charge: i8,
    /// Mass number if the atom is labelled
    pub isotope: Option<u16>,
    /// Attached hydrogens, explicit and implicit
    pub hydrogens: u8,
}

impl Atom {
    /// Atomic number of the element.
    pub fn atomic_number(&self) -> u8 {
        self.element.number
    }

    /// Monoisotopic mass of the atom without its hydrogens.
    ///
    /// Labelled atoms use their mass number, which is within a few mDa of
    /// the isotope mass for the isotopes seen in ligand libraries.
    pub fn mass(&self) -> f64 {
        match self.isotope {
            Some(isotope) => isotope as f64,
            None => self.element.monoisotopic_mass,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A bond between two heavy atoms, by atom index.
pub struct Bond {
    /// First atom
    pub begin: usize,
    /// Second atom
    pub end: usize,
    /// Bond order after aromaticity perception
    pub order: BondOrder,
}

impl Bond {
    /// The atom on the other side of the bond from `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// A molecular graph together with its record name and input text.
#[derive(Debug, Clone)]
pub struct Molecule {
    /// Heavy atoms
    pub atoms: Vec<Atom>,
    /// Bonds between heavy atoms
    pub bonds: Vec<Bond>,
    /// `adjacency[atom]` lists `(neighbour, bond index)` pairs
    adjacency: Vec<Vec<(usize, usize)>>,
    rings: RingInfo,
    /// Record name from the input file
    pub name: String,
    /// SMILES text the molecule was read from
    pub smiles: String,
}

impl Molecule {
    /// Assemble a molecule from atoms and bonds, then perceive rings and aromaticity.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, bi));
            adjacency[bond.end].push((bond.begin, bi));
        }
        let rings = RingInfo::new(atoms.len(), &bonds, &adjacency);

        let mut mol = Molecule {
            atoms,
            bonds,
            adjacency,
            rings,
            name: String::new(),
            smiles: String::new(),
        };
        perceive_aromaticity(&mut mol);
        mol
    }

    /// Number of heavy atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds between heavy atoms.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// `(neighbour, bond index)` pairs of an atom.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Number of heavy-atom neighbours.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Hydrogens attached to `atom`.
    pub fn total_h(&self, atom: usize) -> u8 {
        self.atoms[atom].hydrogens
    }

    /// Number of connections including hydrogens.
    pub fn total_degree(&self, atom: usize) -> usize {
        self.degree(atom) + self.atoms[atom].hydrogens as usize
    }

    /// Sum of bond orders including hydrogens. Aromatic atoms whose sum
    /// overshoots an allowed valence are reduced to the nearest one below,
    /// which gives pyrrole nitrogen 3 and thiophene sulfur 2.
    pub fn total_valence(&self, atom: usize) -> u8 {
        let a = &self.atoms[atom];
        let bonded: f64 = self.adjacency[atom]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].order.valence())
            .sum();
        let valence = (bonded + a.hydrogens as f64 + 0.1).round() as u8;
        if !a.aromatic {
            return valence;
        }
        let allowed = a.element.allowed_valences(a.charge);
        if allowed.is_empty() || allowed.contains(&valence) {
            return valence;
        }
        allowed
            .iter()
            .rev()
            .find(|&&v| v < valence)
            .copied()
            .unwrap_or(valence)
    }

    /// Index of the bond joining two atoms, if any.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| bi)
    }

    /// Whether the bond lies on a cycle.
    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.rings.ring_bonds[bond]
    }

    /// Whether the atom belongs to an SSSR ring.
    pub fn is_ring_atom(&self, atom: usize) -> bool {
        !self.rings.atom_rings[atom].is_empty()
    }

    /// Number of SSSR rings the atom belongs to.
    pub fn ring_count(&self, atom: usize) -> usize {
        self.rings.atom_rings[atom].len()
    }

    /// Whether the atom is part of an SSSR ring with exactly `size` atoms.
    pub fn in_ring_of_size(&self, atom: usize, size: usize) -> bool {
        self.rings.atom_rings[atom]
            .iter()
            .any(|&r| self.rings.rings[r].len() == size)
    }

    /// Number of ring bonds at an atom.
    pub fn ring_bond_count(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .filter(|&&(_, bi)| self.rings.ring_bonds[bi])
            .count()
    }

    /// SSSR rings as sorted atom index lists.
    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings.rings
    }

    /// SSSR rings as bond index lists, parallel to [`Molecule::rings`].
    pub fn ring_bonds(&self) -> &[Vec<usize>] {
        &self.rings.ring_bond_sets
    }

    /// Monoisotopic mass including all hydrogens.
    pub fn exact_mass(&self) -> f64 {
        let h_mass = super::element::element_by_number(1)
            .map(|h| h.monoisotopic_mass)
            .unwrap_or(1.007_825_032_23);
        self.atoms
            .iter()
            .map(|a| a.mass() + a.hydrogens as f64 * h_mass)
            .sum()
    }

    /// Attach the record name and the text the molecule was parsed from.
    pub fn with_record(mut self, smiles: impl Into<String>, name: impl Into<String>) -> Self {
        self.smiles = smiles.into();
        self.name = name.into();
        self
    }

    pub(crate) fn set_aromatic(&mut self, atoms: &[usize], bonds: &[usize]) {
        for &a in atoms {
            self.atoms[a].aromatic = true;
        }
        for &b in bonds {
            self.bonds[b].order = BondOrder::Aromatic;
        }
    }
}
