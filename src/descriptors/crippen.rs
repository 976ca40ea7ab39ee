//! Wildman-Crippen atom-typed logP (J. Chem. Inf. Comput. Sci. 1999).
//!
//! Heavy atoms take the contribution of the first type whose SMARTS matches
//! at that atom. Hydrogens are typed from the heavy atom they sit on.

use std::sync::LazyLock;

use tracing::warn;

use crate::chem::{BondOrder, Molecule, Smarts};

/// `(type, SMARTS, contribution)` in matching order.
const ATOM_TYPES: &[(&str, &str, f64)] = &[
    ("C1", "[CH4]", 0.1441),
    ("C1", "[CH3]C", 0.1441),
    ("C1", "[CH2](C)C", 0.1441),
    ("C2", "[CH](C)(C)C", 0.0),
    ("C2", "[C](C)(C)(C)C", 0.0),
    ("C3", "[CH3][N,O,P,S,F,Cl,Br,I]", -0.2035),
    ("C3", "[CH2X4]([N,O,P,S,F,Cl,Br,I])[A;!#1]", -0.2035),
    ("C4", "[CH1X4]([N,O,P,S,F,Cl,Br,I])[A;!#1][A;!#1]", -0.2051),
    ("C4", "[CH0X4]([N,O,P,S,F,Cl,Br,I])[A;!#1]([A;!#1])[A;!#1]", -0.2051),
    ("C5", "[C]=[!C;A;!#1]", -0.2783),
    ("C6", "[CH2]=C", 0.1551),
    ("C6", "[CH1](=C)[A;!#1]", 0.1551),
    ("C6", "[CH0](=C)([A;!#1])[A;!#1]", 0.1551),
    ("C6", "[C](=C)=C", 0.1551),
    ("C7", "[CX2]#[A]", 0.0017),
    ("C8", "[CH3]c", 0.08452),
    ("C9", "[CH3]a", -0.1444),
    ("C10", "[CH2X4]a", -0.0516),
    ("C11", "[CHX4]a", 0.1193),
    ("C12", "[CH0X4]a", -0.0967),
    ("C13", "[cH0]-[A;!C;!N;!O;!S;!F;!Cl;!Br;!I;!#1]", -0.5443),
    ("C14", "[c][#9]", 0.0),
    ("C15", "[c][#17]", 0.245),
    ("C16", "[c][#35]", 0.198),
    ("C17", "[c][#53]", 0.0),
    ("C18", "[cH]", 0.1581),
    ("C19", "[c](:a)(:a):a", 0.2955),
    ("C20", "[c](:a)(:a)-a", 0.2713),
    ("C21", "[c](:a)(:a)-C", 0.136),
    ("C22", "[c](:a)(:a)-N", 0.4619),
    ("C23", "[c](:a)(:a)-O", 0.5437),
    ("C24", "[c](:a)(:a)-S", 0.1893),
    ("C25", "[c](:a)(:a)=[C,N,O]", -0.8186),
    ("C26", "[C](=C)(a)[A;!#1]", 0.264),
    ("C26", "[C](=C)(c)a", 0.264),
    ("C26", "[CH1](=C)a", 0.264),
    ("C26", "[C]=c", 0.264),
    ("C27", "[CX4][A;!C;!N;!O;!P;!S;!F;!Cl;!Br;!I;!#1]", 0.2148),
    ("CS", "[#6]", 0.08129),
    ("N1", "[NH2+0][A;!#1]", -1.019),
    ("N2", "[NH+0]([A;!#1])[A;!#1]", -0.7096),
    ("N3", "[NH2+0]a", -1.027),
    ("N4", "[NH1+0]([!#1;A,a])a", -0.5188),
    ("N5", "[NH+0]=[!#1;A,a]", 0.08387),
    ("N6", "[N+0](=[!#1;A,a])[!#1;A,a]", 0.1836),
    ("N7", "[N+0]([A;!#1])([A;!#1])[A;!#1]", -0.3187),
    ("N8", "[N+0](a)([!#1;A,a])[A;!#1]", -0.4458),
    ("N8", "[N+0](a)(a)a", -0.4458),
    ("N9", "[N+0]#[A;!#1]", 0.01508),
    ("N10", "[NH3,NH2,NH;+,+2,+3]", -1.950),
    ("N11", "[n+0]", -0.3239),
    ("N12", "[n;+,+2,+3]", -1.119),
    ("N13", "[NH0;+,+2,+3]([A;!#1])([A;!#1])([A;!#1])[A;!#1]", -0.3396),
    ("N13", "[NH0;+,+2,+3](=[A;!#1])([A;!#1])[!#1;A,a]", -0.3396),
    ("N13", "[NH0;+,+2,+3](=[#6])=[#7]", -0.3396),
    ("N14", "[N;+,+2,+3]#[A;!#1]", 0.2887),
    ("N14", "[N;-,-2,-3]", 0.2887),
    ("N14", "[N;+,+2,+3](=[N;-,-2,-3])=N", 0.2887),
    ("NS", "[#7]", -0.4806),
    ("O1", "[o]", 0.1552),
    ("O2", "[OH,OH2]", -0.2893),
    ("O3", "[O]([A;!#1])[A;!#1]", -0.0684),
    ("O4", "[O](a)[A;!#1]", -0.4195),
    ("O4", "[O](a)a", -0.4195),
    ("O5", "[O]=[#7,#8]", 0.0335),
    ("O5", "[OX1;-;$([OX1;-][#7])]", 0.0335),
    ("O6", "[OX1;-;$([OX1;-][#16])]", -0.3339),
    ("O6", "[O;-0]=[#16;-0]", -0.3339),
    ("O12", "[O-1]C(=O)", -1.326),
    ("O7", "[OX1;-;$([OX1;-][!#7;!#16])]", -1.189),
    ("O8", "[O]=c", 0.1788),
    ("O9", "[O]=[CH]C", -0.1526),
    ("O9", "[O]=C(C)C", -0.1526),
    ("O9", "[O]=C(C)[A;!#1]", -0.1526),
    ("O9", "[O]=[CH]N", -0.1526),
    ("O9", "[O]=[CH]O", -0.1526),
    ("O9", "[O]=[CH2]", -0.1526),
    ("O9", "[O]=[CX2]=O", -0.1526),
    ("O10", "[O]=[CH]c", 0.1129),
    ("O10", "[O]=C([C,c])[a;!#1]", 0.1129),
    ("O10", "[O]=C(c)[A;!#1]", 0.1129),
    ("O11", "[O]=C([!#1;!#6])[!#1;!#6]", 0.4833),
    ("OS", "[#8]", -0.1188),
    ("F", "[#9-0]", 0.4202),
    ("Cl", "[#17-0]", 0.6895),
    ("Br", "[#35-0]", 0.8456),
    ("I", "[#53-0]", 0.8857),
    ("Hal", "[#9,#17,#35,#53;-]", -2.996),
    ("Hal", "[#53;+,+2,+3]", -2.996),
    ("Hal", "[+;#3,#11,#19,#37,#55]", -2.996),
    ("P", "[#15]", 0.8612),
    ("S1", "[S-0]", 0.6482),
    ("S2", "[S-,S-2,S-3,S-4,S+,S+2,S+3]", -0.0024),
    ("S3", "[s]", 0.6237),
    ("Me1", "[#3,#11,#19,#37,#55]", -0.3808),
    ("Me2", "[#4,#12,#20,#38,#56,#5,#13,#31,#49,#81,#14,#32,#50,#82,#33,#51,#83,#34,#52,#84]", -0.0025),
    ("Me2", "[#21,#22,#23,#24,#25,#26,#27,#28,#29,#30,#39,#40,#41,#42,#43,#44,#45,#46,#47,#48,#78]", -0.0025),
];

const H_HYDROCARBON: f64 = 0.123;
const H_ALCOHOL: f64 = -0.2677;
const H_AMINE: f64 = 0.2142;
const H_ACID: f64 = 0.298;
const H_OTHER: f64 = 0.1125;

struct AtomType {
    query: Smarts,
    contribution: f64,
}

static COMPILED: LazyLock<Vec<AtomType>> = LazyLock::new(|| {
    ATOM_TYPES
        .iter()
        .filter_map(|&(label, pattern, contribution)| match Smarts::new(pattern) {
            Ok(query) => Some(AtomType {
                query,
                contribution,
            }),
            Err(e) => {
                warn!("Skipping Crippen type {label}: {e}");
                None
            }
        })
        .collect()
});

/// logP contribution of a heavy atom, without its hydrogens.
fn heavy_atom_contribution(mol: &Molecule, atom: usize) -> f64 {
    COMPILED
        .iter()
        .find(|t| t.query.matches_at(mol, atom))
        .map_or(0.0, |t| t.contribution)
}

/// logP contribution of one hydrogen sitting on `atom`.
fn hydrogen_contribution(mol: &Molecule, atom: usize) -> f64 {
    match mol.atoms[atom].atomic_number() {
        6 => H_HYDROCARBON,
        7 => H_AMINE,
        8 => {
            let heavy: Vec<usize> = mol.neighbors(atom).iter().map(|&(n, _)| n).collect();
            if heavy.is_empty() {
                return H_OTHER;
            }
            let alcohol = heavy.iter().any(|&n| {
                let a = &mol.atoms[n];
                match a.atomic_number() {
                    6 => a.aromatic || mol.total_degree(n) == 4,
                    7 | 8 | 16 => false,
                    _ => true,
                }
            });
            if alcohol {
                return H_ALCOHOL;
            }
            if heavy.iter().any(|&n| mol.atoms[n].atomic_number() == 7) {
                return H_AMINE;
            }
            let acid = heavy.iter().any(|&n| match mol.atoms[n].atomic_number() {
                8 | 16 => true,
                6 => has_double_to_heteroatom_or_carbon(mol, n),
                _ => false,
            });
            if acid {
                H_ACID
            } else {
                H_OTHER
            }
        }
        _ => H_ALCOHOL,
    }
}

fn has_double_to_heteroatom_or_carbon(mol: &Molecule, atom: usize) -> bool {
    mol.neighbors(atom).iter().any(|&(n, bi)| {
        mol.bonds[bi].order == BondOrder::Double
            && matches!(mol.atoms[n].atomic_number(), 6 | 7 | 8 | 16)
    })
}

/// Wildman-Crippen octanol/water partition coefficient.
pub fn mol_logp(mol: &Molecule) -> f64 {
    (0..mol.atom_count())
        .map(|atom| {
            let h = mol.atoms[atom].hydrogens as f64;
            heavy_atom_contribution(mol, atom) + h * hydrogen_contribution(mol, atom)
        })
        .sum()
}
