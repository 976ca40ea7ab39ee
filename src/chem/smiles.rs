//! SMILES reader.
//!
//! Hydrogens never become graph atoms: bracket hydrogen counts are taken as
//! given, organic-subset atoms get implicit hydrogens from their default
//! valence, and explicit `[H]` atoms are folded into their neighbour's count.
//! Stereo marks are accepted and dropped.

use std::collections::HashMap;

use super::element::{element_by_symbol, ElementInfo};
use super::molecule::{Atom, Bond, BondOrder, Molecule};
use super::rings::cyclic_bonds;
use crate::error::SmilesError;

type Result<T> = std::result::Result<T, SmilesError>;

/// Atom before hydrogens are resolved.
struct RawAtom {
    element: &'static ElementInfo,
    aromatic: bool,
    charge: i8,
    isotope: Option<u16>,
    /// `Some` for bracket atoms, whose hydrogen count is explicit
    bracket_h: Option<u8>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<RawAtom>,
    bonds: Vec<(usize, usize, Option<BondOrder>)>,
    prev: Option<usize>,
    branches: Vec<Option<usize>>,
    pending_bond: Option<BondOrder>,
    // ring number -> (atom, bond written at the opening digit)
    open_rings: HashMap<u16, (usize, Option<BondOrder>)>,
}

/// Parse a SMILES string into a [`Molecule`].
///
/// ```
/// use ligsieve::parse_smiles;
///
/// let mol = parse_smiles("c1ccccc1O").unwrap();
/// assert_eq!(mol.atom_count(), 7);
/// assert_eq!(mol.rings().len(), 1);
/// ```
pub fn parse_smiles(smiles: &str) -> std::result::Result<Molecule, SmilesError> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(SmilesError::new(0, "empty SMILES"));
    }
    let mut parser = Parser {
        input: smiles.as_bytes(),
        pos: 0,
        atoms: Vec::new(),
        bonds: Vec::new(),
        prev: None,
        branches: Vec::new(),
        pending_bond: None,
        open_rings: HashMap::new(),
    };
    parser.parse()?;
    Ok(parser.finish()?.with_record(smiles, ""))
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> SmilesError {
        SmilesError::new(self.pos, message)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn parse(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    if self.prev.is_none() {
                        return Err(self.error("branch without a preceding atom"));
                    }
                    self.branches.push(self.prev);
                    self.pos += 1;
                }
                b')' => {
                    self.prev = self
                        .branches
                        .pop()
                        .ok_or_else(|| self.error("unmatched ')'"))?;
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before ')'"));
                    }
                    self.pos += 1;
                }
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'-' | b'/' | b'\\' => self.set_bond(BondOrder::Single)?,
                b'=' => self.set_bond(BondOrder::Double)?,
                b'#' => self.set_bond(BondOrder::Triple)?,
                b'$' => self.set_bond(BondOrder::Quadruple)?,
                b':' => self.set_bond(BondOrder::Aromatic)?,
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring_closure((ch - b'0') as u16)?;
                }
                b'%' => {
                    self.pos += 1;
                    let digits = self
                        .input
                        .get(self.pos..self.pos + 2)
                        .filter(|d| d.iter().all(u8::is_ascii_digit))
                        .ok_or_else(|| self.error("'%' must be followed by two digits"))?;
                    let number = ((digits[0] - b'0') * 10 + (digits[1] - b'0')) as u16;
                    self.pos += 2;
                    self.ring_closure(number)?;
                }
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.add_atom(atom);
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.add_atom(atom);
                }
            }
        }

        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some((&number, _)) = self.open_rings.iter().next() {
            return Err(self.error(format!("unclosed ring bond {number}")));
        }
        if self.pending_bond.is_some() {
            return Err(self.error("trailing bond symbol"));
        }
        if self.atoms.is_empty() {
            return Err(self.error("no atoms"));
        }
        Ok(())
    }

    fn set_bond(&mut self, order: BondOrder) -> Result<()> {
        if self.pending_bond.is_some() {
            return Err(self.error("two consecutive bond symbols"));
        }
        if self.prev.is_none() {
            return Err(self.error("bond without a preceding atom"));
        }
        self.pending_bond = Some(order);
        self.pos += 1;
        Ok(())
    }

    fn add_atom(&mut self, atom: RawAtom) {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev {
            let order = self.pending_bond.take();
            self.bonds.push((prev, idx, order));
        }
        self.pending_bond = None;
        self.prev = Some(idx);
    }

    fn ring_closure(&mut self, number: u16) -> Result<()> {
        let current = self
            .prev
            .ok_or_else(|| self.error("ring bond without a preceding atom"))?;
        let bond = self.pending_bond.take();
        match self.open_rings.remove(&number) {
            Some((partner, opening_bond)) => {
                if partner == current {
                    return Err(self.error("ring bond to itself"));
                }
                let order = match (opening_bond, bond) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(self.error(format!("conflicting bonds on ring {number}")));
                    }
                    (a, b) => a.or(b),
                };
                let duplicate = self.bonds.iter().any(|&(x, y, _)| {
                    (x == partner && y == current) || (x == current && y == partner)
                });
                if duplicate {
                    return Err(self.error("ring closure duplicates an existing bond"));
                }
                self.bonds.push((partner, current, order));
            }
            None => {
                self.open_rings.insert(number, (current, bond));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<RawAtom> {
        let rest = &self.input[self.pos..];
        let (symbol, aromatic, len) = match rest {
            [b'C', b'l', ..] => ("Cl", false, 2),
            [b'B', b'r', ..] => ("Br", false, 2),
            [b'B', ..] => ("B", false, 1),
            [b'C', ..] => ("C", false, 1),
            [b'N', ..] => ("N", false, 1),
            [b'O', ..] => ("O", false, 1),
            [b'P', ..] => ("P", false, 1),
            [b'S', ..] => ("S", false, 1),
            [b'F', ..] => ("F", false, 1),
            [b'I', ..] => ("I", false, 1),
            [b'b', ..] => ("B", true, 1),
            [b'c', ..] => ("C", true, 1),
            [b'n', ..] => ("N", true, 1),
            [b'o', ..] => ("O", true, 1),
            [b'p', ..] => ("P", true, 1),
            [b's', ..] => ("S", true, 1),
            [b'*', ..] => return Err(self.error("wildcard atoms are not supported")),
            _ => {
                let ch = rest[0] as char;
                return Err(self.error(format!("unexpected character '{ch}'")));
            }
        };
        let element = element_by_symbol(symbol)
            .ok_or_else(|| self.error(format!("unknown element {symbol}")))?;
        self.pos += len;
        Ok(RawAtom {
            element,
            aromatic,
            charge: 0,
            isotope: None,
            bracket_h: None,
        })
    }

    /// Digits at the cursor, `None` when there are none.
    fn number<T: std::str::FromStr>(&mut self) -> Result<Option<T>> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Some)
            .ok_or_else(|| SmilesError::new(start, "number out of range"))
    }

    fn bracket_atom(&mut self) -> Result<RawAtom> {
        self.pos += 1; // '['
        let isotope = self.number::<u16>()?;

        let rest = &self.input[self.pos..];
        let first = *rest.first().ok_or_else(|| self.error("unterminated bracket atom"))?;
        let aromatic = first.is_ascii_lowercase();
        let two = rest
            .get(..2)
            .and_then(|s| std::str::from_utf8(s).ok())
            .map(capitalize);
        let one = capitalize(&(first as char).to_string());

        // Two-letter aromatic symbols are only se, as and te
        let (element, len) = match two.as_deref().and_then(|s| {
            let allowed = !aromatic || matches!(s, "Se" | "As" | "Te");
            let second_lower = rest[1].is_ascii_lowercase();
            (allowed && second_lower).then(|| element_by_symbol(s)).flatten()
        }) {
            Some(element) => (element, 2),
            None => {
                let element = element_by_symbol(&one)
                    .ok_or_else(|| self.error(format!("unknown element '{}'", first as char)))?;
                (element, 1)
            }
        };
        self.pos += len;

        // Chirality: @, @@, @TH1, @SP2, @OH12 ...
        if self.peek() == Some(b'@') {
            self.pos += 1;
            if self.peek() == Some(b'@') {
                self.pos += 1;
            }
            let class = self.input.get(self.pos..self.pos + 2);
            if matches!(class, Some(b"TH" | b"AL" | b"SP" | b"TB" | b"OH")) {
                self.pos += 2;
                self.number::<u32>()?
                    .ok_or_else(|| self.error("chirality class without a number"))?;
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = self.number::<u8>()?.unwrap_or(1);
        }

        let mut charge: i8 = 0;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            self.pos += 1;
            charge = unit;
            if let Some(n) = self.number::<i8>()? {
                charge = unit * n;
            } else {
                while self.peek() == Some(sign) {
                    charge = charge
                        .checked_add(unit)
                        .ok_or_else(|| self.error("charge out of range"))?;
                    self.pos += 1;
                }
            }
        }

        // Atom class
        if self.peek() == Some(b':') {
            self.pos += 1;
            self.number::<u64>()?;
        }

        if self.peek() != Some(b']') {
            return Err(self.error("malformed bracket atom"));
        }
        self.pos += 1;

        Ok(RawAtom {
            element,
            aromatic,
            charge,
            isotope,
            bracket_h: Some(hydrogens),
        })
    }

    /// Fold explicit hydrogens, resolve implicit bond orders and count implicit
    /// hydrogens.
    fn finish(self) -> Result<Molecule> {
        let Parser {
            input, atoms, bonds, ..
        } = self;
        let overflow = || SmilesError::new(input.len(), "too many hydrogens on one atom");

        // Explicit hydrogen atoms with exactly one heavy neighbour are folded away
        let is_h = |a: &RawAtom| a.element.number == 1 && a.isotope.is_none() && a.charge == 0;
        let mut fold = vec![false; atoms.len()];
        let mut extra_h = vec![0u8; atoms.len()];
        for (i, atom) in atoms.iter().enumerate() {
            if !is_h(atom) {
                continue;
            }
            let mut partners = bonds.iter().filter(|&&(b, e, _)| b == i || e == i);
            if let (Some(&(b, e, order)), None) = (partners.next(), partners.next()) {
                let other = if b == i { e } else { b };
                let single = matches!(order, None | Some(BondOrder::Single));
                if !is_h(&atoms[other]) && single {
                    fold[i] = true;
                    extra_h[other] = extra_h[other].checked_add(1).ok_or_else(overflow)?;
                }
            }
        }

        let mut new_index = vec![usize::MAX; atoms.len()];
        let mut kept = Vec::new();
        for (i, &folded) in fold.iter().enumerate() {
            if folded {
                continue;
            }
            new_index[i] = kept.len();
            kept.push(i);
        }
        let bonds: Vec<(usize, usize, Option<BondOrder>)> = bonds
            .into_iter()
            .filter(|&(b, e, _)| !fold[b] && !fold[e])
            .map(|(b, e, order)| (new_index[b], new_index[e], order))
            .collect();

        // An unwritten bond between aromatic atoms is aromatic only inside a ring
        let mut adjacency = vec![Vec::new(); kept.len()];
        for (bi, &(b, e, _)) in bonds.iter().enumerate() {
            adjacency[b].push((e, bi));
            adjacency[e].push((b, bi));
        }
        let cyclic = cyclic_bonds(kept.len(), &adjacency);
        let bonds: Vec<Bond> = bonds
            .into_iter()
            .enumerate()
            .map(|(bi, (begin, end, order))| {
                let both_aromatic = atoms[kept[begin]].aromatic && atoms[kept[end]].aromatic;
                let order = order.unwrap_or(if both_aromatic && cyclic[bi] {
                    BondOrder::Aromatic
                } else {
                    BondOrder::Single
                });
                Bond { begin, end, order }
            })
            .collect();

        let mut out_atoms = Vec::with_capacity(kept.len());
        for (new, &old) in kept.iter().enumerate() {
            let raw = &atoms[old];
            let hydrogens = match raw.bracket_h {
                Some(h) => h.checked_add(extra_h[old]),
                None => implicit_hydrogens(raw, new, &bonds, extra_h[old]),
            }
            .ok_or_else(overflow)?;
            out_atoms.push(Atom {
                element: raw.element,
                aromatic: raw.aromatic,
                charge: raw.charge,
                isotope: raw.isotope,
                hydrogens,
            });
        }

        Ok(Molecule::new(out_atoms, bonds))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Total hydrogen count of an organic-subset atom, `folded` of which were
/// written as explicit `[H]` atoms.
fn implicit_hydrogens(raw: &RawAtom, index: usize, bonds: &[Bond], folded: u8) -> Option<u8> {
    let mut aromatic_bonds = 0u32;
    let mut other = folded as u32;
    for bond in bonds.iter().filter(|b| b.begin == index || b.end == index) {
        match bond.order {
            BondOrder::Aromatic => aromatic_bonds += 1,
            order => other += order.valence() as u32,
        }
    }

    if raw.aromatic {
        // Only aromatic carbon (and boron) carries implicit hydrogens; [nH] must be bracketed
        let implicit = match raw.element.number {
            6 if aromatic_bonds > 0 => 4u32.saturating_sub(aromatic_bonds + 1 + other),
            5 if aromatic_bonds > 0 => 3u32.saturating_sub(aromatic_bonds + other),
            _ => 0,
        };
        return (implicit as u8).checked_add(folded);
    }

    let explicit = other + aromatic_bonds;
    raw.element
        .allowed_valences(0)
        .iter()
        .map(|&v| v as u32)
        .find(|&v| v >= explicit)
        .map_or(0, |v| (v - explicit) as u8)
        .checked_add(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_chains() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(
            mol.atoms.iter().map(|a| a.hydrogens).collect::<Vec<_>>(),
            vec![3, 2, 1]
        );
    }

    #[test]
    fn test_branches_and_bond_orders() {
        let mol = parse_smiles("CC(=O)N").unwrap();
        assert_eq!(mol.degree(1), 3);
        let co = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bonds[co].order, BondOrder::Double);
        assert_eq!(mol.total_h(3), 2);

        let nitrile = parse_smiles("CC#N").unwrap();
        assert_eq!(nitrile.bonds[1].order, BondOrder::Triple);
        assert_eq!(nitrile.total_h(2), 0);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("C[N+](C)(C)C").unwrap();
        assert_eq!(mol.atoms[1].charge, 1);
        assert_eq!(mol.total_h(1), 0);

        let acetate = parse_smiles("CC(=O)[O-]").unwrap();
        assert_eq!(acetate.atoms[3].charge, -1);

        let labelled = parse_smiles("[13CH4]").unwrap();
        assert_eq!(labelled.atoms[0].isotope, Some(13));
        assert_eq!(labelled.total_h(0), 4);

        let stereo = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(stereo.total_h(1), 1);

        let dication = parse_smiles("[Ca++]").unwrap();
        assert_eq!(dication.atoms[0].charge, 2);
        let sulfide = parse_smiles("[S-2]").unwrap();
        assert_eq!(sulfide.atoms[0].charge, -2);
    }

    #[test]
    fn test_stereocentres_keep_hydrogens() {
        let alanine = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        let plain = parse_smiles("NC(C)C(=O)O").unwrap();
        assert_eq!(alanine.total_h(1), 1);
        assert!((alanine.exact_mass() - plain.exact_mass()).abs() < 1e-9);

        let single = parse_smiles("F[C@H](Cl)Br").unwrap();
        assert_eq!(single.total_h(1), 1);
        let tagged = parse_smiles("F[C@TH1H](Cl)Br").unwrap();
        assert_eq!(tagged.total_h(1), 1);
        let octahedral = parse_smiles("[Co@OH1](F)(F)(F)(F)(F)F").unwrap();
        assert_eq!(octahedral.total_h(0), 0);
        assert!(parse_smiles("F[C@TH](Cl)Br").is_err());
    }

    #[test]
    fn test_bond_between_aromatic_rings_is_single() {
        let implicit = parse_smiles("c1ccccc1n1cccc1").unwrap();
        let dashed = parse_smiles("c1ccccc1-n1cccc1").unwrap();
        let link = implicit.bond_between(5, 6).unwrap();
        assert_eq!(implicit.bonds[link].order, BondOrder::Single);
        assert_eq!(
            implicit.bonds.iter().map(|b| b.order).collect::<Vec<_>>(),
            dashed.bonds.iter().map(|b| b.order).collect::<Vec<_>>()
        );

        let biphenyl = parse_smiles("c1ccccc1c1ccccc1").unwrap();
        let link = biphenyl.bond_between(5, 6).unwrap();
        assert_eq!(biphenyl.bonds[link].order, BondOrder::Single);
        assert_eq!(biphenyl.total_h(5), 0);
        assert_eq!(
            biphenyl
                .bonds
                .iter()
                .filter(|b| b.order == BondOrder::Aromatic)
                .count(),
            12
        );
    }

    #[test]
    fn test_out_of_range_numbers_are_errors() {
        assert!(parse_smiles("[CH255][H]").is_err());
        assert!(parse_smiles("[CH300]").is_err());
        assert!(parse_smiles("[70000C]").is_err());
        assert!(parse_smiles("[C+200]").is_err());
        let plus_run = format!("[C{}]", "+".repeat(130));
        assert!(parse_smiles(&plus_run).is_err());
        let many_h = format!("C{}", "([H])".repeat(300));
        assert!(parse_smiles(&many_h).is_err());
        assert!(parse_smiles("[CH254][H]").is_ok());
    }

    #[test]
    fn test_aromatic_hydrogens() {
        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.total_h(3), 0);
        assert_eq!(pyridine.total_h(0), 1);

        let indole = parse_smiles("c1ccc2[nH]ccc2c1").unwrap();
        assert_eq!(indole.total_h(4), 1);
        assert_eq!(indole.total_h(3), 0);

        let toluene = parse_smiles("Cc1ccccc1").unwrap();
        assert_eq!(toluene.total_h(1), 0);
        assert_eq!(toluene.total_h(0), 3);
    }

    #[test]
    fn test_explicit_hydrogens_are_folded() {
        let mol = parse_smiles("[H]OC([H])([H])[H]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.total_h(0), 1);
        assert_eq!(mol.total_h(1), 3);
    }

    #[test]
    fn test_ring_closures() {
        let mol = parse_smiles("C1CC%10CC1CC%10").unwrap();
        assert_eq!(mol.rings().len(), 2);

        let ring_bond_order = parse_smiles("C=1CCCCC1").unwrap();
        let closure = ring_bond_order.bond_between(0, 5).unwrap();
        assert_eq!(ring_bond_order.bonds[closure].order, BondOrder::Double);
    }

    #[test]
    fn test_dot_disconnected() {
        let salt = parse_smiles("C[NH3+].[Cl-]").unwrap();
        assert_eq!(salt.atom_count(), 3);
        assert_eq!(salt.bond_count(), 1);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_smiles("").is_err());
        assert!(parse_smiles("C1CC").is_err());
        assert!(parse_smiles("CC(C").is_err());
        assert!(parse_smiles("CC)C").is_err());
        assert!(parse_smiles("C[Xy]").is_err());
        assert!(parse_smiles("C==C").is_err());
        assert!(parse_smiles("C[CH3").is_err());

        let err = parse_smiles("CCQ").unwrap_err();
        assert_eq!(err.position, 2);
    }
}
