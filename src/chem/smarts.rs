//! SMARTS queries and subgraph matching.
//!
//! Covers the primitives needed by structural alert catalogues and by the
//! rotatable bond and hydrogen bond definitions; stereo and reaction syntax
//! are not supported.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::element::element_by_symbol;
use super::molecule::{BondOrder, Molecule};
use crate::error::SmartsError;

type Result<T> = std::result::Result<T, SmartsError>;

#[derive(Debug, Clone)]
enum AtomPrimitive {
    /// Element with aromaticity: `C` (aliphatic), `c` (aromatic)
    Element { number: u8, aromatic: bool },
    /// `#n`
    AtomicNum(u8),
    /// `a`
    Aromatic,
    /// `A`
    Aliphatic,
    /// `*`
    Any,
    /// `D<n>`: heavy atom neighbours
    Degree(u8),
    /// `X<n>`: connections including hydrogens
    Connectivity(u8),
    /// `H<n>` and `h<n>`
    HCount(u8),
    /// Merged explicit hydrogen atoms: at least `n` hydrogens
    MinHCount(u8),
    /// `v<n>`
    Valence(u8),
    /// `R` or `r` without a number
    InRing,
    /// `R<n>`: number of SSSR rings
    RingCount(u8),
    /// `r<n>`: member of an SSSR ring of that size
    RingSize(u8),
    /// `x<n>`: ring bonds at the atom
    RingConnectivity(u8),
    /// `+<n>` / `-<n>`
    Charge(i8),
    /// Leading mass number `[13C]`
    Isotope(u16),
    /// `$(...)`
    Recursive(Box<Smarts>),
}

#[derive(Debug, Clone)]
enum AtomExpr {
    Prim(AtomPrimitive),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
}

#[derive(Debug, Clone, Copy)]
enum BondPrimitive {
    Single,
    Double,
    Triple,
    Aromatic,
    Any,
    Ring,
}

#[derive(Debug, Clone)]
enum BondExpr {
    /// No bond symbol written: single or aromatic
    Implicit,
    Prim(BondPrimitive),
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

#[derive(Debug, Clone)]
struct QueryBond {
    begin: usize,
    end: usize,
    expr: BondExpr,
}

/// A compiled SMARTS query.
#[derive(Debug, Clone)]
pub struct Smarts {
    text: String,
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    /// Pattern atoms in DFS order with the already-placed neighbour each one hangs off
    order: Vec<(usize, Option<usize>)>,
}

impl Smarts {
    /// Compile a SMARTS pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut parser = SmartsParser {
            text: pattern,
            input: pattern.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            prev: None,
            branches: Vec::new(),
            pending: None,
            rings: HashMap::new(),
        };
        parser.parse()?;
        let SmartsParser { atoms, bonds, .. } = parser;
        let (atoms, bonds) = merge_query_hydrogens(atoms, bonds);
        Ok(Self::assemble(pattern.to_string(), atoms, bonds))
    }

    fn assemble(text: String, atoms: Vec<AtomExpr>, bonds: Vec<QueryBond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, bi));
            adjacency[bond.end].push((bond.begin, bi));
        }

        let mut order = Vec::with_capacity(atoms.len());
        let mut placed = vec![false; atoms.len()];
        for root in 0..atoms.len() {
            if placed[root] {
                continue;
            }
            placed[root] = true;
            let mut stack = vec![(root, None)];
            while let Some((atom, parent)) = stack.pop() {
                order.push((atom, parent));
                for &(n, _) in adjacency[atom].iter().rev() {
                    if !placed[n] {
                        placed[n] = true;
                        stack.push((n, Some(atom)));
                    }
                }
            }
        }

        Smarts {
            text,
            atoms,
            bonds,
            adjacency,
            order,
        }
    }

    /// The pattern text this query was compiled from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of query atoms after hydrogens are merged.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Whether the query occurs anywhere in the molecule.
    pub fn has_match(&self, mol: &Molecule) -> bool {
        let mut found = false;
        self.search(mol, None, &mut |_| {
            found = true;
            false
        });
        found
    }

    /// Whether the query matches with its first atom placed on `atom`.
    pub fn matches_at(&self, mol: &Molecule, atom: usize) -> bool {
        let mut found = false;
        self.search(mol, Some(atom), &mut |_| {
            found = true;
            false
        });
        found
    }

    /// Every mapping of query atoms onto molecule atoms, indexed by query atom.
    pub fn matches(&self, mol: &Molecule) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        self.search(mol, None, &mut |mapping| {
            out.push(mapping.to_vec());
            true
        });
        out
    }

    /// Mappings that cover distinct sets of molecule atoms.
    pub fn unique_matches(&self, mol: &Molecule) -> Vec<Vec<usize>> {
        let mut seen: HashSet<BTreeSet<usize>> = HashSet::new();
        self.matches(mol)
            .into_iter()
            .filter(|m| seen.insert(m.iter().copied().collect()))
            .collect()
    }

    /// Depth-first subgraph search. `visit` receives complete mappings and
    /// returns whether the search should continue.
    fn search(&self, mol: &Molecule, pinned: Option<usize>, visit: &mut dyn FnMut(&[usize]) -> bool) {
        if self.atoms.is_empty() || self.atoms.len() > mol.atom_count() {
            return;
        }
        let mut mapping = vec![usize::MAX; self.atoms.len()];
        let mut used = vec![false; mol.atom_count()];
        self.extend(mol, 0, pinned, &mut mapping, &mut used, visit);
    }

    fn extend(
        &self,
        mol: &Molecule,
        depth: usize,
        pinned: Option<usize>,
        mapping: &mut [usize],
        used: &mut [bool],
        visit: &mut dyn FnMut(&[usize]) -> bool,
    ) -> bool {
        if depth == self.order.len() {
            return visit(mapping);
        }
        let (query_atom, parent) = self.order[depth];

        let candidates: Vec<usize> = match (depth, pinned, parent) {
            (0, Some(atom), _) => vec![atom],
            (_, _, Some(p)) => mol.neighbors(mapping[p]).iter().map(|&(n, _)| n).collect(),
            _ => (0..mol.atom_count()).collect(),
        };

        for target in candidates {
            if used[target] || !self.atom_matches(query_atom, mol, target, mapping) {
                continue;
            }
            mapping[query_atom] = target;
            used[target] = true;
            let keep_going = self.extend(mol, depth + 1, pinned, mapping, used, visit);
            used[target] = false;
            mapping[query_atom] = usize::MAX;
            if !keep_going {
                return false;
            }
        }
        true
    }

    fn atom_matches(&self, query_atom: usize, mol: &Molecule, target: usize, mapping: &[usize]) -> bool {
        if !eval_atom(&self.atoms[query_atom], mol, target) {
            return false;
        }
        // Every bond to an already mapped query atom must exist and match
        self.adjacency[query_atom].iter().all(|&(other, qb)| {
            let mapped = mapping[other];
            if mapped == usize::MAX {
                return true;
            }
            match mol.bond_between(target, mapped) {
                Some(bi) => eval_bond(&self.bonds[qb].expr, mol, bi),
                None => false,
            }
        })
    }
}

fn eval_atom(expr: &AtomExpr, mol: &Molecule, atom: usize) -> bool {
    match expr {
        AtomExpr::Prim(p) => eval_primitive(p, mol, atom),
        AtomExpr::Not(inner) => !eval_atom(inner, mol, atom),
        AtomExpr::And(terms) => terms.iter().all(|t| eval_atom(t, mol, atom)),
        AtomExpr::Or(terms) => terms.iter().any(|t| eval_atom(t, mol, atom)),
    }
}

fn eval_primitive(prim: &AtomPrimitive, mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms[atom];
    match prim {
        AtomPrimitive::Element { number, aromatic } => {
            a.atomic_number() == *number && a.aromatic == *aromatic
        }
        AtomPrimitive::AtomicNum(n) => a.atomic_number() == *n,
        AtomPrimitive::Aromatic => a.aromatic,
        AtomPrimitive::Aliphatic => !a.aromatic,
        AtomPrimitive::Any => true,
        AtomPrimitive::Degree(n) => mol.degree(atom) == *n as usize,
        AtomPrimitive::Connectivity(n) => mol.total_degree(atom) == *n as usize,
        AtomPrimitive::HCount(n) => a.hydrogens == *n,
        AtomPrimitive::MinHCount(n) => a.hydrogens >= *n,
        AtomPrimitive::Valence(n) => mol.total_valence(atom) == *n,
        AtomPrimitive::InRing => mol.is_ring_atom(atom),
        AtomPrimitive::RingCount(n) => mol.ring_count(atom) == *n as usize,
        AtomPrimitive::RingSize(0) => !mol.is_ring_atom(atom),
        AtomPrimitive::RingSize(n) => mol.in_ring_of_size(atom, *n as usize),
        AtomPrimitive::RingConnectivity(n) => mol.ring_bond_count(atom) == *n as usize,
        AtomPrimitive::Charge(c) => a.charge == *c,
        AtomPrimitive::Isotope(i) => a.isotope == Some(*i),
        AtomPrimitive::Recursive(query) => query.matches_at(mol, atom),
    }
}

fn eval_bond(expr: &BondExpr, mol: &Molecule, bond: usize) -> bool {
    let order = mol.bonds[bond].order;
    match expr {
        BondExpr::Implicit => matches!(order, BondOrder::Single | BondOrder::Aromatic),
        BondExpr::Prim(p) => match p {
            BondPrimitive::Single => order == BondOrder::Single,
            BondPrimitive::Double => order == BondOrder::Double,
            BondPrimitive::Triple => order == BondOrder::Triple,
            BondPrimitive::Aromatic => order == BondOrder::Aromatic,
            BondPrimitive::Any => true,
            BondPrimitive::Ring => mol.is_ring_bond(bond),
        },
        BondExpr::Not(inner) => !eval_bond(inner, mol, bond),
        BondExpr::And(terms) => terms.iter().all(|t| eval_bond(t, mol, bond)),
        BondExpr::Or(terms) => terms.iter().any(|t| eval_bond(t, mol, bond)),
    }
}

/// Fold terminal `[#1]` query atoms into their neighbour as a minimum hydrogen count.
fn merge_query_hydrogens(
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
) -> (Vec<AtomExpr>, Vec<QueryBond>) {
    let is_h = |e: &AtomExpr| {
        matches!(
            e,
            AtomExpr::Prim(AtomPrimitive::AtomicNum(1))
                | AtomExpr::Prim(AtomPrimitive::Element { number: 1, .. })
        )
    };
    let degree = |i: usize| bonds.iter().filter(|b| b.begin == i || b.end == i).count();

    let mut remove = vec![false; atoms.len()];
    let mut extra = vec![0u8; atoms.len()];
    for (i, expr) in atoms.iter().enumerate() {
        if !is_h(expr) || degree(i) != 1 {
            continue;
        }
        let Some(bond) = bonds.iter().find(|b| b.begin == i || b.end == i) else {
            continue;
        };
        let other = if bond.begin == i { bond.end } else { bond.begin };
        if is_h(&atoms[other]) {
            continue;
        }
        remove[i] = true;
        extra[other] += 1;
    }
    if !remove.iter().any(|&r| r) {
        return (atoms, bonds);
    }

    let mut new_index = vec![usize::MAX; atoms.len()];
    let mut kept = Vec::new();
    for (i, expr) in atoms.into_iter().enumerate() {
        if remove[i] {
            continue;
        }
        new_index[i] = kept.len();
        kept.push(match extra[i] {
            0 => expr,
            n => AtomExpr::And(vec![expr, AtomExpr::Prim(AtomPrimitive::MinHCount(n))]),
        });
    }
    let bonds = bonds
        .into_iter()
        .filter(|b| !remove[b.begin] && !remove[b.end])
        .map(|b| QueryBond {
            begin: new_index[b.begin],
            end: new_index[b.end],
            expr: b.expr,
        })
        .collect();
    (kept, bonds)
}

struct SmartsParser<'a> {
    text: &'a str,
    input: &'a [u8],
    pos: usize,
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
    prev: Option<usize>,
    branches: Vec<Option<usize>>,
    pending: Option<BondExpr>,
    rings: HashMap<u16, (usize, Option<BondExpr>)>,
}

const BOND_CHARS: &[u8] = b"-=#:~@!&,;/\\";

impl SmartsParser<'_> {
    fn error(&self, message: impl Into<String>) -> SmartsError {
        SmartsError {
            pattern: self.text.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
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
                    self.pending = None;
                    self.pos += 1;
                }
                b'.' => {
                    self.prev = None;
                    self.pending = None;
                    self.pos += 1;
                }
                c if BOND_CHARS.contains(&c) => {
                    if self.prev.is_none() {
                        return Err(self.error("bond without a preceding atom"));
                    }
                    let start = self.pos;
                    while self.peek().is_some_and(|c| BOND_CHARS.contains(&c)) {
                        self.pos += 1;
                    }
                    let run = &self.input[start..self.pos];
                    let expr = parse_bond_expr(run).ok_or_else(|| self.error("invalid bond expression"))?;
                    self.pending = Some(expr);
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring_closure((ch - b'0') as u16)?;
                }
                b'%' => {
                    self.pos += 1;
                    let tens = self.peek().filter(u8::is_ascii_digit);
                    let ones = self.peek_at(1).filter(u8::is_ascii_digit);
                    let (Some(tens), Some(ones)) = (tens, ones) else {
                        return Err(self.error("'%' must be followed by two digits"));
                    };
                    self.pos += 2;
                    self.ring_closure(((tens - b'0') * 10 + (ones - b'0')) as u16)?;
                }
                b'[' => {
                    self.pos += 1;
                    let expr = self.parse_low(true)?;
                    if self.peek() != Some(b']') {
                        return Err(self.error("expected ']'"));
                    }
                    self.pos += 1;
                    self.add_atom(expr);
                }
                _ => {
                    let expr = self.organic_atom()?;
                    self.add_atom(expr);
                }
            }
        }
        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if !self.rings.is_empty() {
            return Err(self.error("unclosed ring bond"));
        }
        if self.atoms.is_empty() {
            return Err(self.error("no atoms"));
        }
        Ok(())
    }

    fn add_atom(&mut self, expr: AtomExpr) {
        let idx = self.atoms.len();
        self.atoms.push(expr);
        if let Some(prev) = self.prev {
            let expr = self.pending.take().unwrap_or(BondExpr::Implicit);
            self.bonds.push(QueryBond {
                begin: prev,
                end: idx,
                expr,
            });
        }
        self.pending = None;
        self.prev = Some(idx);
    }

    fn ring_closure(&mut self, number: u16) -> Result<()> {
        let current = self
            .prev
            .ok_or_else(|| self.error("ring bond without a preceding atom"))?;
        let bond = self.pending.take();
        match self.rings.remove(&number) {
            Some((partner, opening)) => {
                let expr = bond.or(opening).unwrap_or(BondExpr::Implicit);
                self.bonds.push(QueryBond {
                    begin: partner,
                    end: current,
                    expr,
                });
            }
            None => {
                self.rings.insert(number, (current, bond));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<AtomExpr> {
        let rest = &self.input[self.pos..];
        let (prim, len) = match rest {
            [b'C', b'l', ..] => (element(17, false), 2),
            [b'B', b'r', ..] => (element(35, false), 2),
            [b'B', ..] => (element(5, false), 1),
            [b'C', ..] => (element(6, false), 1),
            [b'N', ..] => (element(7, false), 1),
            [b'O', ..] => (element(8, false), 1),
            [b'P', ..] => (element(15, false), 1),
            [b'S', ..] => (element(16, false), 1),
            [b'F', ..] => (element(9, false), 1),
            [b'I', ..] => (element(53, false), 1),
            [b'b', ..] => (element(5, true), 1),
            [b'c', ..] => (element(6, true), 1),
            [b'n', ..] => (element(7, true), 1),
            [b'o', ..] => (element(8, true), 1),
            [b'p', ..] => (element(15, true), 1),
            [b's', ..] => (element(16, true), 1),
            [b'*', ..] => (AtomPrimitive::Any, 1),
            [b'a', ..] => (AtomPrimitive::Aromatic, 1),
            [b'A', ..] => (AtomPrimitive::Aliphatic, 1),
            _ => return Err(self.error("unexpected character")),
        };
        self.pos += len;
        Ok(AtomExpr::Prim(prim))
    }

    /// `a;b`: lowest precedence conjunction.
    fn parse_low(&mut self, bracket_start: bool) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_or(bracket_start)?];
        while self.peek() == Some(b';') {
            self.pos += 1;
            terms.push(self.parse_or(false)?);
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_or(&mut self, bracket_start: bool) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_high(bracket_start)?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            terms.push(self.parse_high(false)?);
        }
        Ok(collapse(terms, AtomExpr::Or))
    }

    /// `a&b` or juxtaposition: highest precedence conjunction.
    fn parse_high(&mut self, bracket_start: bool) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_unary(bracket_start)?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.pos += 1;
                    terms.push(self.parse_unary(false)?);
                }
                Some(b']' | b',' | b';') | None => break,
                Some(_) => terms.push(self.parse_unary(false)?),
            }
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_unary(&mut self, bracket_start: bool) -> Result<AtomExpr> {
        if self.peek() == Some(b'!') {
            self.pos += 1;
            let inner = self.parse_unary(false)?;
            return Ok(AtomExpr::Not(Box::new(inner)));
        }
        self.parse_primitive(bracket_start)
    }

    /// Digits at the cursor, `None` when there are none.
    fn count<T: std::str::FromStr>(&mut self) -> Result<Option<T>> {
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
            .ok_or_else(|| SmartsError {
                pattern: self.text.to_string(),
                position: start,
                message: "number out of range".to_string(),
            })
    }

    fn parse_primitive(&mut self, bracket_start: bool) -> Result<AtomExpr> {
        let ch = self.peek().ok_or_else(|| self.error("unterminated atom"))?;

        if ch.is_ascii_digit() {
            let isotope = self.count::<u16>()?.unwrap_or(0);
            let mut terms = vec![AtomExpr::Prim(AtomPrimitive::Isotope(isotope))];
            if !matches!(self.peek(), Some(b']' | b',' | b';' | b'&')) {
                terms.push(self.parse_primitive(bracket_start)?);
            }
            return Ok(collapse(terms, AtomExpr::And));
        }

        let prim = match ch {
            b'*' => {
                self.pos += 1;
                AtomPrimitive::Any
            }
            b'#' => {
                self.pos += 1;
                let n = self
                    .count::<u8>()?
                    .ok_or_else(|| self.error("expected atomic number"))?;
                AtomPrimitive::AtomicNum(n)
            }
            b'$' => {
                if self.peek_at(1) != Some(b'(') {
                    return Err(self.error("expected '(' after '$'"));
                }
                self.pos += 2;
                let start = self.pos;
                let mut depth = 1;
                while depth > 0 {
                    match self.peek() {
                        Some(b'(') => depth += 1,
                        Some(b')') => depth -= 1,
                        Some(_) => {}
                        None => return Err(self.error("unterminated recursive SMARTS")),
                    }
                    self.pos += 1;
                }
                let inner = &self.text[start..self.pos - 1];
                let query = Smarts::new(inner).map_err(|mut e| {
                    e.position += start;
                    e.pattern = self.text.to_string();
                    e
                })?;
                AtomPrimitive::Recursive(Box::new(query))
            }
            b'+' | b'-' => {
                let unit: i8 = if ch == b'+' { 1 } else { -1 };
                self.pos += 1;
                match self.count::<i8>()? {
                    Some(n) => AtomPrimitive::Charge(unit * n),
                    None => {
                        let mut charge = unit;
                        while self.peek() == Some(ch) {
                            charge = charge
                                .checked_add(unit)
                                .ok_or_else(|| self.error("charge out of range"))?;
                            self.pos += 1;
                        }
                        AtomPrimitive::Charge(charge)
                    }
                }
            }
            b'@' => {
                // Chirality is not checked
                while self.peek() == Some(b'@') {
                    self.pos += 1;
                }
                AtomPrimitive::Any
            }
            b'H' if bracket_start && matches!(self.peek_at(1), Some(b']' | b'+' | b'-')) => {
                self.pos += 1;
                element(1, false)
            }
            b'D' | b'X' | b'H' | b'h' | b'v' | b'x' => {
                self.pos += 1;
                let n = self.count::<u8>()?.unwrap_or(1);
                match ch {
                    b'D' => AtomPrimitive::Degree(n),
                    b'X' => AtomPrimitive::Connectivity(n),
                    b'H' | b'h' => AtomPrimitive::HCount(n),
                    b'v' => AtomPrimitive::Valence(n),
                    _ => AtomPrimitive::RingConnectivity(n),
                }
            }
            b'R' | b'r' => {
                self.pos += 1;
                match (ch, self.count::<u8>()?) {
                    (_, None) => AtomPrimitive::InRing,
                    (b'R', Some(n)) => AtomPrimitive::RingCount(n),
                    (_, Some(n)) => AtomPrimitive::RingSize(n),
                }
            }
            b'a' if self.peek_at(1) == Some(b's') => {
                self.pos += 2;
                element(33, true)
            }
            b's' if self.peek_at(1) == Some(b'e') => {
                self.pos += 2;
                element(34, true)
            }
            b'a' => {
                self.pos += 1;
                AtomPrimitive::Aromatic
            }
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => {
                self.pos += 1;
                let number = match ch {
                    b'b' => 5,
                    b'c' => 6,
                    b'n' => 7,
                    b'o' => 8,
                    b'p' => 15,
                    _ => 16,
                };
                element(number, true)
            }
            c if c.is_ascii_uppercase() => {
                let two = self
                    .peek_at(1)
                    .filter(u8::is_ascii_lowercase)
                    .and_then(|second| {
                        let symbol = format!("{}{}", c as char, second as char);
                        element_by_symbol(&symbol)
                    });
                match two {
                    Some(info) => {
                        self.pos += 2;
                        element(info.number, false)
                    }
                    None if c == b'A' => {
                        self.pos += 1;
                        AtomPrimitive::Aliphatic
                    }
                    None => {
                        let info = element_by_symbol(&(c as char).to_string())
                            .ok_or_else(|| self.error("unknown element"))?;
                        self.pos += 1;
                        element(info.number, false)
                    }
                }
            }
            _ => return Err(self.error("unexpected character in atom")),
        };
        Ok(AtomExpr::Prim(prim))
    }
}

fn element(number: u8, aromatic: bool) -> AtomPrimitive {
    AtomPrimitive::Element { number, aromatic }
}

fn collapse<T>(mut terms: Vec<T>, wrap: fn(Vec<T>) -> T) -> T {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        wrap(terms)
    }
}

/// Parse a run of bond symbols such as `-,:;!@`.
fn parse_bond_expr(run: &[u8]) -> Option<BondExpr> {
    let mut pos = 0;
    let expr = bond_low(run, &mut pos)?;
    (pos == run.len()).then_some(expr)
}

fn bond_low(run: &[u8], pos: &mut usize) -> Option<BondExpr> {
    let mut terms = vec![bond_or(run, pos)?];
    while run.get(*pos) == Some(&b';') {
        *pos += 1;
        terms.push(bond_or(run, pos)?);
    }
    Some(collapse(terms, BondExpr::And))
}

fn bond_or(run: &[u8], pos: &mut usize) -> Option<BondExpr> {
    let mut terms = vec![bond_high(run, pos)?];
    while run.get(*pos) == Some(&b',') {
        *pos += 1;
        terms.push(bond_high(run, pos)?);
    }
    Some(collapse(terms, BondExpr::Or))
}

fn bond_high(run: &[u8], pos: &mut usize) -> Option<BondExpr> {
    let mut terms = vec![bond_unary(run, pos)?];
    loop {
        match run.get(*pos) {
            Some(b'&') => {
                *pos += 1;
                terms.push(bond_unary(run, pos)?);
            }
            Some(b',' | b';') | None => break,
            Some(_) => terms.push(bond_unary(run, pos)?),
        }
    }
    Some(collapse(terms, BondExpr::And))
}

fn bond_unary(run: &[u8], pos: &mut usize) -> Option<BondExpr> {
    let ch = *run.get(*pos)?;
    *pos += 1;
    let prim = match ch {
        b'!' => return Some(BondExpr::Not(Box::new(bond_unary(run, pos)?))),
        b'-' | b'/' | b'\\' => BondPrimitive::Single,
        b'=' => BondPrimitive::Double,
        b'#' => BondPrimitive::Triple,
        b':' => BondPrimitive::Aromatic,
        b'~' => BondPrimitive::Any,
        b'@' => BondPrimitive::Ring,
        _ => return None,
    };
    Some(BondExpr::Prim(prim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    fn hit(pattern: &str, smiles: &str) -> bool {
        let query = Smarts::new(pattern).unwrap();
        query.has_match(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_element_and_aromaticity() {
        assert!(hit("c1ccccc1", "Oc1ccccc1"));
        assert!(!hit("c1ccccc1", "C1CCCCC1"));
        assert!(hit("[#6]", "c1ccccc1"));
        assert!(hit("C=O", "CC(=O)C"));
        assert!(!hit("C=O", "c1ccccc1"));
        assert!(hit("[Cl]", "CCCl"));
        assert!(hit("Br", "CCBr"));
    }

    #[test]
    fn test_counts_and_charges() {
        assert!(hit("[CH3]", "CC"));
        assert!(!hit("[CH3]", "C1CC1"));
        assert!(hit("[OX1-]", "CC(=O)[O-]"));
        assert!(hit("[N+0]", "CN"));
        assert!(!hit("[N+0]", "C[NH3+]"));
        assert!(hit("[NH3+]", "C[NH3+]"));
        assert!(hit("[CD3]", "CC(C)C"));
        assert!(!hit("[CD4]", "CC(C)C"));
        assert!(hit("[CX4]", "CC"));
        assert!(hit("[N;v3]", "CN"));
    }

    #[test]
    fn test_ring_primitives() {
        assert!(hit("[R]", "C1CCCCC1"));
        assert!(!hit("[R]", "CCCC"));
        assert!(hit("[r5]", "C1CCCC1"));
        assert!(!hit("[r5]", "C1CCCCC1"));
        assert!(hit("[R2]", "c1ccc2ccccc2c1"));
        assert!(hit("C@C", "C1CCCCC1"));
        assert!(!hit("C!@C", "C1CCCCC1"));
        assert!(hit("[x3]", "c1ccc2ccccc2c1"));
    }

    #[test]
    fn test_logical_operators() {
        assert!(hit("[N,O]", "CCO"));
        assert!(hit("[!#6]", "CCO"));
        assert!(!hit("[!#6]", "CCC"));
        assert!(hit("[#7,O,S!D1]", "CSC"));
        assert!(!hit("[S!D1]", "CC=S"));
        assert!(hit("[C,N;H2]", "CCN"));
        assert!(hit("[O;H1;+0]", "CCO"));
    }

    #[test]
    fn test_bond_expressions() {
        assert!(hit("C-,:;!@C", "CCC"));
        assert!(!hit("C-,:;!@C", "C1CC1"));
        assert!(hit("c:c", "c1ccccc1"));
        assert!(hit("C~O", "CC=O"));
        assert!(hit("C#N", "CC#N"));
        assert!(!hit("C-N", "CC#N"));
    }

    #[test]
    fn test_recursive() {
        assert!(hit("[$(C=O)]O", "CC(=O)O"));
        assert!(!hit("[C;!$(C=O)]O", "C(=O)O"));
        assert!(hit("[!$(*#*)&!D1]", "CCC"));
    }

    #[test]
    fn test_explicit_hydrogens_merged() {
        let query = Smarts::new("[#8]-[#1]").unwrap();
        assert_eq!(query.atom_count(), 1);
        assert!(query.has_match(&parse_smiles("CCO").unwrap()));
        assert!(!query.has_match(&parse_smiles("COC").unwrap()));
    }

    #[test]
    fn test_matches_and_pinning() {
        let mol = parse_smiles("OCCO").unwrap();
        let query = Smarts::new("[OH]C").unwrap();
        assert_eq!(query.matches(&mol).len(), 2);
        assert!(query.matches_at(&mol, 0));
        assert!(!query.matches_at(&mol, 1));

        let benzene = parse_smiles("c1ccccc1").unwrap();
        let ring = Smarts::new("c1ccccc1").unwrap();
        assert_eq!(ring.matches(&benzene).len(), 12);
        assert_eq!(ring.unique_matches(&benzene).len(), 1);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(Smarts::new("").is_err());
        assert!(Smarts::new("[C").is_err());
        assert!(Smarts::new("C1CC").is_err());
        assert!(Smarts::new("[$(C]").is_err());
        assert!(Smarts::new("C)").is_err());
    }

    #[test]
    fn test_out_of_range_numbers() {
        assert!(Smarts::new("[#300]").is_err());
        assert!(Smarts::new("[CH999]").is_err());
        assert!(Smarts::new("[C+200]").is_err());
        let plus_run = format!("[C{}]", "+".repeat(130));
        assert!(Smarts::new(&plus_run).is_err());
        assert!(Smarts::new("[C+4]").is_ok());
    }
}
