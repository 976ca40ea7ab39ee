//! Ring perception (SSSR) and Hückel aromaticity.

use std::collections::{BTreeSet, HashSet, VecDeque};

use super::molecule::{Bond, BondOrder, Molecule};

/// Ring membership of a molecule.
#[derive(Debug, Clone, Default)]
pub(crate) struct RingInfo {
    /// Whether each bond lies on a cycle
    pub ring_bonds: Vec<bool>,
    /// SSSR rings as sorted atom lists
    pub rings: Vec<Vec<usize>>,
    /// SSSR rings as bond lists
    pub ring_bond_sets: Vec<Vec<usize>>,
    /// Indices into `rings` for every atom
    pub atom_rings: Vec<Vec<usize>>,
}

impl RingInfo {
    pub fn new(n_atoms: usize, bonds: &[Bond], adjacency: &[Vec<(usize, usize)>]) -> Self {
        let ring_bonds = cyclic_bonds(n_atoms, adjacency);
        let n_components = count_components(n_atoms, adjacency);
        let n_rings = (bonds.len() + n_components).saturating_sub(n_atoms);

        let ring_bond_sets = if n_rings == 0 {
            Vec::new()
        } else {
            smallest_set_of_rings(n_atoms, bonds, adjacency, &ring_bonds, n_rings)
        };

        let rings: Vec<Vec<usize>> = ring_bond_sets
            .iter()
            .map(|ring| {
                ring.iter()
                    .flat_map(|&bi| [bonds[bi].begin, bonds[bi].end])
                    .collect::<BTreeSet<usize>>()
                    .into_iter()
                    .collect()
            })
            .collect();

        let mut atom_rings = vec![Vec::new(); n_atoms];
        for (ri, ring) in rings.iter().enumerate() {
            for &a in ring {
                atom_rings[a].push(ri);
            }
        }

        RingInfo {
            ring_bonds,
            rings,
            ring_bond_sets,
            atom_rings,
        }
    }
}

/// Mark every bond that is not a bridge (Tarjan low-link, iterative).
pub(crate) fn cyclic_bonds(n_atoms: usize, adjacency: &[Vec<(usize, usize)>]) -> Vec<bool> {
    let n_bonds = adjacency.iter().map(|a| a.len()).sum::<usize>() / 2;
    let mut cyclic = vec![true; n_bonds];
    let mut disc = vec![usize::MAX; n_atoms];
    let mut low = vec![0usize; n_atoms];
    let mut timer = 0;

    for root in 0..n_atoms {
        if disc[root] != usize::MAX {
            continue;
        }
        // (atom, bond used to reach it, next neighbour position)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        disc[root] = timer;
        low[root] = timer;
        timer += 1;

        while let Some(top) = stack.last_mut() {
            let (u, parent_bond) = (top.0, top.1);
            if top.2 < adjacency[u].len() {
                let (v, bi) = adjacency[u][top.2];
                top.2 += 1;
                if Some(bi) == parent_bond {
                    continue;
                }
                if disc[v] == usize::MAX {
                    disc[v] = timer;
                    low[v] = timer;
                    timer += 1;
                    stack.push((v, Some(bi), 0));
                } else {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let (Some(bi), Some(&(p, _, _))) = (parent_bond, stack.last()) {
                    low[p] = low[p].min(low[u]);
                    if low[u] > disc[p] {
                        cyclic[bi] = false;
                    }
                }
            }
        }
    }
    cyclic
}

fn count_components(n_atoms: usize, adjacency: &[Vec<(usize, usize)>]) -> usize {
    let mut seen = vec![false; n_atoms];
    let mut count = 0;
    for start in 0..n_atoms {
        if seen[start] {
            continue;
        }
        count += 1;
        seen[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for &(v, _) in &adjacency[u] {
                if !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
    }
    count
}

/// Horton candidate cycles reduced to a minimum cycle basis over GF(2).
fn smallest_set_of_rings(
    n_atoms: usize,
    bonds: &[Bond],
    adjacency: &[Vec<(usize, usize)>],
    ring_bonds: &[bool],
    n_rings: usize,
) -> Vec<Vec<usize>> {
    let mut candidates: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for root in 0..n_atoms {
        if !adjacency[root].iter().any(|&(_, bi)| ring_bonds[bi]) {
            continue;
        }
        // BFS tree over ring bonds only
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; n_atoms];
        let mut dist = vec![usize::MAX; n_atoms];
        dist[root] = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(u) = queue.pop_front() {
            for &(v, bi) in &adjacency[u] {
                if ring_bonds[bi] && dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    parent[v] = Some((u, bi));
                    queue.push_back(v);
                }
            }
        }

        for (bi, bond) in bonds.iter().enumerate() {
            if !ring_bonds[bi] {
                continue;
            }
            let (u, v) = (bond.begin, bond.end);
            if dist[u] == usize::MAX || dist[v] == usize::MAX {
                continue;
            }
            if parent[u].map(|(_, b)| b) == Some(bi) || parent[v].map(|(_, b)| b) == Some(bi) {
                continue;
            }
            let (path_u, atoms_u) = path_to_root(u, &parent);
            let (path_v, atoms_v) = path_to_root(v, &parent);
            // Paths may only share the root
            if atoms_u.intersection(&atoms_v).any(|&a| a != root) {
                continue;
            }
            let mut cycle: Vec<usize> = path_u.into_iter().chain(path_v).collect();
            cycle.push(bi);
            cycle.sort_unstable();
            if seen.insert(cycle.clone()) {
                candidates.push(cycle);
            }
        }
    }

    candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let words = bonds.len().div_ceil(64);
    let mut basis: Vec<(usize, Vec<u64>)> = Vec::new();
    let mut rings = Vec::new();
    for cycle in candidates {
        if rings.len() == n_rings {
            break;
        }
        let mut bits = vec![0u64; words];
        for &bi in &cycle {
            bits[bi / 64] |= 1 << (bi % 64);
        }
        for (pivot, row) in &basis {
            if bits[pivot / 64] & (1 << (pivot % 64)) != 0 {
                for (w, r) in bits.iter_mut().zip(row) {
                    *w ^= r;
                }
            }
        }
        let pivot = bits
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 64 + w.trailing_zeros() as usize);
        if let Some(pivot) = pivot {
            basis.push((pivot, bits));
            rings.push(cycle);
        }
    }
    rings
}

fn path_to_root(
    start: usize,
    parent: &[Option<(usize, usize)>],
) -> (Vec<usize>, HashSet<usize>) {
    let mut path = Vec::new();
    let mut atoms = HashSet::from([start]);
    let mut current = start;
    while let Some((p, bi)) = parent[current] {
        path.push(bi);
        atoms.insert(p);
        current = p;
    }
    (path, atoms)
}

/// Count the pi electrons an atom donates to a ring, or `None` when the atom
/// cannot take part in an aromatic system.
fn pi_electrons(
    mol: &Molecule,
    atom: usize,
    in_ring: &dyn Fn(usize) -> bool,
    orders: &[BondOrder],
    aromatic: &[bool],
) -> Option<u8> {
    let a = &mol.atoms[atom];
    let z = a.atomic_number();
    let connections = mol.total_degree(atom);

    if orders_at(mol, atom, orders).any(|(_, o)| o == BondOrder::Triple) {
        return None;
    }

    // Exocyclic double bond partner and whether a ring double bond exists
    let mut ring_double = false;
    let mut exo_double = None;
    let mut ring_aromatic_bonds = 0;
    for (n, order) in orders_at(mol, atom, orders) {
        match order {
            BondOrder::Double if in_ring(n) => ring_double = true,
            BondOrder::Double => exo_double = Some(n),
            BondOrder::Aromatic if in_ring(n) => ring_aromatic_bonds += 1,
            _ => {}
        }
    }

    if a.aromatic && ring_aromatic_bonds > 0 {
        return match z {
            6 => match a.charge {
                -1 => Some(2),
                1 => Some(0),
                _ if exo_double.is_some_and(|n| is_electronegative(mol, n)) => Some(0),
                _ => Some(1),
            },
            7 | 15 | 33 => {
                if a.charge == -1 || (a.charge == 0 && connections == 3) {
                    Some(2)
                } else {
                    Some(1)
                }
            }
            8 | 16 | 34 | 52 => {
                if a.charge == 1 {
                    Some(1)
                } else {
                    Some(2)
                }
            }
            5 => Some(0),
            _ => None,
        };
    }

    if ring_double {
        return Some(1);
    }
    if let Some(partner) = exo_double {
        if z == 6 && is_electronegative(mol, partner) {
            return Some(0);
        }
        if aromatic[partner] {
            return Some(1);
        }
        return None;
    }

    match (z, a.charge) {
        (6, -1) => Some(2),
        (6, 1) => Some(0),
        (7 | 15 | 33, 0) if connections == 3 => Some(2),
        (7, -1) if connections == 2 => Some(2),
        (8 | 16 | 34 | 52, 0) if connections == 2 => Some(2),
        (5, 0) if connections == 3 => Some(0),
        _ => None,
    }
}

fn is_electronegative(mol: &Molecule, atom: usize) -> bool {
    matches!(mol.atoms[atom].atomic_number(), 7 | 8 | 16)
}

fn orders_at<'a>(
    mol: &'a Molecule,
    atom: usize,
    orders: &'a [BondOrder],
) -> impl Iterator<Item = (usize, BondOrder)> + 'a {
    mol.neighbors(atom).iter().map(move |&(n, bi)| (n, orders[bi]))
}

/// Whether a closed system of ring atoms satisfies the 4n+2 rule.
fn is_huckel(
    mol: &Molecule,
    ring_atoms: &[usize],
    orders: &[BondOrder],
    aromatic: &[bool],
) -> bool {
    let members: HashSet<usize> = ring_atoms.iter().copied().collect();
    let in_ring = |a: usize| members.contains(&a);
    let mut electrons = 0u32;
    for &a in ring_atoms {
        match pi_electrons(mol, a, &in_ring, orders, aromatic) {
            Some(e) => electrons += e as u32,
            None => return false,
        }
    }
    electrons >= 2 && electrons % 4 == 2
}

/// Flag aromatic atoms and bonds. Rings are tested one at a time and then as
/// fused pairs, repeating while new rings are found so that Kekulé input of
/// fused systems converges to the same flags as aromatic input.
pub(crate) fn perceive_aromaticity(mol: &mut Molecule) {
    let n_rings = mol.rings().len();
    if n_rings == 0 {
        return;
    }
    let orders: Vec<BondOrder> = mol.bonds.iter().map(|b| b.order).collect();
    let mut aromatic: Vec<bool> = mol.atoms.iter().map(|a| a.aromatic).collect();
    let mut ring_done = vec![false; n_rings];
    let mut systems: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();

    loop {
        let mut changed = false;

        for ri in 0..n_rings {
            if ring_done[ri] || mol.rings()[ri].len() < 3 {
                continue;
            }
            let atoms = mol.rings()[ri].clone();
            if is_huckel(mol, &atoms, &orders, &aromatic) {
                ring_done[ri] = true;
                changed = true;
                atoms.iter().for_each(|&a| aromatic[a] = true);
                systems.push((atoms, mol.ring_bonds()[ri].clone()));
            }
        }

        for ri in 0..n_rings {
            for rj in (ri + 1)..n_rings {
                if ring_done[ri] && ring_done[rj] {
                    continue;
                }
                let bonds_i = &mol.ring_bonds()[ri];
                let bonds_j = &mol.ring_bonds()[rj];
                if !bonds_i.iter().any(|b| bonds_j.contains(b)) {
                    continue;
                }
                let atoms: Vec<usize> = mol.rings()[ri]
                    .iter()
                    .chain(&mol.rings()[rj])
                    .copied()
                    .collect::<BTreeSet<usize>>()
                    .into_iter()
                    .collect();
                if is_huckel(mol, &atoms, &orders, &aromatic) {
                    ring_done[ri] = true;
                    ring_done[rj] = true;
                    changed = true;
                    atoms.iter().for_each(|&a| aromatic[a] = true);
                    let bonds: Vec<usize> = bonds_i
                        .iter()
                        .chain(bonds_j)
                        .copied()
                        .collect::<BTreeSet<usize>>()
                        .into_iter()
                        .collect();
                    systems.push((atoms, bonds));
                }
            }
        }

        if !changed {
            break;
        }
    }

    for (atoms, bonds) in systems {
        mol.set_aromatic(&atoms, &bonds);
    }
}

#[cfg(test)]
mod tests {
    use crate::chem::{parse_smiles, BondOrder};

    #[test]
    fn test_ring_counts() {
        assert!(parse_smiles("CCO").unwrap().rings().is_empty());
        assert_eq!(parse_smiles("c1ccccc1").unwrap().rings().len(), 1);
        assert_eq!(parse_smiles("c1ccc2ccccc2c1").unwrap().rings().len(), 2);
        // Cubane: 12 bonds, 8 atoms, 5 independent rings
        let cubane = parse_smiles("C12C3C4C1C5C2C3C45").unwrap();
        assert_eq!(cubane.rings().len(), 5);
        assert!(cubane.rings().iter().all(|r| r.len() == 4));
    }

    #[test]
    fn test_ring_bonds() {
        let mol = parse_smiles("c1ccccc1CC").unwrap();
        let chain_bond = mol.bond_between(5, 6).unwrap();
        assert!(!mol.is_ring_bond(chain_bond));
        let ring_bond = mol.bond_between(0, 1).unwrap();
        assert!(mol.is_ring_bond(ring_bond));
        assert!(mol.in_ring_of_size(0, 6));
        assert!(!mol.in_ring_of_size(0, 5));
    }

    #[test]
    fn test_kekule_benzene_is_aromatic() {
        let mol = parse_smiles("C1=CC=CC=C1").unwrap();
        assert!(mol.atoms.iter().all(|a| a.aromatic));
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn test_kekule_fused_and_hetero_rings() {
        let naphthalene = parse_smiles("C1=CC=C2C=CC=CC2=C1").unwrap();
        assert!(naphthalene.atoms.iter().all(|a| a.aromatic));

        let pyrrole = parse_smiles("C1=CNC=C1").unwrap();
        assert!(pyrrole.atoms.iter().all(|a| a.aromatic));

        let pyridone = parse_smiles("O=C1C=CC=CN1").unwrap();
        assert!(pyridone.atoms[1..].iter().all(|a| a.aromatic));
        assert!(!pyridone.atoms[0].aromatic);
    }

    #[test]
    fn test_non_aromatic_rings() {
        let cyclohexene = parse_smiles("C1=CCCCC1").unwrap();
        assert!(cyclohexene.atoms.iter().all(|a| !a.aromatic));

        let quinone = parse_smiles("O=C1C=CC(=O)C=C1").unwrap();
        assert!(quinone.atoms.iter().all(|a| !a.aromatic));
    }
}
