//! MaxMin diversity picking (Ashton et al., Quant. Struct.-Act. Relat. 2002).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::trace;

use crate::error::{LigError, Result};
use crate::fingerprint::MorganFingerprint;

/// Greedy farthest-point picker over a lazily evaluated distance function.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxMinPicker;

impl MaxMinPicker {
    /// A picker; it holds no state.
    pub fn new() -> Self {
        MaxMinPicker
    }

    /// Pick `pick_size` items out of `0..pool_size`.
    ///
    /// The first item is drawn at random from `seed`; every following pick is
    /// the item whose distance to its nearest picked item is largest, the
    /// lowest index winning ties. Distances are only computed against picked
    /// items. Returns indices in pick order.
    pub fn lazy_pick<F>(
        &self,
        distance: F,
        pool_size: usize,
        pick_size: usize,
        seed: u64,
    ) -> Result<Vec<usize>>
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        if pick_size > pool_size {
            return Err(LigError::PickSize {
                pick_size,
                pool_size,
            });
        }
        if pick_size == 0 {
            return Ok(Vec::new());
        }
        if pick_size == pool_size {
            return Ok((0..pool_size).collect());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let first = rng.gen_range(0..pool_size);
        let mut picks = Vec::with_capacity(pick_size);
        let mut picked = vec![false; pool_size];
        let mut min_dist = vec![f64::INFINITY; pool_size];

        let mut latest = first;
        loop {
            picks.push(latest);
            picked[latest] = true;
            if picks.len() == pick_size {
                break;
            }

            min_dist
                .par_iter_mut()
                .enumerate()
                .filter(|(i, _)| !picked[*i])
                .for_each(|(i, d)| *d = d.min(distance(i, latest)));

            let mut best: Option<(usize, f64)> = None;
            for (i, &d) in min_dist.iter().enumerate() {
                if picked[i] {
                    continue;
                }
                if best.map_or(true, |(_, best_d)| d > best_d) {
                    best = Some((i, d));
                }
            }
            let Some((next, d)) = best else { break };
            trace!("Picked {next} at distance {d:.4}");
            latest = next;
        }
        Ok(picks)
    }
}

/// Pick a diverse subset of fingerprints with distance `1 - Dice`.
pub fn pick_diverse(fps: &[MorganFingerprint], pick_size: usize, seed: u64) -> Result<Vec<usize>> {
    MaxMinPicker::new().lazy_pick(
        |i, j| 1.0 - fps[i].dice_similarity(&fps[j]),
        fps.len(),
        pick_size,
        seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::parse_smiles;

    /// Points on a line, distance is the gap between them.
    fn line_distance(points: &[f64]) -> impl Fn(usize, usize) -> f64 + Sync + '_ {
        move |i, j| (points[i] - points[j]).abs()
    }

    #[test]
    fn test_farthest_point_order() {
        let points = [0.0, 1.0, 2.0, 3.0, 10.0];
        let picker = MaxMinPicker::new();
        let picks = picker.lazy_pick(line_distance(&points), 5, 3, 23).unwrap();
        assert_eq!(picks.len(), 3);

        // after the random first pick, the next two are the extremes seen from it
        let first = picks[0];
        let second = if points[first] >= 5.0 { 0 } else { 4 };
        assert_eq!(picks[1], second);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let points: Vec<f64> = (0..50).map(|i| ((i * 37) % 101) as f64).collect();
        let picker = MaxMinPicker::new();
        let a = picker.lazy_pick(line_distance(&points), 50, 10, 7).unwrap();
        let b = picker.lazy_pick(line_distance(&points), 50, 10, 7).unwrap();
        assert_eq!(a, b);
        let mut unique = a.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_ties_take_lowest_index() {
        // every pair is equally far apart
        let picker = MaxMinPicker::new();
        let picks = picker.lazy_pick(|i, j| if i == j { 0.0 } else { 1.0 }, 6, 4, 3).unwrap();
        let rest: Vec<usize> = (0..6).filter(|i| *i != picks[0]).take(3).collect();
        assert_eq!(&picks[1..], rest.as_slice());
    }

    #[test]
    fn test_pick_sizes() {
        let picker = MaxMinPicker::new();
        let all = picker.lazy_pick(|_, _| 1.0, 4, 4, 23).unwrap();
        assert_eq!(all, vec![0, 1, 2, 3]);
        assert!(picker.lazy_pick(|_, _| 1.0, 4, 0, 23).unwrap().is_empty());
        assert!(matches!(
            picker.lazy_pick(|_, _| 1.0, 3, 4, 23),
            Err(LigError::PickSize {
                pick_size: 4,
                pool_size: 3
            })
        ));
    }

    #[test]
    fn test_pick_diverse_molecules() {
        let fps: Vec<MorganFingerprint> = ["CCO", "CCCO", "CCCCO", "c1ccccc1", "c1ccncc1"]
            .iter()
            .map(|s| MorganFingerprint::new(&parse_smiles(s).unwrap(), 3))
            .collect();
        let picks = pick_diverse(&fps, 2, 23).unwrap();
        assert_eq!(picks.len(), 2);
        assert_ne!(picks[0], picks[1]);
    }
}
