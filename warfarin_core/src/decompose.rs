//! Tablet decomposition: turning one day's dose into tablets.
//!
//! The search is an exhaustive bounded enumeration rather than greedy coin
//! change, which is not optimal for arbitrary denominations (6 mg from
//! {1, 3, 4} is 3+3, not 4+1+1). Every combination of at most
//! `max_tablets_per_day` pieces is visited once per calculation and the best
//! combination for each reachable dose is kept in a table.
//!
//! Combinations are ranked by:
//! 1. Fewest tablet pieces (a half tablet is one piece)
//! 2. Fewest distinct strengths
//! 3. Fewest half tablets
//! 4. Larger strengths first
//!
//! Fewer halves deliberately outranks larger strengths: splitting is the
//! main source of dosing error, so 1 mg from {1, 2, 3, 5} is one whole 1 mg
//! tablet rather than half of a 2 mg tablet.

use crate::catalog::TabletSet;
use crate::types::{half_mg_to_mg, HalfMg, DOSE_EPSILON};
use crate::PillUsage;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Tablets realizing one daily dose
#[derive(Clone, Debug, PartialEq)]
pub struct Decomposition {
    pub dose_mg: f64,
    /// Ascending by strength
    pub pills: Vec<PillUsage>,
    /// False when the dose is only the closest reachable one
    pub exact: bool,
}

impl Decomposition {
    pub fn is_stop(&self) -> bool {
        self.pills.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CostKey {
    pieces: u32,
    distinct: usize,
    halves: u32,
    larger_first: Reverse<Vec<u32>>,
}

#[derive(Clone, Debug)]
struct Combination {
    key: CostKey,
    pills: Vec<PillUsage>,
}

impl Combination {
    /// `counts` holds (whole tablets, half tablet) per strength, ascending
    fn from_counts(strengths: &[u32], counts: &[(u32, bool)]) -> Self {
        let mut pills = Vec::new();
        let mut per_piece = Vec::new();

        for (&strength_mg, &(whole, half)) in strengths.iter().zip(counts) {
            if whole == 0 && !half {
                continue;
            }
            let usage = PillUsage::new(strength_mg, whole, half);
            per_piece.extend(std::iter::repeat(strength_mg).take(usage.pieces() as usize));
            pills.push(usage);
        }
        per_piece.sort_unstable_by(|a, b| b.cmp(a));

        let key = CostKey {
            pieces: per_piece.len() as u32,
            distinct: pills.len(),
            halves: pills.iter().filter(|p| p.is_half).count() as u32,
            larger_first: Reverse(per_piece),
        };

        Self { key, pills }
    }
}

/// Best tablet combination for every dose reachable with one tablet set
#[derive(Clone, Debug)]
pub struct Decomposer {
    allow_half: bool,
    table: BTreeMap<HalfMg, Combination>,
}

impl Decomposer {
    pub fn new(tablets: &TabletSet, allow_half: bool, max_tablets_per_day: u32) -> Self {
        let strengths = tablets.strengths();
        let mut table = BTreeMap::new();
        let mut counts = vec![(0, false); strengths.len()];

        search(
            strengths,
            allow_half,
            0,
            max_tablets_per_day,
            0,
            &mut counts,
            &mut table,
        );

        tracing::debug!(
            "Tabulated {} reachable daily doses from {:?} mg (half tablets: {})",
            table.len(),
            strengths,
            allow_half
        );

        Self { allow_half, table }
    }

    /// Dosing granularity in mg
    pub fn unit_mg(&self) -> f64 {
        if self.allow_half {
            0.5
        } else {
            1.0
        }
    }

    /// Tablets realizing exactly `target_mg`, if reachable
    pub fn exact(&self, target_mg: f64) -> Option<Decomposition> {
        let units = to_units(target_mg)?;
        if (units - units.round()).abs() > DOSE_EPSILON {
            return None;
        }
        self.lookup(units.round() as HalfMg)
    }

    /// Tablets realizing `target_mg`, or the closest reachable dose within
    /// `tolerance_mg` marked as inexact
    pub fn decompose(&self, target_mg: f64, tolerance_mg: f64) -> Option<Decomposition> {
        if let Some(exact) = self.exact(target_mg) {
            return Some(exact);
        }
        let nearest = self.nearest(target_mg)?;
        let mut decomposition = self.lookup(nearest)?;
        if (decomposition.dose_mg - target_mg).abs() > tolerance_mg + DOSE_EPSILON {
            return None;
        }
        decomposition.exact = false;
        Some(decomposition)
    }

    pub(crate) fn lookup(&self, units: HalfMg) -> Option<Decomposition> {
        self.table.get(&units).map(|combination| Decomposition {
            dose_mg: half_mg_to_mg(units),
            pills: combination.pills.clone(),
            exact: true,
        })
    }

    /// Closest reachable doses at or below and at or above `target_mg`
    pub(crate) fn neighbours(&self, target_mg: f64) -> (Option<HalfMg>, Option<HalfMg>) {
        let Some(units) = to_units(target_mg) else {
            return (None, None);
        };
        let floor = (units + DOSE_EPSILON).floor() as HalfMg;
        let ceil = (units - DOSE_EPSILON).ceil() as HalfMg;

        let below = self.table.range(..=floor).next_back().map(|(&k, _)| k);
        let above = self.table.range(ceil..).next().map(|(&k, _)| k);
        (below, above)
    }

    /// Closest reachable dose, preferring the lower one on a tie
    pub(crate) fn nearest(&self, target_mg: f64) -> Option<HalfMg> {
        match self.neighbours(target_mg) {
            (Some(below), Some(above)) => {
                let below_gap = target_mg - half_mg_to_mg(below);
                let above_gap = half_mg_to_mg(above) - target_mg;
                if above_gap + DOSE_EPSILON < below_gap {
                    Some(above)
                } else {
                    Some(below)
                }
            }
            (below, above) => below.or(above),
        }
    }
}

fn to_units(mg: f64) -> Option<f64> {
    (mg.is_finite() && mg >= -DOSE_EPSILON).then(|| (mg * 2.0).max(0.0))
}

fn search(
    strengths: &[u32],
    allow_half: bool,
    index: usize,
    pieces_left: u32,
    dose: HalfMg,
    counts: &mut Vec<(u32, bool)>,
    table: &mut BTreeMap<HalfMg, Combination>,
) {
    if index == strengths.len() {
        let candidate = Combination::from_counts(strengths, counts);
        match table.get(&dose) {
            Some(best) if best.key <= candidate.key => {}
            _ => {
                table.insert(dose, candidate);
            }
        }
        return;
    }

    let strength = strengths[index];
    for whole in 0..=pieces_left {
        for half in [false, true] {
            if half && !allow_half {
                continue;
            }
            let pieces = whole + u32::from(half);
            if pieces > pieces_left {
                continue;
            }
            // Overflowing doses are unreachable, not a panic
            let Some(total) = whole
                .checked_mul(2)
                .and_then(|n| n.checked_mul(strength))
                .and_then(|n| n.checked_add(if half { strength } else { 0 }))
                .and_then(|n| n.checked_add(dose))
            else {
                continue;
            };
            counts[index] = (whole, half);
            search(
                strengths,
                allow_half,
                index + 1,
                pieces_left - pieces,
                total,
                counts,
                table,
            );
        }
    }
    counts[index] = (0, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decomposer(strengths: &[u32], allow_half: bool) -> Decomposer {
        Decomposer::new(&TabletSet::new(strengths).unwrap(), allow_half, 4)
    }

    fn reachable(d: &Decomposer) -> Vec<f64> {
        d.table.keys().map(|&units| half_mg_to_mg(units)).collect()
    }

    fn as_pairs(decomposition: &Decomposition) -> Vec<(u32, f64)> {
        decomposition
            .pills
            .iter()
            .map(|p| (p.strength_mg, p.count))
            .collect()
    }

    #[test]
    fn test_single_tablet_preferred() {
        let d = decomposer(&[1, 2, 3, 5], true);
        let five = d.exact(5.0).unwrap();
        assert_eq!(as_pairs(&five), vec![(5, 1.0)]);
        assert!(five.exact);
    }

    #[test]
    fn test_half_tablet_for_half_dose() {
        let d = decomposer(&[1, 2, 3, 5], true);
        let dose = d.exact(2.5).unwrap();
        assert_eq!(as_pairs(&dose), vec![(5, 0.5)]);
        assert!(dose.pills[0].is_half);
    }

    #[test]
    fn test_beats_greedy_coin_change() {
        // Greedy picks 4+1+1
        let d = decomposer(&[1, 3, 4], false);
        let dose = d.exact(6.0).unwrap();
        assert_eq!(as_pairs(&dose), vec![(3, 2.0)]);
    }

    #[test]
    fn test_fewer_distinct_strengths_on_tie() {
        // 4 = 2+2 or 1+3, both two tablets
        let d = decomposer(&[1, 2, 3], false);
        assert_eq!(as_pairs(&d.exact(4.0).unwrap()), vec![(2, 2.0)]);
    }

    #[test]
    fn test_whole_tablet_before_half_of_larger() {
        let d = decomposer(&[3, 6], true);
        assert_eq!(as_pairs(&d.exact(3.0).unwrap()), vec![(3, 1.0)]);
    }

    #[test]
    fn test_whole_small_tablet_before_half_of_larger() {
        let d = decomposer(&[1, 2, 3, 5], true);
        assert_eq!(as_pairs(&d.exact(1.0).unwrap()), vec![(1, 1.0)]);
    }

    #[test]
    fn test_largest_tablet_strength_does_not_overflow() {
        let d = decomposer(&[2, crate::catalog::MAX_TABLET_STRENGTH_MG], true);
        let dose = d.exact(4000.0).unwrap();
        assert_eq!(as_pairs(&dose), vec![(1000, 4.0)]);
    }

    #[test]
    fn test_larger_strengths_break_remaining_ties() {
        // 7 = 5+2 or 4+3: same pieces, same distinct count
        let d = decomposer(&[2, 3, 4, 5], false);
        assert_eq!(as_pairs(&d.exact(7.0).unwrap()), vec![(2, 1.0), (5, 1.0)]);
    }

    #[test]
    fn test_zero_dose_is_empty() {
        let d = decomposer(&[2, 3], false);
        let zero = d.exact(0.0).unwrap();
        assert!(zero.is_stop());
        assert_eq!(zero.dose_mg, 0.0);
    }

    #[test]
    fn test_half_units_need_allow_half() {
        let d = decomposer(&[1, 2, 3, 5], false);
        assert!(d.exact(2.5).is_none());
        assert_eq!(d.unit_mg(), 1.0);
    }

    #[test]
    fn test_piece_cap_limits_reach() {
        let d = Decomposer::new(&TabletSet::new(&[1]).unwrap(), false, 4);
        assert!(d.exact(4.0).is_some());
        assert!(d.exact(5.0).is_none());
        assert_eq!(reachable(&d), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_closest_dose_within_tolerance() {
        let d = decomposer(&[2, 3], false);
        // 1 mg is unreachable; 0 and 2 are equally close, lower wins
        let closest = d.decompose(1.0, 1.0).unwrap();
        assert!(!closest.exact);
        assert_eq!(closest.dose_mg, 0.0);

        let near = d.decompose(4.2, 0.5).unwrap();
        assert!(!near.exact);
        assert_eq!(near.dose_mg, 4.0);

        assert!(d.decompose(1.0, 0.5).is_none());
    }

    #[test]
    fn test_neighbours_bracket_target() {
        let d = decomposer(&[2, 3], false);
        assert_eq!(d.neighbours(30.0 / 7.0), (Some(8), Some(10)));
        assert_eq!(d.neighbours(3.0), (Some(6), Some(6)));
        assert_eq!(d.neighbours(-1.0), (None, None));
    }

    #[test]
    fn test_at_most_one_half_per_strength() {
        let d = decomposer(&[5], true);
        let dose = d.exact(5.0).unwrap();
        assert_eq!(as_pairs(&dose), vec![(5, 1.0)]);
        for dose in reachable(&d) {
            let decomposition = d.exact(dose).unwrap();
            for pill in &decomposition.pills {
                assert_eq!(pill.is_half, pill.count.fract() == 0.5);
            }
        }
    }
}
