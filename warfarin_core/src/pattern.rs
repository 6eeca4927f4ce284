//! Day-pattern enumeration: splitting a weekly dose into dose tiers.
//!
//! A tier assignment gives every weekday one of at most two daily doses: the
//! base dose, and a special dose on a group of days drawn from the
//! [`SpecialDayPattern`] (see [`SpecialDayPattern::day_groups`]: Fri–Sun may
//! single out Sunday, Saturday and Sunday, or all three). For every group,
//! candidates come from a fixed rule table:
//!
//! | rule          | base target                    | special dose                     |
//! |---------------|--------------------------------|----------------------------------|
//! | uniform       | weekly / 7                     | same as base                     |
//! | `EvenSplit`   | weekly / 7                     | remainder spread over special days |
//! | `StopDays`    | weekly / base days             | 0 (stop days)                    |
//! | `Scaled(r)`   | weekly / (base + r × special)  | remainder spread over special days |
//!
//! with `r` in {0.5, 1.5, 2}. Each base target and each per-day remainder is
//! snapped to the reachable doses just below and just above it, so every
//! emitted tier can be realized with tablets.
//! Whether the weekly total matches is left to the assembler.

use crate::config::SearchLimits;
use crate::decompose::Decomposer;
use crate::types::{half_mg_to_mg, HalfMg, DAYS_PER_WEEK, DOSE_EPSILON};
use crate::SpecialDayPattern;
use std::collections::HashSet;

/// How a split rule chooses the base and special doses
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TierRule {
    /// Base near an even split, special days absorb the remainder
    EvenSplit,
    /// Special days get nothing, base days carry the whole week
    StopDays,
    /// Special days carry roughly `ratio` times the base dose
    Scaled(f64),
}

/// Split rules tried for every special day group, in order
pub static TIER_RULES: [TierRule; 5] = [
    TierRule::EvenSplit,
    TierRule::StopDays,
    TierRule::Scaled(0.5),
    TierRule::Scaled(1.5),
    TierRule::Scaled(2.0),
];

impl TierRule {
    /// Ideal base dose for this rule before snapping
    fn base_target(&self, weekly_dose: f64, special_count: usize) -> f64 {
        let base_count = (DAYS_PER_WEEK - special_count) as f64;
        let special_count = special_count as f64;
        match self {
            TierRule::EvenSplit => weekly_dose / DAYS_PER_WEEK as f64,
            TierRule::StopDays => weekly_dose / base_count,
            TierRule::Scaled(ratio) => weekly_dose / (base_count + special_count * ratio),
        }
    }
}

/// Daily doses for the 7 weekdays, in two tiers at most
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TierAssignment {
    base: HalfMg,
    special: HalfMg,
    special_days: &'static [usize],
}

impl TierAssignment {
    pub(crate) fn uniform(dose: HalfMg) -> Self {
        Self {
            base: dose,
            special: dose,
            special_days: &[],
        }
    }

    /// Two-tier assignment; collapses to uniform when both tiers agree
    pub(crate) fn split(base: HalfMg, special: HalfMg, special_days: &'static [usize]) -> Self {
        if base == special || special_days.is_empty() {
            Self::uniform(base)
        } else {
            Self {
                base,
                special,
                special_days,
            }
        }
    }

    pub fn is_uniform(&self) -> bool {
        self.special_days.is_empty()
    }

    pub fn base_mg(&self) -> f64 {
        half_mg_to_mg(self.base)
    }

    pub fn special_mg(&self) -> f64 {
        half_mg_to_mg(self.special)
    }

    /// Day indices on the special tier (empty when uniform)
    pub fn special_days(&self) -> &'static [usize] {
        self.special_days
    }

    pub fn is_special(&self, day_index: usize) -> bool {
        self.special_days.contains(&day_index)
    }

    pub(crate) fn dose_units(&self, day_index: usize) -> HalfMg {
        if self.is_special(day_index) {
            self.special
        } else {
            self.base
        }
    }

    /// Distinct dose levels, base first
    pub(crate) fn levels(&self) -> Vec<HalfMg> {
        if self.is_uniform() {
            vec![self.base]
        } else {
            vec![self.base, self.special]
        }
    }

    pub fn weekly_mg(&self) -> f64 {
        (0..DAYS_PER_WEEK)
            .map(|day| half_mg_to_mg(self.dose_units(day)))
            .sum()
    }

    fn max_units(&self) -> HalfMg {
        self.base.max(self.special)
    }
}

/// Lazily enumerate the tier assignments worth assembling for one target
///
/// The uniform split always comes first; duplicates and assignments that
/// break a dose ceiling are skipped.
pub fn enumerate<'a>(
    weekly_dose: f64,
    pattern: SpecialDayPattern,
    decomposer: &'a Decomposer,
    limits: &'a SearchLimits,
) -> impl Iterator<Item = TierAssignment> + 'a {
    let uniform = snapped(decomposer, weekly_dose / DAYS_PER_WEEK as f64)
        .into_iter()
        .map(TierAssignment::uniform);

    let split = pattern.day_groups().iter().flat_map(move |&special_days| {
        TIER_RULES.iter().flat_map(move |rule| {
            split_candidates(*rule, weekly_dose, special_days, decomposer)
        })
    });

    let mut seen = HashSet::new();
    uniform
        .chain(split)
        .filter(move |assignment| admissible(assignment, weekly_dose, limits))
        .filter(move |assignment| seen.insert(assignment.clone()))
}

/// Reachable doses just below and just above `target_mg`
fn snapped(decomposer: &Decomposer, target_mg: f64) -> Vec<HalfMg> {
    let (below, above) = decomposer.neighbours(target_mg);
    let mut doses: Vec<HalfMg> = below.into_iter().chain(above).collect();
    doses.dedup();
    doses
}

fn split_candidates(
    rule: TierRule,
    weekly_dose: f64,
    special_days: &'static [usize],
    decomposer: &Decomposer,
) -> Vec<TierAssignment> {
    let special_count = special_days.len();
    let base_count = DAYS_PER_WEEK - special_count;

    let mut candidates = Vec::new();
    for base in snapped(decomposer, rule.base_target(weekly_dose, special_count)) {
        let specials = match rule {
            TierRule::StopDays => vec![0],
            TierRule::EvenSplit | TierRule::Scaled(_) => {
                let remainder = weekly_dose - half_mg_to_mg(base) * base_count as f64;
                if remainder < -DOSE_EPSILON {
                    continue;
                }
                snapped(decomposer, remainder / special_count as f64)
            }
        };
        for special in specials {
            candidates.push(TierAssignment::split(base, special, special_days));
        }
    }
    candidates
}

fn admissible(assignment: &TierAssignment, weekly_dose: f64, limits: &SearchLimits) -> bool {
    let ceiling = weekly_dose.min(limits.max_daily_dose_mg);
    if half_mg_to_mg(assignment.max_units()) > ceiling + DOSE_EPSILON {
        return false;
    }

    if assignment.is_uniform() {
        return true;
    }

    // Split regimens keep base days dosed; raised special days stay bounded
    if assignment.base == 0 {
        return false;
    }
    if assignment.special > assignment.base {
        let limit = assignment.base_mg() * limits.special_dose_multiplier_limit;
        if assignment.special_mg() > limit + DOSE_EPSILON {
            return false;
        }
    }
    true
}
