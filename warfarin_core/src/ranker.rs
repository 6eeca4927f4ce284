//! Suggestion ranking: deduplicate, order and cap the assembled regimens.

use crate::types::DOSE_EPSILON;
use crate::RegimenOption;
use std::collections::HashSet;

/// Per-day tablet lists in half-tablet units, used to spot equal schedules
type ScheduleKey = Vec<Vec<(u32, u32)>>;

fn schedule_key(option: &RegimenOption) -> ScheduleKey {
    option
        .weekly_schedule
        .iter()
        .map(|day| {
            day.pills
                .iter()
                .map(|p| (p.strength_mg, (p.count * 2.0).round() as u32))
                .collect()
        })
        .collect()
}

/// Order regimens for review and keep the best `limit`
///
/// Ordering:
/// 1. Closest weekly total to `weekly_target` (exact first)
/// 2. Fewest distinct tablet strengths across the week
/// 3. Fewest half-tablet doses
/// 4. Fewest dose tiers (uniform before split)
/// 5. Fewest tablet pieces per week
///
/// Remaining ties keep their input order. An empty input yields an empty
/// list, meaning nothing fits the constraints.
pub fn rank(
    candidates: Vec<RegimenOption>,
    weekly_target: f64,
    limit: usize,
) -> Vec<RegimenOption> {
    let mut seen = HashSet::new();
    let mut options: Vec<RegimenOption> = candidates
        .into_iter()
        .filter(|option| seen.insert(schedule_key(option)))
        .collect();

    let deviation = |option: &RegimenOption| {
        let gap = (option.weekly_dose_actual - weekly_target).abs();
        if gap < DOSE_EPSILON {
            0.0
        } else {
            gap
        }
    };

    options.sort_by(|a, b| {
        deviation(a)
            .total_cmp(&deviation(b))
            .then_with(|| a.strengths_used().len().cmp(&b.strengths_used().len()))
            .then_with(|| a.half_tablet_count().cmp(&b.half_tablet_count()))
            .then_with(|| a.dose_tiers().cmp(&b.dose_tiers()))
            .then_with(|| a.tablet_pieces().cmp(&b.tablet_pieces()))
    });

    options.truncate(limit);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DaySchedule, PillUsage, TotalPillsSummary};

    fn option(description: &str, days: [Vec<PillUsage>; 7]) -> RegimenOption {
        let weekly_schedule: Vec<DaySchedule> = days
            .into_iter()
            .enumerate()
            .map(|(day_index, pills)| DaySchedule {
                day_index,
                total_dose_mg: pills.iter().map(PillUsage::dose_mg).sum(),
                is_stop_day: pills.is_empty(),
                is_special_day: false,
                pills,
            })
            .collect();
        RegimenOption {
            description: description.to_string(),
            weekly_dose_actual: weekly_schedule.iter().map(|d| d.total_dose_mg).sum(),
            weekly_schedule,
            total_pills_summary: TotalPillsSummary {
                header: String::new(),
                pill_lines: vec![],
            },
        }
    }

    fn every_day(pills: Vec<PillUsage>) -> [Vec<PillUsage>; 7] {
        std::array::from_fn(|_| pills.clone())
    }

    fn descriptions(options: &[RegimenOption]) -> Vec<&str> {
        options.iter().map(|o| o.description.as_str()).collect()
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        assert!(rank(vec![], 35.0, 5).is_empty());
    }

    #[test]
    fn test_exact_total_ranks_first() {
        let near = option("4.5 mg daily", every_day(vec![PillUsage::new(3, 1, true)]));
        let exact = option(
            "mixed",
            every_day(vec![PillUsage::new(2, 1, false), PillUsage::new(3, 0, true)]),
        );
        let ranked = rank(vec![near, exact], 24.5, 5);
        assert_eq!(descriptions(&ranked), vec!["mixed", "4.5 mg daily"]);
    }

    #[test]
    fn test_fewer_strengths_then_fewer_halves() {
        let two_strengths = option(
            "two strengths",
            every_day(vec![PillUsage::new(1, 1, false), PillUsage::new(3, 1, false)]),
        );
        let halves = option("halves", every_day(vec![PillUsage::new(8, 0, true)]));
        let whole = option("whole", every_day(vec![PillUsage::new(2, 2, false)]));

        let ranked = rank(vec![two_strengths, halves, whole], 28.0, 5);
        assert_eq!(descriptions(&ranked), vec!["whole", "halves", "two strengths"]);
    }

    #[test]
    fn test_duplicate_schedules_removed() {
        let a = option("5 mg daily", every_day(vec![PillUsage::new(5, 1, false)]));
        let b = option("same again", every_day(vec![PillUsage::new(5, 1, false)]));
        let ranked = rank(vec![a, b], 35.0, 5);
        assert_eq!(descriptions(&ranked), vec!["5 mg daily"]);
    }

    #[test]
    fn test_limit_applied() {
        let candidates: Vec<RegimenOption> = (1..=8)
            .map(|mg| {
                let pills = vec![PillUsage::new(mg, 1, false)];
                option(&format!("{} mg", mg), every_day(pills))
            })
            .collect();
        let ranked = rank(candidates, 21.0, 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].description, "3 mg");
    }
}
