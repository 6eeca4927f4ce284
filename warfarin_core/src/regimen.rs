//! Regimen assembly: tier assignments become 7-day tablet schedules.

use crate::decompose::{Decomposer, Decomposition};
use crate::pattern::TierAssignment;
use crate::types::{format_mg, half_mg_to_mg, HalfMg, DAYS_PER_WEEK, DAY_NAMES, DOSE_EPSILON};
use crate::{DaySchedule, RegimenOption, TotalPillsSummary};

/// A weekly schedule before its dispensing summary is attached
#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyRegimen {
    pub description: String,
    pub weekly_dose_actual: f64,
    pub weekly_schedule: Vec<DaySchedule>,
    /// Distance between the realized and prescribed weekly dose
    pub deviation_mg: f64,
    /// Every dose level was decomposed exactly
    pub levels_exact: bool,
}

impl WeeklyRegimen {
    pub fn is_exact(&self) -> bool {
        self.levels_exact && self.deviation_mg < DOSE_EPSILON
    }

    pub fn into_option(self, total_pills_summary: TotalPillsSummary) -> RegimenOption {
        RegimenOption {
            description: self.description,
            weekly_dose_actual: self.weekly_dose_actual,
            weekly_schedule: self.weekly_schedule,
            total_pills_summary,
        }
    }
}

/// Build the 7-day schedule for one tier assignment
///
/// Returns `None` when a tier cannot be realized with tablets, the weekly
/// total misses the target by more than `tolerance_mg`, or a nonzero target
/// would become a week without any dose.
pub fn assemble(
    assignment: &TierAssignment,
    decomposer: &Decomposer,
    weekly_target: f64,
    tolerance_mg: f64,
) -> Option<WeeklyRegimen> {
    let planned_mg = assignment.weekly_mg();
    if (planned_mg - weekly_target).abs() > tolerance_mg + DOSE_EPSILON {
        tracing::trace!(
            "Rejected {:?}: {} mg/week misses target {} mg",
            assignment,
            planned_mg,
            weekly_target
        );
        return None;
    }
    if weekly_target > DOSE_EPSILON && planned_mg < DOSE_EPSILON {
        tracing::trace!("Rejected all-stop week for target {} mg", weekly_target);
        return None;
    }

    // One decomposition per dose level, shared by every day on that level
    let mut levels: Vec<(HalfMg, Decomposition)> = Vec::new();
    for units in assignment.levels() {
        let decomposition = decomposer.decompose(half_mg_to_mg(units), tolerance_mg)?;
        levels.push((units, decomposition));
    }
    let levels_exact = levels.iter().all(|(_, decomposition)| decomposition.exact);

    let mut weekly_schedule = Vec::with_capacity(DAYS_PER_WEEK);
    for day_index in 0..DAYS_PER_WEEK {
        let units = assignment.dose_units(day_index);
        let (_, decomposition) = levels.iter().find(|(level, _)| *level == units)?;

        weekly_schedule.push(DaySchedule {
            day_index,
            total_dose_mg: decomposition.dose_mg,
            pills: decomposition.pills.clone(),
            is_stop_day: decomposition.is_stop(),
            is_special_day: assignment.is_special(day_index),
        });
    }

    let weekly_dose_actual: f64 = weekly_schedule.iter().map(|d| d.total_dose_mg).sum();
    let deviation_mg = (weekly_dose_actual - weekly_target).abs();
    if deviation_mg > tolerance_mg + DOSE_EPSILON {
        return None;
    }

    Some(WeeklyRegimen {
        description: describe(assignment),
        weekly_dose_actual,
        weekly_schedule,
        deviation_mg,
        levels_exact,
    })
}

/// Assemble every assignment, keeping only exact regimens when any exist
pub fn assemble_all(
    assignments: impl IntoIterator<Item = TierAssignment>,
    decomposer: &Decomposer,
    weekly_target: f64,
    tolerance_mg: f64,
) -> Vec<WeeklyRegimen> {
    let mut regimens: Vec<WeeklyRegimen> = assignments
        .into_iter()
        .filter_map(|assignment| assemble(&assignment, decomposer, weekly_target, tolerance_mg))
        .collect();

    if regimens.iter().any(WeeklyRegimen::is_exact) {
        let before = regimens.len();
        regimens.retain(WeeklyRegimen::is_exact);
        tracing::debug!(
            "Dropped {} approximate regimens in favour of exact ones",
            before - regimens.len()
        );
    }

    regimens
}

/// Clinician-facing summary such as "5 mg daily except 7.5 mg Fri–Sun"
pub fn describe(assignment: &TierAssignment) -> String {
    let base = assignment.base_mg();

    if assignment.is_uniform() {
        return if base > 0.0 {
            format!("{} mg daily", format_mg(base))
        } else {
            "No dose all week (0 mg daily)".to_string()
        };
    }

    let days = format_day_group(assignment.special_days());
    let special = assignment.special_mg();
    if special > 0.0 {
        format!(
            "{} mg daily except {} mg {}",
            format_mg(base),
            format_mg(special),
            days
        )
    } else {
        format!("{} mg daily except no dose {}", format_mg(base), days)
    }
}

/// Name a set of weekdays; runs of three or more collapse to "Fri–Sun"
pub fn format_day_group(days: &[usize]) -> String {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    for &day in days {
        match runs.last_mut() {
            Some(run) if run.last().map(|&last| last + 1) == Some(day) => run.push(day),
            _ => runs.push(vec![day]),
        }
    }

    runs.iter()
        .map(|run| {
            if run.len() >= 3 {
                format!("{}–{}", DAY_NAMES[run[0]], DAY_NAMES[run[run.len() - 1]])
            } else {
                run.iter()
                    .map(|&d| DAY_NAMES[d])
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TabletSet;

    fn decomposer(strengths: &[u32], allow_half: bool) -> Decomposer {
        Decomposer::new(&TabletSet::new(strengths).unwrap(), allow_half, 4)
    }

    #[test]
    fn test_uniform_schedule() {
        let d = decomposer(&[1, 2, 3, 5], true);
        let regimen = assemble(&TierAssignment::uniform(10), &d, 35.0, 0.5).unwrap();

        assert_eq!(regimen.description, "5 mg daily");
        assert_eq!(regimen.weekly_dose_actual, 35.0);
        assert!(regimen.is_exact());
        assert_eq!(regimen.weekly_schedule.len(), 7);
        for (i, day) in regimen.weekly_schedule.iter().enumerate() {
            assert_eq!(day.day_index, i);
            assert_eq!(day.pills.len(), 1);
            assert_eq!(day.pills[0].strength_mg, 5);
            assert!(!day.is_special_day);
            assert!(!day.is_stop_day);
        }
    }

    #[test]
    fn test_split_schedule_marks_special_days() {
        let d = decomposer(&[2, 3], false);
        let assignment = TierAssignment::split(6, 12, &[4, 5, 6]);
        let regimen = assemble(&assignment, &d, 30.0, 0.5).unwrap();

        assert_eq!(regimen.description, "3 mg daily except 6 mg Fri–Sun");
        for day in &regimen.weekly_schedule {
            let expected = if day.day_index >= 4 { 6.0 } else { 3.0 };
            assert_eq!(day.total_dose_mg, expected);
            assert_eq!(day.is_special_day, day.day_index >= 4);
            assert!((day.pill_dose_mg() - day.total_dose_mg).abs() < DOSE_EPSILON);
        }
    }

    #[test]
    fn test_stop_days() {
        let d = decomposer(&[1, 2, 3, 5], false);
        let assignment = TierAssignment::split(8, 0, &[5, 6]);
        let regimen = assemble(&assignment, &d, 20.0, 0.5).unwrap();

        assert_eq!(regimen.description, "4 mg daily except no dose Sat, Sun");
        assert!(regimen.weekly_schedule[5].is_stop_day);
        assert!(regimen.weekly_schedule[6].pills.is_empty());
        assert!(!regimen.weekly_schedule[0].is_stop_day);
    }

    #[test]
    fn test_rejects_total_outside_tolerance() {
        let d = decomposer(&[2, 3], false);
        assert!(assemble(&TierAssignment::uniform(8), &d, 30.0, 0.5).is_none());
        assert!(assemble(&TierAssignment::uniform(8), &d, 30.0, 2.0).is_some());
    }

    #[test]
    fn test_exact_regimens_displace_approximate_ones() {
        let d = decomposer(&[1, 2, 3, 5], true);
        let assignments = vec![
            TierAssignment::uniform(9),               // 31.5 mg
            TierAssignment::split(8, 10, &[4, 5, 6]), // 31 mg
        ];
        let regimens = assemble_all(assignments, &d, 31.0, 0.5);
        assert_eq!(regimens.len(), 1);
        assert!(regimens[0].is_exact());
    }

    #[test]
    fn test_approximate_regimen_kept_when_nothing_exact() {
        let d = decomposer(&[1, 2, 3, 5], true);
        let regimens = assemble_all(vec![TierAssignment::uniform(9)], &d, 31.0, 0.5);
        assert_eq!(regimens.len(), 1);
        assert!(!regimens[0].is_exact());
        assert_eq!(regimens[0].deviation_mg, 0.5);
    }

    #[test]
    fn test_zero_week_description() {
        let d = decomposer(&[5], true);
        let regimen = assemble(&TierAssignment::uniform(0), &d, 0.0, 0.5).unwrap();
        assert_eq!(regimen.description, "No dose all week (0 mg daily)");
        assert!(regimen.weekly_schedule.iter().all(|d| d.is_stop_day));
    }

    #[test]
    fn test_positive_target_never_becomes_stop_week() {
        let d = decomposer(&[5], true);
        // 0 mg is within 0.5 mg of the target but withholds the drug
        assert!(assemble(&TierAssignment::uniform(0), &d, 0.5, 0.5).is_none());
        assert!(assemble_all(vec![TierAssignment::uniform(0)], &d, 0.5, 0.5).is_empty());
    }

    #[test]
    fn test_levels_decomposed_exactly() {
        let d = decomposer(&[2, 3], true);
        let regimen = assemble(&TierAssignment::split(3, 2, &[6]), &d, 10.0, 0.5).unwrap();
        assert!(regimen.levels_exact);
        assert!(regimen.is_exact());
    }

    #[test]
    fn test_day_group_names() {
        assert_eq!(format_day_group(&[4, 5, 6]), "Fri–Sun");
        assert_eq!(format_day_group(&[5, 6]), "Sat, Sun");
        assert_eq!(format_day_group(&[0, 2, 4]), "Mon, Wed, Fri");
    }
}
