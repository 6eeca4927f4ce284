//! Dispensing summary: tablets needed until the next appointment.
//!
//! The weekly schedule is projected over the horizon starting on
//! `start_day_of_week`. Pharmacies hand out whole tablets, so half tablets
//! of the same strength are paired up and a leftover half costs a whole
//! tablet.

use crate::types::{format_mg, DAYS_PER_WEEK};
use crate::{DaySchedule, PillLineSummary, TotalPillsSummary};
use std::collections::BTreeMap;

/// Half-tablet pieces of one strength consumed over the horizon
#[derive(Clone, Copy, Debug, Default)]
struct Usage {
    whole: u64,
    halves: u64,
}

impl Usage {
    fn add(&mut self, other: Usage, times: u64) {
        self.whole += other.whole * times;
        self.halves += other.halves * times;
    }

    /// Consumption measured in half tablets
    fn half_units(&self) -> u64 {
        self.whole * 2 + self.halves
    }

    fn dispensed(&self) -> u64 {
        self.half_units().div_ceil(2)
    }
}

/// Tablets per strength for a single day of the schedule
fn day_usage(day: &DaySchedule) -> BTreeMap<u32, Usage> {
    let mut usage: BTreeMap<u32, Usage> = BTreeMap::new();
    for pill in &day.pills {
        let entry = usage.entry(pill.strength_mg).or_default();
        entry.whole += u64::from(pill.whole_tablets());
        entry.halves += u64::from(pill.is_half);
    }
    usage
}

/// Summarize the tablets to dispense for `days_until_appointment` days
pub fn summarize(
    weekly_schedule: &[DaySchedule],
    days_until_appointment: u32,
    start_day_of_week: u8,
) -> TotalPillsSummary {
    let full_weeks = u64::from(days_until_appointment) / DAYS_PER_WEEK as u64;
    let extra_days = days_until_appointment as usize % DAYS_PER_WEEK;
    let start = start_day_of_week as usize % DAYS_PER_WEEK;

    let mut totals: BTreeMap<u32, Usage> = BTreeMap::new();
    for day in weekly_schedule {
        // Offset of this weekday from the first dispensed day
        let offset = (day.day_index + DAYS_PER_WEEK - start) % DAYS_PER_WEEK;
        let times = full_weeks + u64::from(offset < extra_days);
        if times == 0 {
            continue;
        }
        for (strength_mg, usage) in day_usage(day) {
            totals.entry(strength_mg).or_default().add(usage, times);
        }
    }

    let pill_lines: Vec<PillLineSummary> = totals
        .into_iter()
        .rev()
        .filter(|(_, usage)| usage.dispensed() > 0)
        .map(|(strength_mg, usage)| PillLineSummary {
            strength_mg,
            dispensed_count: u32::try_from(usage.dispensed()).unwrap_or(u32::MAX),
            usage_note: usage_note(&usage),
        })
        .collect();

    let header = if pill_lines.is_empty() {
        format!(
            "Total tablets until appointment ({} days): no tablets to dispense",
            days_until_appointment
        )
    } else {
        format!(
            "Total tablets until appointment ({} days):",
            days_until_appointment
        )
    };

    TotalPillsSummary { header, pill_lines }
}

fn usage_note(usage: &Usage) -> String {
    if usage.halves == 0 {
        return String::new();
    }
    if usage.half_units() % 2 == 1 {
        format!(
            "split tablets for half doses; actual use {} tablets",
            format_mg(usage.half_units() as f64 / 2.0)
        )
    } else {
        "split tablets for half doses".to_string()
    }
}
