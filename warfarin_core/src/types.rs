//! Core domain types for the warfarin regimen calculator.
//!
//! This module defines the value objects exchanged with the host:
//! - The calculation input (target dose, tablets, scheduling constraints)
//! - Tablet usage and per-day schedules
//! - Regimen options and their dispensing summaries
//!
//! Field names serialize in snake_case, matching the host interchange format.

use crate::catalog::is_valid_strength;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Number of days in a dosing week
pub const DAYS_PER_WEEK: usize = 7;

/// Short weekday names, Monday = 0
pub const DAY_NAMES: [&str; DAYS_PER_WEEK] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Tolerance used when comparing realized doses
pub const DOSE_EPSILON: f64 = 1e-6;

/// Internal dose unit. Every reachable daily dose is a whole number of
/// half-milligrams because strengths are whole mg and tablets split in two.
pub(crate) type HalfMg = u32;

pub(crate) fn half_mg_to_mg(units: HalfMg) -> f64 {
    units as f64 / 2.0
}

/// Format a dose for clinician-facing text ("5", "7.5")
pub fn format_mg(mg: f64) -> String {
    if mg.fract().abs() < DOSE_EPSILON {
        format!("{:.0}", mg)
    } else {
        format!("{:.1}", mg)
    }
}

// ============================================================================
// Input
// ============================================================================

const NO_GROUPS: &[&[usize]] = &[];
const FRI_SUN_GROUPS: &[&[usize]] = &[&[6], &[5, 6], &[4, 5, 6]];
const SAT_SUN_GROUPS: &[&[usize]] = &[&[6], &[5, 6]];
const MON_WED_FRI_GROUPS: &[&[usize]] = &[&[2], &[0, 4], &[0, 2, 4]];

/// Which weekdays form the "special" group that may get a different dose
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialDayPattern {
    /// Every day gets the same dose
    #[default]
    None,
    /// Friday, Saturday and Sunday
    FriSun,
    /// Saturday and Sunday
    SatSun,
    /// Monday, Wednesday and Friday
    MonWedFri,
}

impl SpecialDayPattern {
    pub const ALL: [SpecialDayPattern; 4] = [
        SpecialDayPattern::None,
        SpecialDayPattern::FriSun,
        SpecialDayPattern::SatSun,
        SpecialDayPattern::MonWedFri,
    ];

    /// Day indices (Monday = 0) of the special group, ascending
    pub fn special_days(&self) -> &'static [usize] {
        match self {
            SpecialDayPattern::None => &[],
            SpecialDayPattern::FriSun => &[4, 5, 6],
            SpecialDayPattern::SatSun => &[5, 6],
            SpecialDayPattern::MonWedFri => &[0, 2, 4],
        }
    }

    pub fn is_special(&self, day_index: usize) -> bool {
        self.special_days().contains(&day_index)
    }

    /// Subsets of the special group that may take the special dose,
    /// smallest first and ending with the whole group
    ///
    /// Fri–Sun grows back from Sunday, so a single special day is Sunday
    /// and two are Saturday and Sunday.
    pub fn day_groups(&self) -> &'static [&'static [usize]] {
        match self {
            SpecialDayPattern::None => NO_GROUPS,
            SpecialDayPattern::FriSun => FRI_SUN_GROUPS,
            SpecialDayPattern::SatSun => SAT_SUN_GROUPS,
            SpecialDayPattern::MonWedFri => MON_WED_FRI_GROUPS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialDayPattern::None => "none",
            SpecialDayPattern::FriSun => "fri-sun",
            SpecialDayPattern::SatSun => "sat-sun",
            SpecialDayPattern::MonWedFri => "mon-wed-fri",
        }
    }
}

impl fmt::Display for SpecialDayPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecialDayPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "uniform" => Ok(SpecialDayPattern::None),
            "fri-sun" => Ok(SpecialDayPattern::FriSun),
            "sat-sun" | "weekends" | "weekend" => Ok(SpecialDayPattern::SatSun),
            "mon-wed-fri" => Ok(SpecialDayPattern::MonWedFri),
            _ => Err(Error::UnknownPattern(s.to_string())),
        }
    }
}

/// Everything a single calculation depends on
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalculationInput {
    /// Prescribed total weekly dose in mg
    pub weekly_dose: f64,
    /// Whether half tablets may be used
    pub allow_half: bool,
    /// Usable tablet strengths in mg
    pub available_pills: Vec<u32>,
    #[serde(default)]
    pub special_day_pattern: SpecialDayPattern,
    /// Dispensing horizon in days
    pub days_until_appointment: u32,
    /// Weekday of the first dispensed day, Monday = 0
    pub start_day_of_week: u8,
}

impl CalculationInput {
    /// Parse an input value from its JSON interchange form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the input the way a host should before invoking the generator
    pub fn validate(&self) -> Result<()> {
        if !self.weekly_dose.is_finite() || self.weekly_dose < 0.0 {
            return Err(Error::InvalidInput(format!(
                "weekly dose must be a non-negative number, got {}",
                self.weekly_dose
            )));
        }
        if self.available_pills.is_empty() {
            return Err(Error::InvalidInput(
                "at least one tablet strength must be selected".into(),
            ));
        }
        let invalid = self
            .available_pills
            .iter()
            .find(|&&mg| !is_valid_strength(mg));
        if let Some(&bad) = invalid {
            return Err(Error::InvalidTablet(bad));
        }
        if self.start_day_of_week as usize >= DAYS_PER_WEEK {
            return Err(Error::InvalidInput(format!(
                "start day of week must be 0-6, got {}",
                self.start_day_of_week
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Tablets of one strength taken on a single day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PillUsage {
    pub strength_mg: u32,
    /// Tablets taken, whole or half-integer
    pub count: f64,
    /// True when the count includes half a tablet
    pub is_half: bool,
}

impl PillUsage {
    pub fn new(strength_mg: u32, whole: u32, half: bool) -> Self {
        Self {
            strength_mg,
            count: whole as f64 + if half { 0.5 } else { 0.0 },
            is_half: half,
        }
    }

    pub fn whole_tablets(&self) -> u32 {
        self.count.floor() as u32
    }

    /// Number of tablet pieces the patient handles (a half counts as one)
    pub fn pieces(&self) -> u32 {
        self.whole_tablets() + u32::from(self.is_half)
    }

    pub fn dose_mg(&self) -> f64 {
        self.strength_mg as f64 * self.count
    }
}

/// One weekday of a regimen
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DaySchedule {
    pub day_index: usize,
    pub total_dose_mg: f64,
    pub pills: Vec<PillUsage>,
    pub is_stop_day: bool,
    pub is_special_day: bool,
}

impl DaySchedule {
    pub fn day_name(&self) -> &'static str {
        DAY_NAMES[self.day_index % DAYS_PER_WEEK]
    }

    /// Dose realized by the listed tablets
    pub fn pill_dose_mg(&self) -> f64 {
        self.pills.iter().map(PillUsage::dose_mg).sum()
    }
}

/// Dispensing need for one tablet strength
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PillLineSummary {
    pub strength_mg: u32,
    /// Whole tablets to hand out for the horizon
    pub dispensed_count: u32,
    pub usage_note: String,
}

/// Aggregated dispensing need until the next appointment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TotalPillsSummary {
    pub header: String,
    pub pill_lines: Vec<PillLineSummary>,
}

/// A complete weekly regimen proposed to the clinician
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegimenOption {
    pub description: String,
    pub weekly_dose_actual: f64,
    pub weekly_schedule: Vec<DaySchedule>,
    pub total_pills_summary: TotalPillsSummary,
}

impl RegimenOption {
    /// Distinct tablet strengths used anywhere in the week
    pub fn strengths_used(&self) -> BTreeSet<u32> {
        self.weekly_schedule
            .iter()
            .flat_map(|day| day.pills.iter().map(|p| p.strength_mg))
            .collect()
    }

    /// Half-tablet doses taken over the week
    pub fn half_tablet_count(&self) -> u32 {
        self.weekly_schedule
            .iter()
            .flat_map(|day| day.pills.iter())
            .filter(|p| p.is_half)
            .count() as u32
    }

    /// Tablet pieces taken over the week
    pub fn tablet_pieces(&self) -> u32 {
        self.weekly_schedule
            .iter()
            .flat_map(|day| day.pills.iter())
            .map(PillUsage::pieces)
            .sum()
    }

    /// Number of distinct daily dose levels (1 for uniform regimens)
    pub fn dose_tiers(&self) -> usize {
        let mut tiers: Vec<f64> = Vec::new();
        for day in &self.weekly_schedule {
            if !tiers
                .iter()
                .any(|t| (t - day.total_dose_mg).abs() < DOSE_EPSILON)
            {
                tiers.push(day.total_dose_mg);
            }
        }
        tiers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_parse() {
        assert_eq!(
            "fri-sun".parse::<SpecialDayPattern>().unwrap(),
            SpecialDayPattern::FriSun
        );
        assert_eq!(
            "Weekends".parse::<SpecialDayPattern>().unwrap(),
            SpecialDayPattern::SatSun
        );
        assert!("tue-thu".parse::<SpecialDayPattern>().is_err());
    }

    #[test]
    fn test_day_groups_stay_inside_pattern() {
        assert!(SpecialDayPattern::None.day_groups().is_empty());
        assert_eq!(SpecialDayPattern::FriSun.day_groups()[0], &[6]);
        for pattern in SpecialDayPattern::ALL {
            for group in pattern.day_groups() {
                assert!(!group.is_empty());
                assert!(group.iter().all(|&day| pattern.is_special(day)));
            }
            if let Some(last) = pattern.day_groups().last() {
                assert_eq!(*last, pattern.special_days());
            }
        }
    }

    #[test]
    fn test_pattern_serde_names() {
        for pattern in SpecialDayPattern::ALL {
            let json = serde_json::to_string(&pattern).unwrap();
            assert_eq!(json, format!("\"{}\"", pattern.as_str()));
        }
    }

    #[test]
    fn test_input_from_json() {
        let input = CalculationInput::from_json(
            r#"{
                "weekly_dose": 17.5,
                "allow_half": true,
                "available_pills": [1, 2, 3, 5],
                "special_day_pattern": "mon-wed-fri",
                "days_until_appointment": 14,
                "start_day_of_week": 3
            }"#,
        )
        .unwrap();

        assert_eq!(input.weekly_dose, 17.5);
        assert_eq!(input.special_day_pattern, SpecialDayPattern::MonWedFri);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut input = CalculationInput {
            weekly_dose: -1.0,
            allow_half: true,
            available_pills: vec![5],
            special_day_pattern: SpecialDayPattern::None,
            days_until_appointment: 7,
            start_day_of_week: 0,
        };
        assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));

        input.weekly_dose = 35.0;
        input.available_pills = vec![0, 5];
        assert!(matches!(input.validate(), Err(Error::InvalidTablet(0))));

        input.available_pills = vec![5, 3_000_000_000];
        assert!(matches!(
            input.validate(),
            Err(Error::InvalidTablet(3_000_000_000))
        ));

        input.available_pills.clear();
        assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_pill_usage_half() {
        let usage = PillUsage::new(5, 1, true);
        assert_eq!(usage.count, 1.5);
        assert!(usage.is_half);
        assert_eq!(usage.pieces(), 2);
        assert_eq!(usage.dose_mg(), 7.5);
    }

    #[test]
    fn test_format_mg() {
        assert_eq!(format_mg(5.0), "5");
        assert_eq!(format_mg(7.5), "7.5");
        assert_eq!(format_mg(0.0), "0");
    }
}
