//! Regimen generator: the single stateless entry point.
//!
//! Data flows one way:
//! tablet set + target → tier enumeration → per-tier decomposition →
//! weekly assembly → dispensing summary → ranking.
//!
//! All state lives on the stack of one call, so concurrent calls never
//! interfere.

use crate::catalog::TabletSet;
use crate::config::SearchLimits;
use crate::decompose::Decomposer;
use crate::{dispense, pattern, ranker, regimen};
use crate::{CalculationInput, RegimenOption};

/// Generate ranked weekly regimens with the default search limits
///
/// Never fails: invalid input and infeasible constraints both produce an
/// empty list.
pub fn generate_suggestions(input: &CalculationInput) -> Vec<RegimenOption> {
    generate_suggestions_with(input, &SearchLimits::default())
}

/// Generate ranked weekly regimens with explicit search limits
pub fn generate_suggestions_with(
    input: &CalculationInput,
    limits: &SearchLimits,
) -> Vec<RegimenOption> {
    if let Err(e) = input.validate() {
        tracing::warn!("Rejected calculation input: {}", e);
        return Vec::new();
    }

    let tablets = match TabletSet::new(&input.available_pills) {
        Ok(tablets) => tablets,
        Err(e) => {
            tracing::warn!("Rejected tablet selection: {}", e);
            return Vec::new();
        }
    };

    let decomposer = Decomposer::new(&tablets, input.allow_half, limits.max_tablets_per_day);

    let assignments = pattern::enumerate(
        input.weekly_dose,
        input.special_day_pattern,
        &decomposer,
        limits,
    );
    let regimens = regimen::assemble_all(
        assignments,
        &decomposer,
        input.weekly_dose,
        limits.weekly_tolerance_mg,
    );
    tracing::debug!(
        "Assembled {} regimens for {} mg/week ({} pattern, {} mg steps)",
        regimens.len(),
        input.weekly_dose,
        input.special_day_pattern,
        decomposer.unit_mg()
    );

    let candidates = regimens
        .into_iter()
        .map(|regimen| {
            let summary = dispense::summarize(
                &regimen.weekly_schedule,
                input.days_until_appointment,
                input.start_day_of_week,
            );
            regimen.into_option(summary)
        })
        .collect();

    let suggestions = ranker::rank(candidates, input.weekly_dose, limits.max_suggestions);
    tracing::info!(
        "Generated {} suggestions for {} mg/week",
        suggestions.len(),
        input.weekly_dose
    );
    suggestions
}
