//! Tablet inventory: the strengths a pharmacy stocks and which are in use.
//!
//! The built-in catalog is immutable process-wide data. A calculation works
//! on a [`TabletSet`], the validated, ordered set of strengths resolved once
//! per call.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Strengths stocked by default, in mg
pub const DEFAULT_STRENGTHS: [u32; 4] = [1, 2, 3, 5];

/// Strengths selected for use by default, in mg
pub const DEFAULT_SELECTED: [u32; 3] = [2, 3, 5];

/// Largest tablet strength accepted, in mg
pub const MAX_TABLET_STRENGTH_MG: u32 = 1000;

/// Whether a strength can be a real tablet
pub fn is_valid_strength(strength_mg: u32) -> bool {
    (1..=MAX_TABLET_STRENGTH_MG).contains(&strength_mg)
}

/// Cached default inventory
static DEFAULT_INVENTORY: Lazy<TabletInventory> =
    Lazy::new(|| TabletInventory::new(&DEFAULT_STRENGTHS, &DEFAULT_SELECTED));

/// Get a reference to the built-in tablet inventory
pub fn get_default_inventory() -> &'static TabletInventory {
    &DEFAULT_INVENTORY
}

/// A stocked tablet strength
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabletSpec {
    pub strength_mg: u32,
    pub available: bool,
}

/// Catalog of stocked strengths with their default selection
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabletInventory {
    pub tablets: Vec<TabletSpec>,
}

impl TabletInventory {
    /// Build an inventory from stocked and selected strengths
    ///
    /// Strengths are sorted ascending and deduplicated.
    pub fn new(strengths: &[u32], selected: &[u32]) -> Self {
        let mut sorted = strengths.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let tablets = sorted
            .into_iter()
            .map(|strength_mg| TabletSpec {
                strength_mg,
                available: selected.contains(&strength_mg),
            })
            .collect();

        Self { tablets }
    }

    /// Strengths currently marked available, ascending
    pub fn selected_strengths(&self) -> Vec<u32> {
        self.tablets
            .iter()
            .filter(|t| t.available)
            .map(|t| t.strength_mg)
            .collect()
    }

    pub fn contains(&self, strength_mg: u32) -> bool {
        self.tablets.iter().any(|t| t.strength_mg == strength_mg)
    }

    /// Validate inventory invariants
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.tablets.is_empty() {
            errors.push("Inventory has no tablet strengths".to_string());
        }

        for tablet in &self.tablets {
            if !is_valid_strength(tablet.strength_mg) {
                errors.push(format!(
                    "Inventory strength {} mg is outside 1-{} mg",
                    tablet.strength_mg, MAX_TABLET_STRENGTH_MG
                ));
            }
        }

        for pair in self.tablets.windows(2) {
            if pair[0].strength_mg >= pair[1].strength_mg {
                errors.push(format!(
                    "Inventory strengths must be unique and ascending ({} mg before {} mg)",
                    pair[0].strength_mg, pair[1].strength_mg
                ));
            }
        }

        errors
    }
}

/// Validated, ascending, duplicate-free set of usable strengths
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabletSet {
    strengths: Vec<u32>,
}

impl TabletSet {
    /// Resolve a set of strengths for one calculation
    ///
    /// A zero or implausibly large strength is a caller bug and is
    /// rejected outright.
    pub fn new(strengths: &[u32]) -> Result<Self> {
        if let Some(&bad) = strengths.iter().find(|&&mg| !is_valid_strength(mg)) {
            return Err(Error::InvalidTablet(bad));
        }
        let mut strengths = strengths.to_vec();
        strengths.sort_unstable();
        strengths.dedup();

        if strengths.is_empty() {
            return Err(Error::InvalidInput("no tablet strengths available".into()));
        }

        Ok(Self { strengths })
    }

    pub fn strengths(&self) -> &[u32] {
        &self.strengths
    }
}
