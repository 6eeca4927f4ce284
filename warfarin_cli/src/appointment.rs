//! Appointment date arithmetic for the dispensing horizon.

use chrono::{Datelike, NaiveDate};
use warfarin_core::{Error, Result};

/// Dispensing horizon derived from the visit and appointment dates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppointmentInfo {
    pub days_until_appointment: u32,
    /// Monday = 0
    pub start_day_of_week: u8,
}

impl AppointmentInfo {
    /// Horizon from `start` (first dispensed day) up to the `appointment` day
    pub fn from_dates(start: NaiveDate, appointment: NaiveDate) -> Result<Self> {
        if appointment <= start {
            return Err(Error::InvalidInput(format!(
                "appointment date {} must be after start date {}",
                appointment, start
            )));
        }

        let days = (appointment - start).num_days().max(1);
        let days_until_appointment = u32::try_from(days)
            .map_err(|_| Error::InvalidInput(format!("appointment is {} days away", days)))?;

        Ok(Self {
            days_until_appointment,
            start_day_of_week: start.weekday().num_days_from_monday() as u8,
        })
    }
}
