use crate::types::{ActivityKind, VariantMetric};
use thiserror::Error;

/// Message shown to the user when a submission is rejected.
pub const INVALID_INPUT_ALERT: &str = "Inputs have to be positive numbers!";

/// Raw values as typed into the workout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub kind: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl FormFields {
    pub fn running(distance: &str, duration: &str, cadence: &str) -> Self {
        Self {
            kind: ActivityKind::Running.tag().to_string(),
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: cadence.to_string(),
            elevation: String::new(),
        }
    }

    pub fn cycling(distance: &str, duration: &str, elevation: &str) -> Self {
        Self {
            kind: ActivityKind::Cycling.tag().to_string(),
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: String::new(),
            elevation: elevation.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("unknown workout type {0:?}")]
    UnknownKind(String),
    #[error("{field} is not a finite number: {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// Validated numbers ready to become a workout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutInput {
    pub distance: f64,
    pub duration: f64,
    pub metric: VariantMetric,
}

/// Every field must be a finite number. Distance and duration must be positive,
/// and so must cadence; elevation gain may be zero or negative.
pub fn validate(fields: &FormFields) -> Result<WorkoutInput, InputError> {
    let kind: ActivityKind = fields.kind.parse().map_err(InputError::UnknownKind)?;

    let distance = finite("distance", &fields.distance)?;
    let duration = finite("duration", &fields.duration)?;
    let metric = match kind {
        ActivityKind::Running => VariantMetric::Cadence(finite("cadence", &fields.cadence)?),
        ActivityKind::Cycling => {
            VariantMetric::ElevationGain(finite("elevation", &fields.elevation)?)
        }
    };

    positive("distance", distance)?;
    positive("duration", duration)?;
    if let VariantMetric::Cadence(cadence) = metric {
        positive("cadence", cadence)?;
    }

    Ok(WorkoutInput {
        distance,
        duration,
        metric,
    })
}

/// Blank input reads as 0, which the positivity checks then reject where they apply.
fn finite(field: &'static str, raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

fn positive(field: &'static str, value: f64) -> Result<(), InputError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(InputError::NotPositive { field, value })
    }
}
