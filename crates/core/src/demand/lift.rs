//! Demand lift index.
//!
//! `raw = 0.7 * seat_capacity_delta + 0.3 * fare_pressure + event_weight`,
//! clamped to `[0, 1]`. When no fare pressure signal is supplied it is
//! estimated from the capacity delta; a measured value is always preferred.

use serde::{Deserialize, Serialize};

use crate::domain::lift::{DemandLiftResult, LiftComponents};
use crate::domain::signal::validate_unit_weight;
use crate::errors::DomainError;

/// Coefficients and confidence levels of the lift formula.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiftModel {
    pub seat_weight: f64,
    pub fare_weight: f64,
    /// Multiplier applied to the seat delta when fare pressure is estimated.
    pub fare_estimate_factor: f64,
    /// Deltas with an absolute value below this are weak signals.
    pub weak_signal_delta: f64,
    pub weak_confidence: f64,
    pub strong_confidence: f64,
}

impl Default for LiftModel {
    fn default() -> Self {
        Self {
            seat_weight: 0.7,
            fare_weight: 0.3,
            fare_estimate_factor: 0.8,
            weak_signal_delta: 0.05,
            weak_confidence: 0.60,
            strong_confidence: 0.85,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiftInput {
    pub current_seats: f64,
    pub baseline_seats: f64,
    pub fare_pressure: Option<f64>,
    pub event_weight: f64,
}

impl LiftInput {
    pub fn new(current_seats: f64, baseline_seats: f64) -> Self {
        Self { current_seats, baseline_seats, fare_pressure: None, event_weight: 0.0 }
    }

    pub fn with_fare_pressure(mut self, fare_pressure: Option<f64>) -> Self {
        self.fare_pressure = fare_pressure;
        self
    }

    pub fn with_event_weight(mut self, event_weight: f64) -> Self {
        self.event_weight = event_weight;
        self
    }
}

pub trait LiftCalculator: Send + Sync {
    fn compute(&self, input: &LiftInput) -> Result<DemandLiftResult, DomainError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DemandLiftIndexCalculator {
    model: LiftModel,
}

impl LiftCalculator for DemandLiftIndexCalculator {
    fn compute(&self, input: &LiftInput) -> Result<DemandLiftResult, DomainError> {
        compute_with_model(&self.model, input)
    }
}

/// Computes the lift index with the standard model.
pub fn compute(
    current_seats: f64,
    baseline_seats: f64,
    fare_pressure: Option<f64>,
    event_weight: f64,
) -> Result<DemandLiftResult, DomainError> {
    compute_with_model(
        &LiftModel::default(),
        &LiftInput { current_seats, baseline_seats, fare_pressure, event_weight },
    )
}

pub fn compute_with_model(
    model: &LiftModel,
    input: &LiftInput,
) -> Result<DemandLiftResult, DomainError> {
    validate_input(input)?;

    let seat_capacity_delta = (input.current_seats - input.baseline_seats) / input.baseline_seats;

    let (fare_pressure, fare_pressure_estimated) = match input.fare_pressure {
        Some(measured) => (measured, false),
        None => ((seat_capacity_delta * model.fare_estimate_factor).clamp(0.0, 1.0), true),
    };

    let components = LiftComponents {
        seat_contribution: model.seat_weight * seat_capacity_delta,
        fare_contribution: model.fare_weight * fare_pressure,
        event_contribution: input.event_weight,
    };
    let index = components.raw_index().clamp(0.0, 1.0);

    let confidence = if seat_capacity_delta.abs() < model.weak_signal_delta {
        model.weak_confidence
    } else {
        model.strong_confidence
    }
    .clamp(0.0, 1.0);

    Ok(DemandLiftResult {
        index,
        seat_capacity_delta,
        fare_pressure,
        fare_pressure_estimated,
        event_weight: input.event_weight,
        confidence,
        components,
    })
}

fn validate_input(input: &LiftInput) -> Result<(), DomainError> {
    if !input.current_seats.is_finite() || input.current_seats < 0.0 {
        return Err(DomainError::invalid_signal(format!(
            "current_seats must be a finite non-negative value, got {}",
            input.current_seats
        )));
    }
    if !input.baseline_seats.is_finite() || input.baseline_seats < 0.0 {
        return Err(DomainError::invalid_signal(format!(
            "baseline_seats must be a finite non-negative value, got {}",
            input.baseline_seats
        )));
    }
    if input.baseline_seats == 0.0 {
        return Err(DomainError::ZeroBaseline);
    }
    if let Some(fare_pressure) = input.fare_pressure {
        validate_unit_weight("fare_pressure", fare_pressure)?;
    }
    validate_unit_weight("event_weight", input.event_weight)
}
