use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The three additive terms of the raw index, kept for audit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiftComponents {
    pub seat_contribution: f64,
    pub fare_contribution: f64,
    pub event_contribution: f64,
}

impl LiftComponents {
    pub fn raw_index(&self) -> f64 {
        self.seat_contribution + self.fare_contribution + self.event_contribution
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandLiftResult {
    pub index: f64,
    pub seat_capacity_delta: f64,
    pub fare_pressure: f64,
    pub fare_pressure_estimated: bool,
    pub event_weight: f64,
    pub confidence: f64,
    pub components: LiftComponents,
}

impl DemandLiftResult {
    pub fn display(&self) -> DemandLiftDisplay {
        DemandLiftDisplay {
            index: round_for_display(self.index),
            seat_capacity_delta: round_for_display(self.seat_capacity_delta),
            fare_pressure: round_for_display(self.fare_pressure),
            event_weight: round_for_display(self.event_weight),
            confidence: round_for_display(self.confidence),
            seat_contribution: round_for_display(self.components.seat_contribution),
            fare_contribution: round_for_display(self.components.fare_contribution),
            event_contribution: round_for_display(self.components.event_contribution),
        }
    }
}

/// Presentation view of a [`DemandLiftResult`], rounded to three decimals.
/// Comparisons and policy decisions always use the full-precision result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandLiftDisplay {
    pub index: Decimal,
    pub seat_capacity_delta: Decimal,
    pub fare_pressure: Decimal,
    pub event_weight: Decimal,
    pub confidence: Decimal,
    pub seat_contribution: Decimal,
    pub fare_contribution: Decimal,
    pub event_contribution: Decimal,
}

pub const DISPLAY_DECIMALS: u32 = 3;

pub fn round_for_display(value: f64) -> Decimal {
    Decimal::from_f64(value).map(|value| value.round_dp(DISPLAY_DECIMALS)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{round_for_display, DemandLiftResult, LiftComponents};

    #[test]
    fn display_rounds_to_three_decimals_without_touching_source() {
        let result = DemandLiftResult {
            index: 0.125_333_333,
            seat_capacity_delta: 0.133_333_333,
            fare_pressure: 0.106_666_666,
            fare_pressure_estimated: true,
            event_weight: 0.0,
            confidence: 0.85,
            components: LiftComponents {
                seat_contribution: 0.093_333_333,
                fare_contribution: 0.032,
                event_contribution: 0.0,
            },
        };

        let display = result.display();
        assert_eq!(display.index, Decimal::new(125, 3));
        assert_eq!(display.seat_capacity_delta, Decimal::new(133, 3));
        assert_eq!(display.fare_pressure, Decimal::new(107, 3));
        assert_eq!(display.confidence, Decimal::new(85, 2));
        assert_eq!(result.index, 0.125_333_333);
    }

    #[test]
    fn non_finite_values_display_as_zero() {
        assert_eq!(round_for_display(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn components_sum_to_raw_index() {
        let components = LiftComponents {
            seat_contribution: 0.1,
            fare_contribution: 0.03,
            event_contribution: 0.2,
        };
        assert!((components.raw_index() - 0.33).abs() < 1e-12);
    }
}
