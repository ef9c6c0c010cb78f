use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::signal::AirportSignal;
use crate::errors::DomainError;

/// Tolerance for weights summing to one.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCapacity {
    pub weighted_current: f64,
    pub weighted_baseline: f64,
}

pub trait SignalAggregator: Send + Sync {
    fn aggregate(&self, signals: &[AirportSignal]) -> Result<AggregatedCapacity, DomainError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FlightSignalAggregator;

impl SignalAggregator for FlightSignalAggregator {
    fn aggregate(&self, signals: &[AirportSignal]) -> Result<AggregatedCapacity, DomainError> {
        aggregate(signals)
    }
}

pub fn aggregate(signals: &[AirportSignal]) -> Result<AggregatedCapacity, DomainError> {
    if signals.is_empty() {
        return Err(DomainError::invalid_signal("signal set must not be empty"));
    }

    let mut seen = BTreeSet::new();
    for signal in signals {
        signal.validate()?;
        if !seen.insert(signal.airport_code.as_str()) {
            return Err(DomainError::invalid_signal(format!(
                "airport {} appears more than once",
                signal.airport_code
            )));
        }
    }

    validate_weight_sum(signals.iter().map(|signal| signal.weight))?;

    let mut weighted_current = 0.0;
    let mut weighted_baseline = 0.0;
    for signal in signals {
        weighted_current += f64::from(signal.current_seats) * signal.weight;
        weighted_baseline += f64::from(signal.baseline_seats) * signal.weight;
    }

    Ok(AggregatedCapacity { weighted_current, weighted_baseline })
}

pub(crate) fn validate_weight_sum(weights: impl Iterator<Item = f64>) -> Result<(), DomainError> {
    let total: f64 = weights.sum();
    if (total - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(DomainError::invalid_signal(format!(
            "airport weights must sum to 1.0 (+/- {WEIGHT_SUM_EPSILON}), got {total}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::{aggregate, FlightSignalAggregator, SignalAggregator};
    use crate::domain::signal::{AirportCode, AirportSignal};
    use crate::errors::DomainError;

    fn signal(code: &str, current: u32, baseline: u32, weight: f64) -> AirportSignal {
        AirportSignal::new(code, current, baseline, weight).expect("fixture signal is valid")
    }

    #[test]
    fn three_airport_weighted_blend() {
        let result = aggregate(&[
            signal("DCA", 8_500, 7_500, 0.6),
            signal("IAD", 13_000, 12_000, 0.3),
            signal("BWI", 6_000, 6_000, 0.1),
        ])
        .expect("valid signals aggregate");

        assert_abs_diff_eq!(result.weighted_current, 9_600.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.weighted_baseline, 8_700.0, epsilon = 1e-6);

        let delta = (result.weighted_current - result.weighted_baseline) / result.weighted_baseline;
        assert_abs_diff_eq!(delta, 0.1034, epsilon = 1e-4);
    }

    #[test]
    fn empty_signal_set_is_rejected() {
        assert!(matches!(
            aggregate(&[]),
            Err(DomainError::InvalidSignal(ref message)) if message.contains("empty")
        ));
    }

    #[test]
    fn weights_not_summing_to_one_are_rejected() {
        let error =
            aggregate(&[signal("DCA", 8_500, 7_500, 0.6), signal("IAD", 13_000, 12_000, 0.3)])
                .expect_err("0.9 total weight must fail");
        assert!(matches!(
            error,
            DomainError::InvalidSignal(ref message) if message.contains("sum to 1.0")
        ));
    }

    #[test]
    fn deserialized_zero_baseline_is_rejected() {
        let bad = AirportSignal {
            airport_code: AirportCode("DCA".to_string()),
            current_seats: 100,
            baseline_seats: 0,
            weight: 1.0,
        };
        assert!(matches!(aggregate(&[bad]), Err(DomainError::InvalidSignal(_))));
    }

    #[test]
    fn duplicate_airports_are_rejected() {
        let error = FlightSignalAggregator
            .aggregate(&[signal("DCA", 100, 100, 0.5), signal("dca", 100, 100, 0.5)])
            .expect_err("duplicate airport must fail");
        assert!(matches!(
            error,
            DomainError::InvalidSignal(ref message) if message.contains("DCA")
        ));
    }

    proptest! {
        #[test]
        fn single_full_weight_signal_reduces_exactly(
            current in 0u32..1_000_000,
            baseline in 1u32..1_000_000,
        ) {
            let result = aggregate(&[signal("DCA", current, baseline, 1.0)]).expect("valid");
            prop_assert_eq!(result.weighted_current, f64::from(current));
            prop_assert_eq!(result.weighted_baseline, f64::from(baseline));
        }
    }
}
