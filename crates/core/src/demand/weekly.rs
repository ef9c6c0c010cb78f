use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::recommendation::PricingRecommendation;
use crate::errors::DomainError;

/// Window length, inclusive of the as-of date.
pub const ROLLING_WINDOW_DAYS: i64 = 7;

/// Headroom below this is treated as exhausted.
const HEADROOM_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedRateChange {
    pub date: NaiveDate,
    pub percent: f64,
}

/// Rate changes already applied by the PMS, used for 7-day net cap tracking.
/// The policy engine only enforces single-call caps; this is the caller side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RollingCapLedger {
    changes: Vec<AppliedRateChange>,
}

impl RollingCapLedger {
    pub fn new(changes: Vec<AppliedRateChange>) -> Result<Self, DomainError> {
        for change in &changes {
            if !change.percent.is_finite() {
                return Err(DomainError::invalid_signal(format!(
                    "applied rate change on {} is not finite",
                    change.date
                )));
            }
        }
        Ok(Self { changes })
    }

    pub fn net_change_in_window(&self, as_of: NaiveDate) -> f64 {
        let window_start = as_of - Duration::days(ROLLING_WINDOW_DAYS - 1);
        self.changes
            .iter()
            .filter(|change| window_start <= change.date && change.date <= as_of)
            .map(|change| change.percent)
            .sum()
    }

    pub fn headroom(&self, as_of: NaiveDate, weekly_cap: f64) -> f64 {
        (weekly_cap - self.net_change_in_window(as_of)).max(0.0)
    }

    /// Narrows an increase to the remaining weekly headroom, or freezes it when
    /// none is left. The action keeps naming the demand tier even when the
    /// narrowed range falls below that tier's band.
    pub fn clamp(
        &self,
        recommendation: PricingRecommendation,
        as_of: NaiveDate,
        weekly_cap: f64,
    ) -> PricingRecommendation {
        if !recommendation.action.is_increase() {
            return recommendation;
        }

        let headroom = self.headroom(as_of, weekly_cap);
        if headroom <= HEADROOM_EPSILON {
            return recommendation
                .freeze(format!("weekly cap of {weekly_cap} already used in the last 7 days"));
        }

        let clamped = recommendation.percent_range.clamped_to(headroom);
        if clamped == recommendation.percent_range {
            return recommendation;
        }

        let tier_range = recommendation.percent_range;
        let mut recommendation = recommendation;
        recommendation.percent_range = clamped;
        recommendation
            .reasons
            .push(format!("range clamped to remaining weekly headroom of {headroom:.3}"));
        if clamped.high < tier_range.low {
            recommendation.reasons.push(format!(
                "{} reflects the demand tier; the applied range is below its {:.2}-{:.2} band",
                recommendation.action, tier_range.low, tier_range.high
            ));
        }
        recommendation
    }
}
