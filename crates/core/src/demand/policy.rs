use serde::{Deserialize, Serialize};

use crate::domain::calendar::CalendarContext;
use crate::domain::recommendation::{PercentRange, PricingAction, PricingRecommendation};
use crate::errors::DomainError;

/// Index thresholds, tier ranges and rate caps. All values are fractions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub maintain_below: f64,
    pub moderate_below: f64,
    pub cap_tier_at: f64,
    pub moderate_range: PercentRange,
    pub strong_range: PercentRange,
    pub weekday_cap: f64,
    pub weekend_cap: f64,
    pub weekly_cap: f64,
    /// Lift confidence below this turns an increase into a suggestion that needs sign-off.
    pub auto_approve_confidence: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            maintain_below: 0.2,
            moderate_below: 0.4,
            cap_tier_at: 0.7,
            moderate_range: PercentRange::new(0.05, 0.08),
            strong_range: PercentRange::new(0.09, 0.15),
            weekday_cap: 0.10,
            weekend_cap: 0.12,
            weekly_cap: 0.18,
            auto_approve_confidence: 0.7,
        }
    }
}

impl PricingPolicy {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("maintain_below", self.maintain_below),
            ("moderate_below", self.moderate_below),
            ("cap_tier_at", self.cap_tier_at),
            ("moderate_range.low", self.moderate_range.low),
            ("moderate_range.high", self.moderate_range.high),
            ("strong_range.low", self.strong_range.low),
            ("strong_range.high", self.strong_range.high),
            ("weekday_cap", self.weekday_cap),
            ("weekend_cap", self.weekend_cap),
            ("weekly_cap", self.weekly_cap),
            ("auto_approve_confidence", self.auto_approve_confidence),
        ];
        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DomainError::policy_config(format!(
                    "{name} must be a finite value in [0, 1], got {value}"
                )));
            }
        }

        if !(0.0 < self.maintain_below
            && self.maintain_below < self.moderate_below
            && self.moderate_below < self.cap_tier_at)
        {
            return Err(DomainError::policy_config(
                "thresholds must be strictly increasing: \
                 0 < maintain_below < moderate_below < cap_tier_at",
            ));
        }

        for (name, range) in
            [("moderate_range", self.moderate_range), ("strong_range", self.strong_range)]
        {
            if range.low > range.high {
                return Err(DomainError::policy_config(format!(
                    "{name} lower bound {} exceeds upper bound {}",
                    range.low, range.high
                )));
            }
        }

        for (name, cap) in [("weekday_cap", self.weekday_cap), ("weekend_cap", self.weekend_cap)] {
            if cap <= 0.0 {
                return Err(DomainError::policy_config(format!("{name} must be greater than zero")));
            }
            if cap > self.weekly_cap {
                return Err(DomainError::policy_config(format!(
                    "{name} ({cap}) must not exceed weekly_cap ({})",
                    self.weekly_cap
                )));
            }
        }

        Ok(())
    }

    pub fn cap_for(&self, calendar: CalendarContext) -> f64 {
        if calendar.is_weekend {
            self.weekend_cap
        } else {
            self.weekday_cap
        }
    }

    pub fn action_for(&self, index: f64) -> PricingAction {
        if index < self.maintain_below {
            PricingAction::Maintain
        } else if index < self.moderate_below {
            PricingAction::Increase5To8
        } else if index < self.cap_tier_at {
            PricingAction::Increase9To15
        } else {
            PricingAction::IncreaseToCapWithApproval
        }
    }
}

pub trait PricingPolicyEvaluator: Send + Sync {
    fn recommend(
        &self,
        index: f64,
        calendar: CalendarContext,
    ) -> Result<PricingRecommendation, DomainError>;

    fn policy(&self) -> &PricingPolicy;
}

#[derive(Clone, Debug)]
pub struct PricingPolicyEngine {
    policy: PricingPolicy,
}

impl PricingPolicyEngine {
    pub fn new(policy: PricingPolicy) -> Result<Self, DomainError> {
        policy.validate()?;
        Ok(Self { policy })
    }
}

impl Default for PricingPolicyEngine {
    fn default() -> Self {
        Self { policy: PricingPolicy::default() }
    }
}

impl PricingPolicyEvaluator for PricingPolicyEngine {
    fn recommend(
        &self,
        index: f64,
        calendar: CalendarContext,
    ) -> Result<PricingRecommendation, DomainError> {
        recommend_with_policy(&self.policy, index, calendar)
    }

    fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

/// Recommends with the default policy.
pub fn recommend(
    index: f64,
    is_weekend: bool,
    is_holiday: bool,
) -> Result<PricingRecommendation, DomainError> {
    recommend_with_policy(
        &PricingPolicy::default(),
        index,
        CalendarContext::new(is_weekend, is_holiday),
    )
}

pub fn recommend_with_policy(
    policy: &PricingPolicy,
    index: f64,
    calendar: CalendarContext,
) -> Result<PricingRecommendation, DomainError> {
    policy.validate()?;
    if !index.is_finite() || !(0.0..=1.0).contains(&index) {
        return Err(DomainError::invalid_signal(format!(
            "demand lift index must be a finite value in [0, 1], got {index}"
        )));
    }

    let cap = policy.cap_for(calendar);
    let action = policy.action_for(index);
    let tier_range = match action {
        PricingAction::Maintain => return Ok(PricingRecommendation::maintain(cap)),
        PricingAction::Increase5To8 => policy.moderate_range,
        PricingAction::Increase9To15 => policy.strong_range,
        PricingAction::IncreaseToCapWithApproval => PercentRange::new(cap, cap),
    };

    let mut reasons = Vec::new();
    let percent_range = tier_range.clamped_to(cap);
    if percent_range != tier_range {
        let day = if calendar.is_weekend { "weekend" } else { "weekday" };
        reasons.push(format!("range clamped to {day} cap of {cap}"));
    }

    let mut requires_approval = false;
    if action == PricingAction::IncreaseToCapWithApproval {
        requires_approval = true;
        reasons.push(format!("index {index} at or above {} requires approval", policy.cap_tier_at));
    }
    if calendar.is_holiday {
        requires_approval = true;
        reasons.push("rate increases on holidays require approval".to_string());
    }

    Ok(PricingRecommendation { action, percent_range, requires_approval, cap, reasons })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        recommend, recommend_with_policy, PricingPolicy, PricingPolicyEngine,
        PricingPolicyEvaluator,
    };
    use crate::domain::calendar::CalendarContext;
    use crate::domain::recommendation::{PercentRange, PricingAction};
    use crate::errors::DomainError;

    #[test]
    fn tiers_follow_default_thresholds() {
        let cases = [
            (0.0, PricingAction::Maintain),
            (0.199, PricingAction::Maintain),
            (0.2, PricingAction::Increase5To8),
            (0.399, PricingAction::Increase5To8),
            (0.4, PricingAction::Increase9To15),
            (0.699, PricingAction::Increase9To15),
            (0.7, PricingAction::IncreaseToCapWithApproval),
            (1.0, PricingAction::IncreaseToCapWithApproval),
        ];
        for (index, expected) in cases {
            let recommendation = recommend(index, false, false).expect("valid index");
            assert_eq!(recommendation.action, expected, "index {index}");
        }
    }

    #[test]
    fn maintain_has_zero_range_and_no_approval() {
        let recommendation = recommend(0.125, false, false).expect("valid index");
        assert_eq!(recommendation.action, PricingAction::Maintain);
        assert!(recommendation.percent_range.is_zero());
        assert!(!recommendation.requires_approval);
    }

    #[test]
    fn strong_tier_is_clamped_to_day_cap() {
        let weekday = recommend(0.5, false, false).expect("valid index");
        assert_eq!(weekday.percent_range, PercentRange::new(0.09, 0.10));
        assert!(weekday.reasons.iter().any(|reason| reason.contains("weekday cap")));

        let weekend = recommend(0.5, true, false).expect("valid index");
        assert_eq!(weekend.percent_range, PercentRange::new(0.09, 0.12));
        assert!(!weekend.requires_approval);
    }

    #[test]
    fn high_index_on_holiday_requires_approval_up_to_cap() {
        let recommendation = recommend(0.75, false, true).expect("valid index");
        assert_eq!(recommendation.action, PricingAction::IncreaseToCapWithApproval);
        assert!(recommendation.requires_approval);
        assert_eq!(recommendation.percent_range, PercentRange::new(0.10, 0.10));

        let weekend = recommend(0.75, true, false).expect("valid index");
        assert!(weekend.requires_approval);
        assert_eq!(weekend.percent_range.high, 0.12);
    }

    #[test]
    fn holiday_increases_require_approval() {
        let recommendation = recommend(0.3, false, true).expect("valid index");
        assert_eq!(recommendation.action, PricingAction::Increase5To8);
        assert!(recommendation.requires_approval);

        let maintain = recommend(0.1, false, true).expect("valid index");
        assert!(!maintain.requires_approval);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert!(matches!(recommend(1.2, false, false), Err(DomainError::InvalidSignal(_))));
        assert!(matches!(recommend(f64::NAN, false, false), Err(DomainError::InvalidSignal(_))));
    }

    #[test]
    fn policy_validation_rejects_malformed_config() {
        let unordered = PricingPolicy { moderate_below: 0.8, ..PricingPolicy::default() };
        assert!(matches!(unordered.validate(), Err(DomainError::PolicyConfig(_))));

        let cap_above_weekly = PricingPolicy { weekend_cap: 0.2, ..PricingPolicy::default() };
        assert!(matches!(
            PricingPolicyEngine::new(cap_above_weekly),
            Err(DomainError::PolicyConfig(ref message)) if message.contains("weekend_cap")
        ));

        let inverted_range = PricingPolicy {
            moderate_range: PercentRange::new(0.08, 0.05),
            ..PricingPolicy::default()
        };
        assert!(inverted_range.validate().is_err());

        let zero_cap = PricingPolicy { weekday_cap: 0.0, ..PricingPolicy::default() };
        assert!(zero_cap.validate().is_err());

        assert!(PricingPolicy::default().validate().is_ok());
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let policy = PricingPolicy {
            maintain_below: 0.1,
            moderate_below: 0.3,
            cap_tier_at: 0.6,
            ..PricingPolicy::default()
        };
        let engine = PricingPolicyEngine::new(policy).expect("valid policy");
        let recommendation =
            engine.recommend(0.65, CalendarContext::default()).expect("valid index");
        assert_eq!(recommendation.action, PricingAction::IncreaseToCapWithApproval);
        assert_eq!(engine.policy().cap_tier_at, 0.6);
    }

    proptest! {
        #[test]
        fn ranges_never_exceed_single_call_caps(
            index in 0.0f64..=1.0,
            is_weekend in any::<bool>(),
            is_holiday in any::<bool>(),
        ) {
            let policy = PricingPolicy::default();
            let recommendation = recommend_with_policy(
                &policy,
                index,
                CalendarContext::new(is_weekend, is_holiday),
            ).expect("valid index");
            let cap = if is_weekend { policy.weekend_cap } else { policy.weekday_cap };
            prop_assert!(recommendation.percent_range.high <= cap);
            prop_assert!(recommendation.percent_range.low <= recommendation.percent_range.high);
        }
    }
}
