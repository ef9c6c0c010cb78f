use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingAction {
    Maintain,
    #[serde(rename = "INCREASE_5_8")]
    Increase5To8,
    #[serde(rename = "INCREASE_9_15")]
    Increase9To15,
    IncreaseToCapWithApproval,
}

impl PricingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintain => "MAINTAIN",
            Self::Increase5To8 => "INCREASE_5_8",
            Self::Increase9To15 => "INCREASE_9_15",
            Self::IncreaseToCapWithApproval => "INCREASE_TO_CAP_WITH_APPROVAL",
        }
    }

    pub fn is_increase(self) -> bool {
        !matches!(self, Self::Maintain)
    }
}

impl std::fmt::Display for PricingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fractional rate-change band, e.g. `(0.05, 0.08)` for +5-8%.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentRange {
    pub low: f64,
    pub high: f64,
}

impl PercentRange {
    pub const ZERO: Self = Self { low: 0.0, high: 0.0 };

    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn clamped_to(self, ceiling: f64) -> Self {
        Self { low: self.low.min(ceiling), high: self.high.min(ceiling) }
    }

    pub fn is_zero(&self) -> bool {
        self.low == 0.0 && self.high == 0.0
    }
}

impl From<(f64, f64)> for PercentRange {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingRecommendation {
    /// Demand tier. After weekly cap clamping `percent_range` can sit below it.
    pub action: PricingAction,
    pub percent_range: PercentRange,
    pub requires_approval: bool,
    /// Single-call cap in force (weekday or weekend).
    pub cap: f64,
    pub reasons: Vec<String>,
}

impl PricingRecommendation {
    pub fn maintain(cap: f64) -> Self {
        Self {
            action: PricingAction::Maintain,
            percent_range: PercentRange::ZERO,
            requires_approval: false,
            cap,
            reasons: Vec::new(),
        }
    }

    /// Drops to MAINTAIN, keeping prior reasons and appending `reason`.
    pub fn freeze(mut self, reason: impl Into<String>) -> Self {
        self.action = PricingAction::Maintain;
        self.percent_range = PercentRange::ZERO;
        self.requires_approval = false;
        self.reasons.push(reason.into());
        self
    }

    pub fn require_approval(mut self, reason: impl Into<String>) -> Self {
        self.requires_approval = true;
        self.reasons.push(reason.into());
        self
    }
}
