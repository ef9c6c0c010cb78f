use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarContext {
    pub is_weekend: bool,
    pub is_holiday: bool,
}

impl CalendarContext {
    pub fn new(is_weekend: bool, is_holiday: bool) -> Self {
        Self { is_weekend, is_holiday }
    }

    /// Saturday and Sunday stay dates count as weekend.
    pub fn for_date(date: NaiveDate, is_holiday: bool) -> Self {
        let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        Self { is_weekend, is_holiday }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Festival,
    Graduation,
    Conference,
    Sports,
    FederalHoliday,
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: NaiveDate,
    pub name: String,
    pub kind: EventKind,
    pub weight: f64,
}

/// Operational disruption risk at the arrival airports (weather, ATC delays).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionRisk {
    #[default]
    Low,
    Medium,
    High,
}

impl DisruptionRisk {
    pub fn freezes_pricing(self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::str::FromStr for DisruptionRisk {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => {
                Err(format!("unsupported disruption risk `{other}` (expected low|medium|high)"))
            }
        }
    }
}
