use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// IATA airport code, normalized to trimmed upper-case.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct AirportCode(pub String);

impl AirportCode {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::invalid_signal("airport code must not be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AirportCode {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl std::fmt::Display for AirportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observed vs. expected arriving seat capacity at one airport for a date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AirportSignal {
    pub airport_code: AirportCode,
    pub current_seats: u32,
    pub baseline_seats: u32,
    pub weight: f64,
}

impl AirportSignal {
    pub fn new(
        airport_code: &str,
        current_seats: u32,
        baseline_seats: u32,
        weight: f64,
    ) -> Result<Self, DomainError> {
        let signal = Self {
            airport_code: AirportCode::parse(airport_code)?,
            current_seats,
            baseline_seats,
            weight,
        };
        signal.validate()?;
        Ok(signal)
    }

    /// Re-checks invariants; deserialized signals bypass `new`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.airport_code.0.trim().is_empty() {
            return Err(DomainError::invalid_signal("airport code must not be empty"));
        }
        if self.baseline_seats == 0 {
            return Err(DomainError::invalid_signal(format!(
                "baseline_seats for {} must be greater than zero",
                self.airport_code
            )));
        }
        validate_unit_weight(&format!("weight for {}", self.airport_code), self.weight)
    }
}

/// Aggregate uplift from local events or holidays in a date/location window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    pub weight: f64,
}

impl EventImpact {
    pub fn none() -> Self {
        Self { weight: 0.0 }
    }

    pub fn new(weight: f64) -> Result<Self, DomainError> {
        validate_unit_weight("event weight", weight)?;
        Ok(Self { weight })
    }
}

pub(crate) fn validate_unit_weight(label: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(DomainError::invalid_signal(format!(
            "{label} must be a finite value in [0, 1], got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AirportCode, AirportSignal, EventImpact};
    use crate::errors::DomainError;

    #[test]
    fn airport_code_is_normalized() {
        let code = AirportCode::parse("  dca ").expect("code should parse");
        assert_eq!(code.as_str(), "DCA");
        assert!(AirportCode::parse("   ").is_err());
    }

    #[test]
    fn deserialized_signals_are_normalized() {
        let signal: AirportSignal = serde_json::from_str(
            r#"{"airport_code":" iad","current_seats":13000,"baseline_seats":12000,"weight":0.3}"#,
        )
        .expect("signal should deserialize");
        assert_eq!(signal.airport_code.as_str(), "IAD");
        assert!(serde_json::from_str::<AirportCode>(r#""  ""#).is_err());
    }

    #[test]
    fn signal_rejects_zero_baseline_and_out_of_range_weight() {
        assert!(matches!(
            AirportSignal::new("DCA", 8_500, 0, 0.6),
            Err(DomainError::InvalidSignal(ref message)) if message.contains("baseline_seats")
        ));
        assert!(AirportSignal::new("DCA", 8_500, 7_500, 1.2).is_err());
        assert!(AirportSignal::new("DCA", 8_500, 7_500, -0.1).is_err());
        assert!(AirportSignal::new("DCA", 8_500, 7_500, f64::NAN).is_err());
    }

    #[test]
    fn event_impact_defaults_to_zero_and_validates_range() {
        assert_eq!(EventImpact::none().weight, 0.0);
        assert_eq!(EventImpact::default(), EventImpact::none());
        assert!(EventImpact::new(0.4).is_ok());
        assert!(EventImpact::new(1.5).is_err());
    }
}
