use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::demand::aggregate::validate_weight_sum;
use crate::domain::signal::{validate_unit_weight, AirportCode, AirportSignal};
use crate::errors::DomainError;

/// Airport weights for properties whose location matches one of `locations`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub name: String,
    #[serde(default)]
    pub locations: Vec<String>,
    pub weights: BTreeMap<String, f64>,
}

impl WeightProfile {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.weights.is_empty() {
            return Err(DomainError::policy_config(format!(
                "weight profile `{}` has no airports",
                self.name
            )));
        }
        for (code, weight) in &self.weights {
            AirportCode::parse(code).map_err(|error| lift_to_config(&self.name, error))?;
            validate_unit_weight(&format!("weight for {code}"), *weight)
                .map_err(|error| lift_to_config(&self.name, error))?;
        }
        validate_weight_sum(self.weights.values().copied())
            .map_err(|error| lift_to_config(&self.name, error))
    }

    pub fn matches(&self, location: &str) -> bool {
        let location = location.to_ascii_lowercase();
        self.locations.iter().any(|keyword| location.contains(&keyword.to_ascii_lowercase()))
    }

    /// Builds signals from `(code, current, baseline)` observations.
    /// Every profiled airport must be observed, and nothing else.
    pub fn signals(
        &self,
        observations: &[(String, u32, u32)],
    ) -> Result<Vec<AirportSignal>, DomainError> {
        let mut signals = Vec::with_capacity(observations.len());
        for (code, current, baseline) in observations {
            let normalized = AirportCode::parse(code)?;
            let weight = self
                .weights
                .iter()
                .find(|(profiled, _)| profiled.trim().eq_ignore_ascii_case(normalized.as_str()))
                .map(|(_, weight)| *weight)
                .ok_or_else(|| {
                    DomainError::invalid_signal(format!(
                        "airport {normalized} is not part of weight profile `{}`",
                        self.name
                    ))
                })?;
            signals.push(AirportSignal::new(normalized.as_str(), *current, *baseline, weight)?);
        }

        if signals.len() != self.weights.len() {
            return Err(DomainError::invalid_signal(format!(
                "weight profile `{}` expects {} airports, got {}",
                self.name,
                self.weights.len(),
                signals.len()
            )));
        }
        Ok(signals)
    }
}

fn lift_to_config(profile: &str, error: DomainError) -> DomainError {
    match error {
        DomainError::InvalidSignal(message) | DomainError::PolicyConfig(message) => {
            DomainError::policy_config(format!("weight profile `{profile}`: {message}"))
        }
        DomainError::ZeroBaseline => DomainError::ZeroBaseline,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightProfiles {
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: Vec<WeightProfile>,
}

impl WeightProfiles {
    pub fn validate(&self) -> Result<(), DomainError> {
        for profile in &self.profiles {
            profile.validate()?;
        }
        if let Some(default_profile) = &self.default_profile {
            if self.find(default_profile).is_none() {
                return Err(DomainError::policy_config(format!(
                    "default weight profile `{default_profile}` is not defined"
                )));
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&WeightProfile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }

    /// First profile with a matching location keyword, else the default profile.
    pub fn resolve(&self, location: &str) -> Result<&WeightProfile, DomainError> {
        if let Some(profile) = self.profiles.iter().find(|profile| profile.matches(location)) {
            return Ok(profile);
        }

        let Some(default_profile) = &self.default_profile else {
            return Err(DomainError::policy_config(format!(
                "no weight profile matches `{location}` and no default profile is configured"
            )));
        };
        self.find(default_profile).ok_or_else(|| {
            DomainError::policy_config(format!(
                "default weight profile `{default_profile}` is not defined"
            ))
        })
    }
}
