use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid signal: {0}")]
    InvalidSignal(String),
    #[error("baseline seat capacity is zero; seat capacity delta is undefined")]
    ZeroBaseline,
    #[error("invalid pricing policy: {0}")]
    PolicyConfig(String),
}

impl DomainError {
    pub fn invalid_signal(message: impl Into<String>) -> Self {
        Self::InvalidSignal(message.into())
    }

    pub fn policy_config(message: impl Into<String>) -> Self {
        Self::PolicyConfig(message.into())
    }

    /// Stable machine-readable class, used by the CLI output envelope.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::InvalidSignal(_) => "invalid_signal",
            Self::ZeroBaseline => "division_by_zero",
            Self::PolicyConfig(_) => "policy_config",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The pricing request could not be processed. Check signal inputs and try again."
            }
            Self::Internal { .. } => {
                "HotelPilot configuration is invalid. Run `hotelpilot doctor` for details."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error @ DomainError::InvalidSignal(_))
            | ApplicationError::Domain(error @ DomainError::ZeroBaseline) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(error @ DomainError::PolicyConfig(_)) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn invalid_signal_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(DomainError::invalid_signal("signal set is empty"))
                .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("signal set is empty")
        ));
    }

    #[test]
    fn zero_baseline_is_a_bad_request_with_user_safe_message() {
        let interface =
            ApplicationError::from(DomainError::ZeroBaseline).into_interface("req-2");

        assert_eq!(interface.correlation_id(), "req-2");
        assert_eq!(
            interface.user_message(),
            "The pricing request could not be processed. Check signal inputs and try again."
        );
    }

    #[test]
    fn policy_config_error_maps_to_internal() {
        let interface =
            ApplicationError::from(DomainError::policy_config("weekday_cap above weekly"))
                .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(
            interface.user_message(),
            "HotelPilot configuration is invalid. Run `hotelpilot doctor` for details."
        );
    }

    #[test]
    fn error_classes_are_stable() {
        assert_eq!(DomainError::invalid_signal("x").error_class(), "invalid_signal");
        assert_eq!(DomainError::ZeroBaseline.error_class(), "division_by_zero");
        assert_eq!(DomainError::policy_config("x").error_class(), "policy_config");
    }
}
