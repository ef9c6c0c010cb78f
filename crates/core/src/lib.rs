pub mod audit;
pub mod config;
pub mod demand;
pub mod domain;
pub mod errors;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use demand::aggregate::{AggregatedCapacity, FlightSignalAggregator, SignalAggregator};
pub use demand::events::EventCalendar;
pub use demand::lift::{DemandLiftIndexCalculator, LiftCalculator, LiftInput, LiftModel};
pub use demand::policy::{PricingPolicy, PricingPolicyEngine, PricingPolicyEvaluator};
pub use demand::profiles::{WeightProfile, WeightProfiles};
pub use demand::weekly::{AppliedRateChange, RollingCapLedger};
pub use demand::{
    DemandEvaluation, DemandPricingRequest, DemandRuntime, DeterministicDemandRuntime,
    StandardDemandRuntime,
};
pub use domain::calendar::{CalendarContext, CalendarEvent, DisruptionRisk, EventKind};
pub use domain::lift::{DemandLiftDisplay, DemandLiftResult, LiftComponents};
pub use domain::recommendation::{PercentRange, PricingAction, PricingRecommendation};
pub use domain::signal::{AirportCode, AirportSignal, EventImpact};
pub use errors::{ApplicationError, DomainError, InterfaceError};
