pub mod aggregate;
pub mod events;
pub mod lift;
pub mod policy;
pub mod profiles;
pub mod weekly;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use crate::domain::calendar::{CalendarContext, DisruptionRisk};
use crate::domain::lift::DemandLiftResult;
use crate::domain::recommendation::PricingRecommendation;
use crate::domain::signal::AirportSignal;
use crate::errors::DomainError;

use self::{
    aggregate::{AggregatedCapacity, FlightSignalAggregator, SignalAggregator},
    lift::{DemandLiftIndexCalculator, LiftCalculator, LiftInput},
    policy::{PricingPolicy, PricingPolicyEngine, PricingPolicyEvaluator},
    weekly::{AppliedRateChange, RollingCapLedger},
};

/// Everything a request layer gathers before asking for a rate recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandPricingRequest {
    #[serde(default)]
    pub property_id: Option<String>,
    pub signals: Vec<AirportSignal>,
    #[serde(default)]
    pub fare_pressure: Option<f64>,
    #[serde(default)]
    pub event_weight: f64,
    #[serde(default)]
    pub calendar: CalendarContext,
    #[serde(default)]
    pub disruption: DisruptionRisk,
    /// Previously applied changes; enables 7-day rolling cap clamping.
    #[serde(default)]
    pub history: Vec<AppliedRateChange>,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl DemandPricingRequest {
    pub fn new(signals: Vec<AirportSignal>) -> Self {
        Self {
            property_id: None,
            signals,
            fare_pressure: None,
            event_weight: 0.0,
            calendar: CalendarContext::default(),
            disruption: DisruptionRisk::Low,
            history: Vec::new(),
            as_of: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandEvaluation {
    pub capacity: AggregatedCapacity,
    pub lift: DemandLiftResult,
    pub recommendation: PricingRecommendation,
}

pub trait DemandRuntime: Send + Sync {
    fn evaluate(
        &self,
        request: &DemandPricingRequest,
        context: &AuditContext,
    ) -> Result<DemandEvaluation, DomainError>;
}

/// Runs aggregate, compute and recommend in sequence, then applies the
/// request-level gates (confidence, disruption freeze, rolling weekly cap).
pub struct DeterministicDemandRuntime<A, L, P> {
    aggregator: A,
    calculator: L,
    policy_engine: P,
    audit_sink: Arc<dyn AuditSink>,
}

impl<A, L, P> DeterministicDemandRuntime<A, L, P> {
    pub fn new(aggregator: A, calculator: L, policy_engine: P) -> Self {
        Self { aggregator, calculator, policy_engine, audit_sink: Arc::new(TracingAuditSink) }
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }
}

pub type StandardDemandRuntime = DeterministicDemandRuntime<
    FlightSignalAggregator,
    DemandLiftIndexCalculator,
    PricingPolicyEngine,
>;

impl Default for StandardDemandRuntime {
    fn default() -> Self {
        Self::new(
            FlightSignalAggregator,
            DemandLiftIndexCalculator::default(),
            PricingPolicyEngine::default(),
        )
    }
}

impl StandardDemandRuntime {
    pub fn with_policy(policy: PricingPolicy) -> Result<Self, DomainError> {
        Ok(Self::new(
            FlightSignalAggregator,
            DemandLiftIndexCalculator::default(),
            PricingPolicyEngine::new(policy)?,
        ))
    }
}

impl<A, L, P> DeterministicDemandRuntime<A, L, P>
where
    A: SignalAggregator,
    L: LiftCalculator,
    P: PricingPolicyEvaluator,
{
    fn run(
        &self,
        request: &DemandPricingRequest,
    ) -> Result<DemandEvaluation, (AuditCategory, DomainError)> {
        let capacity = self
            .aggregator
            .aggregate(&request.signals)
            .map_err(|error| (AuditCategory::Aggregation, error))?;
        debug!(
            event_name = "demand.aggregated",
            airports = request.signals.len(),
            weighted_current = capacity.weighted_current,
            weighted_baseline = capacity.weighted_baseline,
            "flight signals aggregated"
        );

        let lift = self
            .calculator
            .compute(
                &LiftInput::new(capacity.weighted_current, capacity.weighted_baseline)
                    .with_fare_pressure(request.fare_pressure)
                    .with_event_weight(request.event_weight),
            )
            .map_err(|error| (AuditCategory::Lift, error))?;
        debug!(
            event_name = "demand.lift_computed",
            index = lift.index,
            seat_capacity_delta = lift.seat_capacity_delta,
            fare_pressure = lift.fare_pressure,
            fare_pressure_estimated = lift.fare_pressure_estimated,
            confidence = lift.confidence,
            "demand lift index computed"
        );

        let policy = self.policy_engine.policy();
        let mut recommendation = self
            .policy_engine
            .recommend(lift.index, request.calendar)
            .map_err(|error| (AuditCategory::Pricing, error))?;

        if recommendation.action.is_increase() && lift.confidence < policy.auto_approve_confidence {
            recommendation = recommendation.require_approval(format!(
                "lift confidence {} is below auto-approve threshold {}",
                lift.confidence, policy.auto_approve_confidence
            ));
        }

        if request.disruption.freezes_pricing() && recommendation.action.is_increase() {
            warn!(
                event_name = "demand.pricing_frozen",
                index = lift.index,
                "high operational disruption risk; rate increase withheld"
            );
            recommendation =
                recommendation.freeze("high operational disruption risk freezes pricing");
        }

        if !request.history.is_empty() {
            let Some(as_of) = request.as_of else {
                return Err((
                    AuditCategory::Pricing,
                    DomainError::invalid_signal(
                        "as_of date is required when rate history is supplied",
                    ),
                ));
            };
            let ledger = RollingCapLedger::new(request.history.clone())
                .map_err(|error| (AuditCategory::Pricing, error))?;
            recommendation = ledger.clamp(recommendation, as_of, policy.weekly_cap);
        }

        Ok(DemandEvaluation { capacity, lift, recommendation })
    }
}

impl<A, L, P> DemandRuntime for DeterministicDemandRuntime<A, L, P>
where
    A: SignalAggregator,
    L: LiftCalculator,
    P: PricingPolicyEvaluator,
{
    fn evaluate(
        &self,
        request: &DemandPricingRequest,
        context: &AuditContext,
    ) -> Result<DemandEvaluation, DomainError> {
        let mut context = context.clone();
        if context.property_id.is_none() {
            context.property_id = request.property_id.clone();
        }

        match self.run(request) {
            Ok(evaluation) => {
                let rounded = evaluation.lift.display();
                info!(
                    event_name = "demand.recommended",
                    correlation_id = %context.correlation_id,
                    property_id = context.property_id.as_deref().unwrap_or("unknown"),
                    action = %evaluation.recommendation.action,
                    index = %rounded.index,
                    confidence = %rounded.confidence,
                    requires_approval = evaluation.recommendation.requires_approval,
                    "pricing recommendation produced"
                );
                self.audit_sink.emit(
                    AuditEvent::new(
                        &context,
                        "pricing.recommended",
                        AuditCategory::Pricing,
                        AuditOutcome::Success,
                    )
                    .with_metadata("action", evaluation.recommendation.action.as_str())
                    .with_metadata("index", rounded.index.to_string())
                    .with_metadata("confidence", rounded.confidence.to_string())
                    .with_metadata("seat_contribution", rounded.seat_contribution.to_string())
                    .with_metadata("fare_contribution", rounded.fare_contribution.to_string())
                    .with_metadata("event_contribution", rounded.event_contribution.to_string())
                    .with_metadata(
                        "requires_approval",
                        evaluation.recommendation.requires_approval.to_string(),
                    ),
                );
                Ok(evaluation)
            }
            Err((category, error)) => {
                warn!(
                    event_name = "demand.rejected",
                    correlation_id = %context.correlation_id,
                    error_class = error.error_class(),
                    error = %error,
                    "pricing request rejected"
                );
                self.audit_sink.emit(
                    AuditEvent::new(&context, "pricing.rejected", category, AuditOutcome::Rejected)
                        .with_metadata("error_class", error.error_class())
                        .with_metadata("error", error.to_string()),
                );
                Err(error)
            }
        }
    }
}
