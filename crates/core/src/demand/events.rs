use chrono::NaiveDate;

use crate::domain::calendar::{CalendarEvent, EventKind};
use crate::domain::signal::{validate_unit_weight, EventImpact};
use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventCalendar {
    events: Vec<CalendarEvent>,
}

impl EventCalendar {
    pub fn new(events: Vec<CalendarEvent>) -> Result<Self, DomainError> {
        for event in &events {
            validate_unit_weight(&format!("weight of event `{}`", event.name), event.weight)?;
        }
        Ok(Self { events })
    }

    pub fn events_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<&CalendarEvent> {
        self.events.iter().filter(|event| from <= event.date && event.date <= to).collect()
    }

    /// Strongest single event in the inclusive window; events do not stack.
    pub fn impact_between(&self, from: NaiveDate, to: NaiveDate) -> EventImpact {
        let weight = self
            .events_between(from, to)
            .into_iter()
            .map(|event| event.weight)
            .fold(0.0_f64, f64::max);
        EventImpact { weight }
    }

    pub fn impact_on(&self, date: NaiveDate) -> EventImpact {
        self.impact_between(date, date)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.events_between(date, date).iter().any(|event| event.kind == EventKind::FederalHoliday)
    }
}
