pub mod calendar;
pub mod lift;
pub mod recommendation;
pub mod signal;
