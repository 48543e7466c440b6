use std::cmp::Ordering;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::event::VerifiableEvent;

/// Wraps a stored event with its first-seen timestamp.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Timestamped<M> {
    pub timestamp: DateTime<Local>,
    pub event: M,
}

impl<M> Timestamped<M> {
    pub fn new(event: M) -> Self {
        Self {
            timestamp: Local::now(),
            event,
        }
    }
}

impl From<Timestamped<VerifiableEvent>> for VerifiableEvent {
    fn from(event: Timestamped<VerifiableEvent>) -> VerifiableEvent {
        event.event
    }
}

/// WARNING: timestamp will change on conversion to current time
impl<M> From<M> for Timestamped<M> {
    fn from(event: M) -> Timestamped<M> {
        Timestamped::new(event)
    }
}

impl<M: Clone> From<&M> for Timestamped<M> {
    fn from(event: &M) -> Timestamped<M> {
        Timestamped::new(event.clone())
    }
}

impl<M: PartialEq> PartialEq for Timestamped<M> {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event
    }
}

impl PartialOrd for Timestamped<VerifiableEvent> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamped<VerifiableEvent> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.event.event.get_sn().cmp(&other.event.event.get_sn())
    }
}

impl Eq for Timestamped<VerifiableEvent> {}

pub type TimestampedVerifiableEvent = Timestamped<VerifiableEvent>;
