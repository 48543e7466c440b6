pub(crate) mod tables;
pub mod timestamped;

use std::path::{Path, PathBuf};

use self::tables::{SledEventTree, SledEventTreeVec};
use self::timestamped::TimestampedVerifiableEvent;
use crate::{
    event::VerifiableEvent,
    prefix::{IdentifierPrefix, Prefix},
    query::tel_state_notice::TelStateNotice,
};

/// Key of a credential TEL namespaced under its registry.
pub fn ns_key(registry_id: &IdentifierPrefix, vc_id: &IdentifierPrefix) -> String {
    format!("{}.{}", registry_id.to_str(), vc_id.to_str())
}

/// Registry store: accepted TEL logs, the three escrows and the latest
/// registry state notices. Accepted entries carry their anchor couple,
/// attributed backer signatures, backer set and first-seen timestamp.
pub struct EventDatabase {
    // "iids" tree
    identifiers: SledEventTree<String>,
    // "tels" tree
    accepted_events: SledEventTreeVec<TimestampedVerifiableEvent>,
    // "taes" tree
    anchorless_events: SledEventTreeVec<TimestampedVerifiableEvent>,
    // "oots" tree
    out_of_order_events: SledEventTreeVec<TimestampedVerifiableEvent>,
    // "twes" tree
    partially_witnessed_events: SledEventTreeVec<TimestampedVerifiableEvent>,
    // "stts" tree
    registry_states: SledEventTree<TelStateNotice>,
}

impl EventDatabase {
    pub fn new<'a, P>(path: P) -> Result<Self, DbError>
    where
        P: Into<&'a Path>,
    {
        let mut events_path = PathBuf::new();
        events_path.push(path.into());
        let mut escrow_path = events_path.clone();

        events_path.push("events");
        escrow_path.push("escrow");

        let db = sled::open(events_path.as_path())?;
        let escrows_db = sled::open(escrow_path.as_path())?;

        Ok(Self {
            identifiers: SledEventTree::new(db.open_tree(b"iids")?),
            accepted_events: SledEventTreeVec::new(db.open_tree(b"tels")?),
            registry_states: SledEventTree::new(db.open_tree(b"stts")?),
            anchorless_events: SledEventTreeVec::new(escrows_db.open_tree(b"taes")?),
            out_of_order_events: SledEventTreeVec::new(escrows_db.open_tree(b"oots")?),
            partially_witnessed_events: SledEventTreeVec::new(escrows_db.open_tree(b"twes")?),
        })
    }

    /// Appends an event to its TEL. First-seen entries are never replaced:
    /// re-adding an event body already in the log is a no-op.
    pub fn add_accepted_event(&self, event: VerifiableEvent, id: &str) -> Result<(), DbError> {
        let key = self.identifiers.designated_key(&id.to_string())?;
        let present = self
            .accepted_events
            .iter_values(key)
            .map(|mut events| events.any(|e| e.event.event == event.event))
            .unwrap_or(false);
        if present {
            return Ok(());
        }
        self.accepted_events.push(key, event.into())
    }

    pub fn get_accepted_events(
        &self,
        id: &str,
    ) -> Option<impl DoubleEndedIterator<Item = TimestampedVerifiableEvent>> {
        self.accepted_events
            .iter_values(self.identifiers.designated_key(&id.to_string()).ok()?)
    }

    /// Parks an event waiting for its anchoring KEL event. Returns false
    /// when an equal entry is already escrowed.
    pub fn add_anchorless_event(&self, event: VerifiableEvent) -> Result<bool, DbError> {
        Self::add_escrowed(&self.anchorless_events, &self.identifiers, event)
    }

    pub fn get_all_anchorless(
        &self,
    ) -> Option<impl DoubleEndedIterator<Item = TimestampedVerifiableEvent>> {
        self.anchorless_events.get_all()
    }

    pub fn remove_anchorless_event(&self, event: &VerifiableEvent) -> Result<(), DbError> {
        Self::remove_escrowed(&self.anchorless_events, &self.identifiers, event)
    }

    /// Parks an event that arrived before its prerequisites.
    pub fn add_out_of_order_event(&self, event: VerifiableEvent) -> Result<bool, DbError> {
        Self::add_escrowed(&self.out_of_order_events, &self.identifiers, event)
    }

    pub fn get_all_out_of_order(
        &self,
    ) -> Option<impl DoubleEndedIterator<Item = TimestampedVerifiableEvent>> {
        self.out_of_order_events.get_all()
    }

    pub fn remove_out_of_order_event(&self, event: &VerifiableEvent) -> Result<(), DbError> {
        Self::remove_escrowed(&self.out_of_order_events, &self.identifiers, event)
    }

    /// Parks an event short of its backer threshold.
    pub fn add_partially_witnessed_event(&self, event: VerifiableEvent) -> Result<bool, DbError> {
        Self::add_escrowed(&self.partially_witnessed_events, &self.identifiers, event)
    }

    pub fn get_partially_witnessed_events(
        &self,
        id: &str,
    ) -> Option<impl DoubleEndedIterator<Item = TimestampedVerifiableEvent>> {
        self.partially_witnessed_events
            .iter_values(self.identifiers.designated_key(&id.to_string()).ok()?)
    }

    /// Drops every partially witnessed entry carrying the same event body,
    /// regardless of which signatures it was parked with.
    pub fn remove_partially_witnessed_event(&self, event: &VerifiableEvent) -> Result<(), DbError> {
        let id = event.event.get_prefix().to_str();
        let key = self.identifiers.designated_key(&id)?;
        if let Some(entries) = self.partially_witnessed_events.iter_values(key) {
            let kept: Vec<_> = entries.filter(|e| e.event.event != event.event).collect();
            self.partially_witnessed_events.put(key, kept)?;
        }
        Ok(())
    }

    pub fn put_registry_state(&self, id: &str, state: &TelStateNotice) -> Result<(), DbError> {
        self.registry_states
            .insert(self.identifiers.designated_key(&id.to_string())?, state)
    }

    pub fn get_registry_state(&self, id: &str) -> Result<Option<TelStateNotice>, DbError> {
        self.registry_states
            .get(self.identifiers.designated_key(&id.to_string())?)
    }

    fn add_escrowed(
        tree: &SledEventTreeVec<TimestampedVerifiableEvent>,
        identifiers: &SledEventTree<String>,
        event: VerifiableEvent,
    ) -> Result<bool, DbError> {
        let id = event.event.get_prefix().to_str();
        let event = TimestampedVerifiableEvent::from(event);
        if tree.contains_value(&event) {
            Ok(false)
        } else {
            tree.push(identifiers.designated_key(&id)?, event)?;
            Ok(true)
        }
    }

    fn remove_escrowed(
        tree: &SledEventTreeVec<TimestampedVerifiableEvent>,
        identifiers: &SledEventTree<String>,
        event: &VerifiableEvent,
    ) -> Result<(), DbError> {
        let id = event.event.get_prefix().to_str();
        tree.remove(identifiers.designated_key(&id)?, &event.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_cbor::Error),
}
