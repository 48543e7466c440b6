//! Read access to the controlling key event log. The KEL itself is an
//! external collaborator: the verifier only needs the raw bytes of the
//! event accepted at a given `(identifier, sn)` slot to check anchoring
//! seals against it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    database::tables::{SledEventTree, SledEventTreeVec},
    error::Error,
    event_message::{serialization_info::SerializationInfo, version},
    prefix::{IdentifierPrefix, Prefix},
    seal::Seal,
};

pub trait KeyEventLog {
    /// Raw bytes of the latest event accepted at `(prefix, sn)`, if any.
    fn get_event_at_sn(
        &self,
        prefix: &IdentifierPrefix,
        sn: u64,
    ) -> Result<Option<Vec<u8>>, Error>;
}

/// The slice of a KEL event the anchor check needs: its version string
/// and seal list. Everything else stays opaque.
#[derive(Deserialize, Debug, Clone)]
pub struct KelEventView {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,

    #[serde(rename = "a", default)]
    pub seals: Vec<Seal>,
}

impl KelEventView {
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        version(raw)?.kind.decode(raw)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct KelLogEntry {
    sn: u64,
    raw: Vec<u8>,
}

/// Sled-backed key event log, enough to serve anchor lookups.
pub struct KelLog {
    // "iids" tree
    identifiers: SledEventTree<String>,
    // "kels" tree
    events: SledEventTreeVec<KelLogEntry>,
}

impl KelLog {
    pub fn new<'a, P>(path: P) -> Result<Self, Error>
    where
        P: Into<&'a Path>,
    {
        let mut events_path = PathBuf::new();
        events_path.push(path.into());
        let db = sled::open(events_path.as_path())?;
        Ok(Self {
            identifiers: SledEventTree::new(db.open_tree(b"iids")?),
            events: SledEventTreeVec::new(db.open_tree(b"kels")?),
        })
    }

    pub fn insert_event(
        &self,
        prefix: &IdentifierPrefix,
        sn: u64,
        raw: Vec<u8>,
    ) -> Result<(), Error> {
        let key = self.identifiers.designated_key(&prefix.to_str())?;
        self.events.push(key, KelLogEntry { sn, raw })?;
        Ok(())
    }
}

impl KeyEventLog for KelLog {
    fn get_event_at_sn(
        &self,
        prefix: &IdentifierPrefix,
        sn: u64,
    ) -> Result<Option<Vec<u8>>, Error> {
        let key = self.identifiers.designated_key(&prefix.to_str())?;
        Ok(self
            .events
            .iter_values(key)
            .and_then(|events| events.filter(|e| e.sn == sn).last())
            .map(|e| e.raw))
    }
}
