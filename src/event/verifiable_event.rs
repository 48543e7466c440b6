use serde::{Deserialize, Serialize};

use super::Event;
use crate::{
    error::Error,
    prefix::{AttachedSignaturePrefix, BasicPrefix, SelfAddressingPrefix},
    seal::EventSourceSeal,
};

/// A TEL event coupled with the location of the KEL event that anchors it
/// and the backer signatures collected for it. This is the unit the
/// verifier consumes, stores and escrows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VerifiableEvent {
    pub event: Event,

    pub seal: EventSourceSeal,

    pub backer_signatures: Vec<AttachedSignaturePrefix>,

    // effective backer set, pinned on accepted management events so
    // credential events can resolve it through their `ra` seal
    pub backers: Option<Vec<BasicPrefix>>,
}

impl VerifiableEvent {
    pub fn new(
        event: Event,
        seal: EventSourceSeal,
        backer_signatures: Vec<AttachedSignaturePrefix>,
    ) -> Self {
        Self {
            event,
            seal,
            backer_signatures,
            backers: None,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.event.serialize()
    }

    pub fn get_digest(&self) -> Result<SelfAddressingPrefix, Error> {
        self.event.get_digest()
    }
}
