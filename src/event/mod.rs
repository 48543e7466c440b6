pub mod manager_event;
pub mod vc_event;
pub mod verifiable_event;

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    event_message::version,
    prefix::{IdentifierPrefix, SelfAddressingPrefix},
};

pub use manager_event::{Config, ManagerEventType, ManagerTelEvent};
pub use vc_event::{VcEventType, VcTelEvent};
pub use verifiable_event::VerifiableEvent;

/// Event kind tag, the wire `t` field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TelEventTag {
    Vcp,
    Vrt,
    Iss,
    Rev,
    Bis,
    Brv,
}

/// Any TEL event: registry management or credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Event {
    Management(ManagerTelEvent),
    Vc(VcTelEvent),
}

impl Event {
    pub fn get_prefix(&self) -> IdentifierPrefix {
        match self {
            Event::Management(ev) => ev.prefix.clone(),
            Event::Vc(ev) => ev.prefix.clone(),
        }
    }

    pub fn get_sn(&self) -> u64 {
        match self {
            Event::Management(ev) => ev.sn,
            Event::Vc(ev) => ev.sn,
        }
    }

    pub fn get_tag(&self) -> TelEventTag {
        match self {
            Event::Management(ev) => match ev.event_type {
                ManagerEventType::Vcp(_) => TelEventTag::Vcp,
                ManagerEventType::Vrt(_) => TelEventTag::Vrt,
            },
            Event::Vc(ev) => match ev.event_type {
                VcEventType::Iss(_) => TelEventTag::Iss,
                VcEventType::Rev(_) => TelEventTag::Rev,
                VcEventType::Bis(_) => TelEventTag::Bis,
                VcEventType::Brv(_) => TelEventTag::Brv,
            },
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        match self {
            Event::Management(ev) => ev.serialize(),
            Event::Vc(ev) => ev.serialize(),
        }
    }

    pub fn get_digest(&self) -> Result<SelfAddressingPrefix, Error> {
        match self {
            Event::Management(ev) => ev.get_digest(),
            Event::Vc(ev) => ev.get_digest(),
        }
    }

    /// Deserializes raw event bytes according to their version string.
    pub fn parse(raw: &[u8]) -> Result<Event, Error> {
        version(raw)?.kind.decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_message::serialization_info::SerializationFormats;
    use crate::prefix::SelfAddressing;

    #[test]
    fn parse_dispatches_on_kind() -> Result<(), Error> {
        let inc = manager_event::Inc {
            issuer_id: "DntNTPnDFBnmlO6J44LXCrzZTAmpe-82b7BmQGtL4QhM".parse().unwrap(),
            config: vec![Config::NoBackers],
            backer_threshold: 0,
            backers: vec![],
        };
        let vcp = inc
            .incept_self_addressing(SelfAddressing::Blake3_256, SerializationFormats::JSON)?;
        let raw = vcp.serialize()?;

        let parsed = Event::parse(&raw)?;
        assert_eq!(parsed.get_tag(), TelEventTag::Vcp);
        assert_eq!(parsed, Event::Management(vcp));
        assert_eq!(parsed.serialize()?, raw);

        Ok(())
    }
}
