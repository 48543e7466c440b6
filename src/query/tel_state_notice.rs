use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    event::{Config, TelEventTag},
    event_message::{
        serial_number,
        serialization_info::{SerializationFormats, SerializationInfo},
    },
    prefix::{BasicPrefix, IdentifierPrefix, SelfAddressingPrefix},
    seal::EventSourceSeal,
};

/// Registry transaction state notice: the persisted snapshot of a
/// management TEL, shaped like a key state notice.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TelStateNotice {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,

    #[serde(rename = "i")]
    pub registry_id: IdentifierPrefix,

    #[serde(rename = "s", with = "serial_number")]
    pub sn: u64,

    #[serde(rename = "d")]
    pub last_event_digest: SelfAddressingPrefix,

    #[serde(rename = "ii")]
    pub issuer: IdentifierPrefix,

    #[serde(rename = "dt")]
    pub timestamp: DateTime<FixedOffset>,

    #[serde(rename = "et")]
    pub last_event_tag: TelEventTag,

    #[serde(rename = "a")]
    pub anchor: EventSourceSeal,

    #[serde(rename = "bt", with = "serial_number")]
    pub backer_threshold: u64,

    #[serde(rename = "br")]
    pub backers_removed: Vec<BasicPrefix>,

    #[serde(rename = "ba")]
    pub backers_added: Vec<BasicPrefix>,

    #[serde(rename = "b")]
    pub backers: Vec<BasicPrefix>,

    #[serde(rename = "c")]
    pub config: Vec<Config>,
}

impl TelStateNotice {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        registry_id: IdentifierPrefix,
        sn: u64,
        last_event_digest: SelfAddressingPrefix,
        issuer: IdentifierPrefix,
        timestamp: DateTime<FixedOffset>,
        last_event_tag: TelEventTag,
        anchor: EventSourceSeal,
        backer_threshold: u64,
        backers_removed: Vec<BasicPrefix>,
        backers_added: Vec<BasicPrefix>,
        backers: Vec<BasicPrefix>,
        config: Vec<Config>,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        let mut notice = Self {
            serialization_info: SerializationInfo::new(format, 0),
            registry_id,
            sn,
            last_event_digest,
            issuer,
            timestamp,
            last_event_tag,
            anchor,
            backer_threshold,
            backers_removed,
            backers_added,
            backers,
            config,
        };
        notice.serialization_info = SerializationInfo::new(format, notice.serialize()?.len());
        Ok(notice)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(self)
    }
}

/// Credential transaction state notice.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VcStateNotice {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,

    #[serde(rename = "i")]
    pub vc_id: IdentifierPrefix,

    #[serde(rename = "s", with = "serial_number")]
    pub sn: u64,

    #[serde(rename = "d")]
    pub last_event_digest: SelfAddressingPrefix,

    #[serde(rename = "ri")]
    pub registry_id: IdentifierPrefix,

    #[serde(rename = "a")]
    pub anchor: EventSourceSeal,

    #[serde(rename = "dt")]
    pub timestamp: DateTime<FixedOffset>,

    #[serde(rename = "et")]
    pub last_event_tag: TelEventTag,
}

impl VcStateNotice {
    pub(crate) fn new(
        vc_id: IdentifierPrefix,
        sn: u64,
        last_event_digest: SelfAddressingPrefix,
        registry_id: IdentifierPrefix,
        anchor: EventSourceSeal,
        timestamp: DateTime<FixedOffset>,
        last_event_tag: TelEventTag,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        let mut notice = Self {
            serialization_info: SerializationInfo::new(format, 0),
            vc_id,
            sn,
            last_event_digest,
            registry_id,
            anchor,
            timestamp,
            last_event_tag,
        };
        notice.serialization_info = SerializationInfo::new(format, notice.serialize()?.len());
        Ok(notice)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(self)
    }
}
