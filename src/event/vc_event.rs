use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    event_message::{
        serial_number,
        serialization_info::{SerializationFormats, SerializationInfo},
    },
    prefix::{IdentifierPrefix, SelfAddressing, SelfAddressingPrefix},
    seal::EventSeal,
};

/// Credential TEL event: issuance or revocation of a single verifiable
/// credential under a registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VcTelEvent {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,

    // the credential identifier is the SAID of the credential itself
    #[serde(rename = "i")]
    pub prefix: IdentifierPrefix,

    #[serde(rename = "s", with = "serial_number")]
    pub sn: u64,

    #[serde(flatten)]
    pub event_type: VcEventType,
}

impl VcTelEvent {
    pub fn new(
        prefix: IdentifierPrefix,
        sn: u64,
        event_type: VcEventType,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        let size = Self {
            serialization_info: SerializationInfo::new(format, 0),
            prefix: prefix.clone(),
            sn,
            event_type: event_type.clone(),
        }
        .serialize()?
        .len();
        Ok(Self {
            serialization_info: SerializationInfo::new(format, size),
            prefix,
            sn,
            event_type,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(self)
    }

    pub fn get_digest(&self) -> Result<SelfAddressingPrefix, Error> {
        Ok(SelfAddressing::Blake3_256.derive(&self.serialize()?))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum VcEventType {
    Iss(SimpleIssuance),
    Rev(SimpleRevocation),
    Bis(Issuance),
    Brv(Revocation),
}

/// Issuance under a backerless registry (`iss`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimpleIssuance {
    #[serde(rename = "ri")]
    pub registry_id: IdentifierPrefix,

    #[serde(rename = "dt")]
    pub issuance_date: DateTime<FixedOffset>,
}

/// Revocation under a backerless registry (`rev`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimpleRevocation {
    #[serde(rename = "ri")]
    pub registry_id: IdentifierPrefix,

    #[serde(rename = "p")]
    pub prev_event: SelfAddressingPrefix,

    #[serde(rename = "dt")]
    pub revocation_date: DateTime<FixedOffset>,
}

/// Backer-anchored issuance (`bis`). The `ra` seal points at the
/// management TEL event whose backer set governs this event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Issuance {
    #[serde(rename = "ii")]
    pub registry_id: IdentifierPrefix,

    #[serde(rename = "ra")]
    pub registry_anchor: EventSeal,

    #[serde(rename = "dt")]
    pub issuance_date: DateTime<FixedOffset>,
}

/// Backer-anchored revocation (`brv`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Revocation {
    #[serde(rename = "p")]
    pub prev_event: SelfAddressingPrefix,

    #[serde(rename = "ra")]
    pub registry_anchor: EventSeal,

    #[serde(rename = "dt")]
    pub revocation_date: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_issuance_roundtrip() -> Result<(), Error> {
        let raw = r#"{"v":"KERI10JSON0000aa_","i":"Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4","s":"0","t":"iss","ri":"ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A","dt":"2021-01-01T00:00:00+00:00"}"#;

        let event: VcTelEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.serialization_info, "KERI10JSON0000aa_".parse()?);
        assert_eq!(
            event.prefix,
            "Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4".parse().unwrap()
        );
        assert_eq!(event.sn, 0);
        assert!(matches!(event.event_type, VcEventType::Iss(_)));

        assert_eq!(serde_json::to_string(&event).unwrap(), raw);
        Ok(())
    }

    #[test]
    fn backer_revocation_deserialization() {
        let raw = r#"{"v":"KERI10JSON000105_","i":"Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4","s":"1","t":"brv","p":"EY2L3ycqK9645aEeQKP941xojSiuiHsw4Y6yTW-PmsBg","ra":{"i":"ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A","s":"2","d":"EN8l6yJC2PxribTN0xfri6bLz34Qvj-x3cNwcV3DvT2m"},"dt":"2021-01-01T00:00:00+00:00"}"#;
        let event: VcTelEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.sn, 1);
        match event.event_type {
            VcEventType::Brv(rev) => {
                assert_eq!(rev.registry_anchor.sn, 2);
                assert_eq!(
                    rev.registry_anchor.prefix,
                    "ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A".parse().unwrap()
                );
            }
            _ => panic!("wrong event type"),
        }
    }

    #[test]
    fn rejects_padded_sn() {
        let raw = r#"{"v":"KERI10JSON0000aa_","i":"Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4","s":"01","t":"iss","ri":"ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A","dt":"2021-01-01T00:00:00+00:00"}"#;
        assert!(serde_json::from_str::<VcTelEvent>(raw).is_err());

        let raw = r#"{"v":"KERI10JSON0000aa_","i":"Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4","s":"A","t":"iss","ri":"ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A","dt":"2021-01-01T00:00:00+00:00"}"#;
        assert!(serde_json::from_str::<VcTelEvent>(raw).is_err());
    }
}
