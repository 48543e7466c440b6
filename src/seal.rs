use serde::{Deserialize, Serialize};

use crate::event_message::serial_number;
use crate::prefix::{IdentifierPrefix, SelfAddressingPrefix};

/// A commitment to an event of another log: identifier, sequence number
/// and digest of the sealed event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EventSeal {
    #[serde(rename = "i")]
    pub prefix: IdentifierPrefix,

    #[serde(rename = "s", with = "serial_number")]
    pub sn: u64,

    #[serde(rename = "d")]
    pub event_digest: SelfAddressingPrefix,
}

/// A digest-only seal, as it appears in anchoring event seal lists next
/// to full event seals.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DigestSeal {
    #[serde(rename = "d")]
    pub dig: SelfAddressingPrefix,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Seal {
    Event(EventSeal),
    Digest(DigestSeal),
}

/// Location of the controlling KEL event that anchors a TEL event: its
/// sequence number and digest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventSourceSeal {
    #[serde(rename = "s", with = "serial_number")]
    pub sn: u64,

    #[serde(rename = "d")]
    pub digest: SelfAddressingPrefix,
}

impl EventSourceSeal {
    pub fn new(sn: u64, digest: SelfAddressingPrefix) -> Self {
        Self { sn, digest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_deserialization() {
        let seal_str = r#"{"i":"EBfxc4RiVY6saIFmUfEtETs1FcqmktZW88UkbnOg0Qen","s":"1","d":"EN8l6yJC2PxribTN0xfri6bLz34Qvj-x3cNwcV3DvT2m"}"#;
        let seal: Seal = serde_json::from_str(seal_str).unwrap();
        assert!(matches!(seal, Seal::Event(_)));
        assert_eq!(serde_json::to_string(&seal).unwrap(), seal_str);

        let seal_str = r#"{"d":"EBfxc4RiVY6saIFmUfEtETs1FcqmktZW88UkbnOg0Qen"}"#;
        let seal: Seal = serde_json::from_str(seal_str).unwrap();
        assert!(matches!(seal, Seal::Digest(_)));
        assert_eq!(serde_json::to_string(&seal).unwrap(), seal_str);
    }

    #[test]
    fn source_seal_roundtrip() {
        let seal = EventSourceSeal {
            sn: 11,
            digest: "EN8l6yJC2PxribTN0xfri6bLz34Qvj-x3cNwcV3DvT2m".parse().unwrap(),
        };
        let serialized = serde_json::to_string(&seal).unwrap();
        assert_eq!(serialized, r#"{"s":"b","d":"EN8l6yJC2PxribTN0xfri6bLz34Qvj-x3cNwcV3DvT2m"}"#);
        assert_eq!(serde_json::from_str::<EventSourceSeal>(&serialized).unwrap(), seal);
    }
}
