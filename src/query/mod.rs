pub mod tel_state_notice;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    event_message::serialization_info::{SerializationFormats, SerializationInfo},
    prefix::IdentifierPrefix,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTag {
    #[serde(rename = "qry")]
    Qry,
}

/// Routed TEL query envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryEvent {
    #[serde(rename = "v")]
    pub serialization_info: SerializationInfo,

    #[serde(rename = "t")]
    pub tag: QueryTag,

    #[serde(rename = "dt")]
    pub timestamp: DateTime<FixedOffset>,

    #[serde(rename = "r")]
    pub route: String,

    #[serde(rename = "rr")]
    pub reply_route: String,

    #[serde(rename = "q")]
    pub args: QueryArgs,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryArgs {
    #[serde(rename = "i")]
    pub vc_id: IdentifierPrefix,

    #[serde(rename = "ri")]
    pub registry_id: IdentifierPrefix,

    /// Datetime of interest.
    #[serde(rename = "dt", skip_serializing_if = "Option::is_none")]
    pub after_exact: Option<DateTime<FixedOffset>>,

    /// Lower bound on datetime.
    #[serde(rename = "dta", skip_serializing_if = "Option::is_none")]
    pub after: Option<DateTime<FixedOffset>>,

    /// Upper bound on datetime.
    #[serde(rename = "dtb", skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<FixedOffset>>,
}

impl QueryEvent {
    pub fn new(
        route: &str,
        reply_route: &str,
        args: QueryArgs,
        timestamp: DateTime<FixedOffset>,
        format: SerializationFormats,
    ) -> Result<Self, Error> {
        let mut qry = Self {
            serialization_info: SerializationInfo::new(format, 0),
            tag: QueryTag::Qry,
            timestamp,
            route: route.to_string(),
            reply_route: reply_route.to_string(),
            args,
        };
        qry.serialization_info = SerializationInfo::new(format, qry.serialize()?.len());
        Ok(qry)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        self.serialization_info.kind.encode(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_roundtrip() -> Result<(), Error> {
        let args = QueryArgs {
            vc_id: "Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4".parse().unwrap(),
            registry_id: "ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A".parse().unwrap(),
            after_exact: None,
            after: Some("2021-01-01T00:00:00+00:00".parse().unwrap()),
            before: Some("2022-01-01T00:00:00+00:00".parse().unwrap()),
        };
        let qry = QueryEvent::new(
            "tels",
            "",
            args,
            "2021-06-01T00:00:00+00:00".parse().unwrap(),
            SerializationFormats::JSON,
        )?;
        let raw = qry.serialize()?;
        assert_eq!(raw.len(), qry.serialization_info.size);

        let parsed: QueryEvent = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed, qry);
        // bounds keep their own values
        assert_eq!(parsed.args.after, qry.args.after);
        assert_eq!(parsed.args.before, qry.args.before);
        assert_eq!(parsed.args.after_exact, None);
        Ok(())
    }
}
