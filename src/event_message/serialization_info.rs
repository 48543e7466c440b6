use core::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializationFormats {
    JSON,
    MGPK,
    CBOR,
}

impl SerializationFormats {
    pub fn encode<T: Serialize>(&self, message: &T) -> Result<Vec<u8>, Error> {
        match self {
            Self::JSON => serde_json::to_vec(message).map_err(|_| Error::JsonDeserError),
            Self::CBOR => serde_cbor::to_vec(message).map_err(|_| Error::CborDeserError),
            Self::MGPK => rmp_serde::to_vec_named(message).map_err(|_| Error::MsgPackDeserError),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, Error> {
        match self {
            Self::JSON => serde_json::from_slice(data).map_err(|_| Error::JsonDeserError),
            Self::CBOR => serde_cbor::from_slice(data).map_err(|_| Error::CborDeserError),
            Self::MGPK => rmp_serde::from_read_ref(data).map_err(|_| Error::MsgPackDeserError),
        }
    }

    pub fn to_str(&self) -> String {
        match self {
            Self::JSON => "JSON",
            Self::MGPK => "MGPK",
            Self::CBOR => "CBOR",
        }
        .to_string()
    }
}

impl FromStr for SerializationFormats {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(Self::JSON),
            "MGPK" => Ok(Self::MGPK),
            "CBOR" => Ok(Self::CBOR),
            _ => Err(Error::DeserializeError(format!(
                "Unknown serialization format: {}",
                s
            ))),
        }
    }
}

/// Serialization Information
///
/// Encodes the protocol version, serialization format and size of an
/// event message, e.g. "KERI10JSON0000ad_".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializationInfo {
    pub major_version: u8,
    pub minor_version: u8,
    pub size: usize,
    pub kind: SerializationFormats,
}

impl SerializationInfo {
    pub fn new(kind: SerializationFormats, size: usize) -> Self {
        Self {
            major_version: 1,
            minor_version: 0,
            size,
            kind,
        }
    }

    pub fn to_str(&self) -> String {
        format!(
            "KERI{:x}{:x}{}{:06x}_",
            self.major_version,
            self.minor_version,
            self.kind.to_str(),
            self.size
        )
    }
}

impl FromStr for SerializationInfo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 17 || !s.is_ascii() || &s[..4] != "KERI" || &s[16..] != "_" {
            return Err(Error::DeserializeError(format!(
                "Invalid version string: {}",
                s
            )));
        }
        Ok(Self {
            major_version: u8::from_str_radix(&s[4..5], 16)?,
            minor_version: u8::from_str_radix(&s[5..6], 16)?,
            kind: s[6..10].parse()?,
            size: usize::from_str_radix(&s[10..16], 16)?,
        })
    }
}

impl Default for SerializationInfo {
    fn default() -> Self {
        Self::new(SerializationFormats::JSON, 0)
    }
}

/// Serde compatible Serialize
impl Serialize for SerializationInfo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for SerializationInfo {
    fn deserialize<D>(deserializer: D) -> Result<SerializationInfo, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        SerializationInfo::from_str(&s).map_err(serde::de::Error::custom)
    }
}
