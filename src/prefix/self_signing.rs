use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::{from_text_to_bytes, Prefix};

#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub enum SelfSigningPrefix {
    Ed25519Sha512(Vec<u8>),
}

impl SelfSigningPrefix {
    pub fn signature(&self) -> &[u8] {
        match self {
            Self::Ed25519Sha512(sig) => sig,
        }
    }
}

impl FromStr for SelfSigningPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.get(..2) {
            Some("0B") => {
                if s.len() != 88 {
                    return Err(Error::IncorrectLengthError(s.into()));
                }
                Ok(Self::Ed25519Sha512(
                    from_text_to_bytes(s[2..].as_bytes())?[2..].to_vec(),
                ))
            }
            _ => Err(Error::UnknownCodeError(s.into())),
        }
    }
}

impl Prefix for SelfSigningPrefix {
    fn derivative(&self) -> Vec<u8> {
        match self {
            Self::Ed25519Sha512(sig) => sig.clone(),
        }
    }
    fn derivation_code(&self) -> String {
        match self {
            Self::Ed25519Sha512(_) => "0B".to_string(),
        }
    }
}

/// Serde compatible Serialize
impl Serialize for SelfSigningPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for SelfSigningPrefix {
    fn deserialize<D>(deserializer: D) -> Result<SelfSigningPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        SelfSigningPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[test]
fn serialization() -> Result<(), Error> {
    let ssp = SelfSigningPrefix::Ed25519Sha512(vec![0; 64]);
    assert_eq!(ssp.to_str(), ["0B".to_string(), "A".repeat(86)].join(""));
    assert_eq!(SelfSigningPrefix::from_str(&ssp.to_str())?, ssp);
    Ok(())
}
