use core::str::FromStr;
use std::fmt::Display;

use blake2::digest::{Update, VariableOutput};
use blake2::VarBlake2b;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use super::error::Error;
use super::{from_text_to_bytes, Prefix};

/// Self Addressing Derivations
///
/// Self-addressing is a digest of the data an identifier commits to.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub enum SelfAddressing {
    Blake3_256,
    Blake2B256(Vec<u8>),
    SHA3_256,
    SHA2_256,
}

impl SelfAddressing {
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Blake3_256 => blake3::hash(data).as_bytes().to_vec(),
            Self::Blake2B256(key) => {
                let mut hasher = VarBlake2b::new_keyed(key, 32);
                hasher.update(data);
                hasher.finalize_boxed().to_vec()
            }
            Self::SHA3_256 => {
                let mut h = Sha3_256::new();
                sha3::Digest::update(&mut h, data);
                sha3::Digest::finalize(h).to_vec()
            }
            Self::SHA2_256 => {
                let mut h = Sha256::new();
                Digest::update(&mut h, data);
                h.finalize().to_vec()
            }
        }
    }

    pub fn derive(&self, data: &[u8]) -> SelfAddressingPrefix {
        SelfAddressingPrefix::new(self.to_owned(), self.digest(data))
    }

    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::Blake3_256 => "E",
            Self::Blake2B256(_) => "F",
            Self::SHA3_256 => "H",
            Self::SHA2_256 => "I",
        }
    }
}

impl Default for SelfAddressing {
    fn default() -> Self {
        Self::Blake3_256
    }
}

impl FromStr for SelfAddressing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E" => Ok(Self::Blake3_256),
            "F" => Ok(Self::Blake2B256(vec![])),
            "H" => Ok(Self::SHA3_256),
            "I" => Ok(Self::SHA2_256),
            _ => Err(Error::UnknownCodeError(s.into())),
        }
    }
}

/// A digest coupled with the derivation that produced it.
#[derive(Debug, PartialEq, Clone, Hash, Eq, Default)]
pub struct SelfAddressingPrefix {
    pub derivation: SelfAddressing,
    pub digest: Vec<u8>,
}

impl SelfAddressingPrefix {
    pub fn new(derivation: SelfAddressing, digest: Vec<u8>) -> Self {
        Self { derivation, digest }
    }

    /// Checks that this digest was derived from the given data.
    pub fn verify_binding(&self, sed: &[u8]) -> bool {
        self.derivation.digest(sed) == self.digest
    }
}

impl FromStr for SelfAddressingPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: SelfAddressing = s.get(..1).ok_or_else(|| Error::UnknownCodeError(s.into()))?.parse()?;

        if s.len() != 44 {
            return Err(Error::IncorrectLengthError(s.into()));
        }

        let digest = from_text_to_bytes(s[1..].as_bytes())?[1..].to_vec();
        Ok(Self::new(code, digest))
    }
}

impl Prefix for SelfAddressingPrefix {
    fn derivative(&self) -> Vec<u8> {
        self.digest.clone()
    }
    fn derivation_code(&self) -> String {
        self.derivation.code().to_string()
    }
}

impl Display for SelfAddressingPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Serde compatible Serialize
impl Serialize for SelfAddressingPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for SelfAddressingPrefix {
    fn deserialize<D>(deserializer: D) -> Result<SelfAddressingPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        SelfAddressingPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_roundtrip() -> Result<(), Error> {
        for derivation in [
            SelfAddressing::Blake3_256,
            SelfAddressing::SHA3_256,
            SelfAddressing::SHA2_256,
        ]
        .iter()
        {
            let prefix = derivation.derive(b"data to digest");
            assert_eq!(prefix.to_str().len(), 44);
            let parsed: SelfAddressingPrefix = prefix.to_str().parse()?;
            assert_eq!(prefix, parsed);
            assert!(parsed.verify_binding(b"data to digest"));
            assert!(!parsed.verify_binding(b"other data"));
        }
        Ok(())
    }
}
