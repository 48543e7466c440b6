use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::{b64_to_num, from_text_to_bytes, num_to_b64, Prefix, SelfSigningPrefix};

/// An indexed signature, where the index is an offset into the backer
/// list of the event the signature applies to.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AttachedSignaturePrefix {
    pub index: u16,
    pub signature: SelfSigningPrefix,
}

impl AttachedSignaturePrefix {
    pub fn new(signature: SelfSigningPrefix, index: u16) -> Self {
        Self { index, signature }
    }
}

impl FromStr for AttachedSignaturePrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.get(..1) {
            Some("A") => {
                if s.len() != 88 {
                    return Err(Error::IncorrectLengthError(s.into()));
                }
                let index = s
                    .chars()
                    .nth(1)
                    .map(b64_to_num)
                    .transpose()?
                    .ok_or_else(|| Error::IncorrectLengthError(s.into()))?;
                let sig = from_text_to_bytes(s[2..].as_bytes())?[2..].to_vec();
                Ok(Self::new(SelfSigningPrefix::Ed25519Sha512(sig), index))
            }
            _ => Err(Error::UnknownCodeError(s.into())),
        }
    }
}

impl Prefix for AttachedSignaturePrefix {
    fn derivative(&self) -> Vec<u8> {
        self.signature.derivative()
    }
    fn derivation_code(&self) -> String {
        ["A".to_string(), num_to_b64(self.index).to_string()].join("")
    }
}

/// Serde compatible Serialize
impl Serialize for AttachedSignaturePrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for AttachedSignaturePrefix {
    fn deserialize<D>(deserializer: D) -> Result<AttachedSignaturePrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        AttachedSignaturePrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize() -> Result<(), Error> {
        let attached_ed_1 = ["AB".to_string(), "A".repeat(86)].join("");

        let pref = AttachedSignaturePrefix::from_str(&attached_ed_1)?;
        assert_eq!(1, pref.index);
        assert_eq!(vec![0u8; 64], pref.signature.derivative());
        Ok(())
    }

    #[test]
    fn serialize() {
        let pref =
            AttachedSignaturePrefix::new(SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]), 2);
        assert_eq!(88, pref.to_str().len());
        assert_eq!(["AC".to_string(), "A".repeat(86)].join(""), pref.to_str());
    }
}
