use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::{from_text_to_bytes, verify, Prefix, SelfSigningPrefix};
use crate::keys::PublicKey;

/// Basic prefixes are public-key-derived identifiers. Backers are
/// non-transferable, so their keys never rotate.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum BasicPrefix {
    Ed25519NT(PublicKey),
    Ed25519(PublicKey),
}

impl BasicPrefix {
    pub fn verify(&self, data: &[u8], signature: &SelfSigningPrefix) -> Result<bool, Error> {
        verify(data, self, signature)
    }

    /// Non transferable means that the public key is always the current public key.
    pub fn is_transferable(&self) -> bool {
        !matches!(self, BasicPrefix::Ed25519NT(_))
    }
}

impl FromStr for BasicPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.get(..1).ok_or_else(|| Error::UnknownCodeError(s.into()))?;
        if !matches!(code, "B" | "D") {
            return Err(Error::UnknownCodeError(code.into()));
        }
        if s.len() != 44 {
            return Err(Error::IncorrectLengthError(s.into()));
        }

        let k_vec = from_text_to_bytes(s[1..].as_bytes())?[1..].to_vec();
        Ok(match code {
            "B" => Self::Ed25519NT(PublicKey::new(k_vec)),
            _ => Self::Ed25519(PublicKey::new(k_vec)),
        })
    }
}

impl Prefix for BasicPrefix {
    fn derivative(&self) -> Vec<u8> {
        match self {
            BasicPrefix::Ed25519NT(pk) => pk.key(),
            BasicPrefix::Ed25519(pk) => pk.key(),
        }
    }
    fn derivation_code(&self) -> String {
        match self {
            BasicPrefix::Ed25519NT(_) => "B",
            BasicPrefix::Ed25519(_) => "D",
        }
        .to_string()
    }
}

/// Serde compatible Serialize
impl Serialize for BasicPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for BasicPrefix {
    fn deserialize<D>(deserializer: D) -> Result<BasicPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        BasicPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_deserialize() {
        use ed25519_dalek::Keypair;
        use rand::rngs::OsRng;

        let kp = Keypair::generate(&mut OsRng);

        let bp = BasicPrefix::Ed25519(PublicKey::new(kp.public.to_bytes().to_vec()));

        let serialized = serde_json::to_string(&bp);
        assert!(serialized.is_ok());

        let deserialized = serde_json::from_str(&serialized.unwrap());

        assert!(deserialized.is_ok());
        assert_eq!(bp, deserialized.unwrap());
    }

    #[test]
    fn to_from_string() {
        use ed25519_dalek::{Keypair, Signer};
        use rand::rngs::OsRng;

        let kp = Keypair::generate(&mut OsRng);

        let message = b"hello there";
        let sig = SelfSigningPrefix::Ed25519Sha512(kp.sign(message).to_bytes().to_vec());

        let bp = BasicPrefix::Ed25519(PublicKey::new(kp.public.to_bytes().to_vec()));

        assert!(bp.verify(message, &sig).unwrap());

        let string = bp.to_str();

        let from_str = BasicPrefix::from_str(&string);

        assert!(from_str.is_ok());
        let deser = from_str.unwrap();
        assert_eq!(bp, deser);

        assert!(deser.verify(message, &sig).unwrap());
    }
}
