use core::str::FromStr;
use std::fmt::Display;

use base64::URL_SAFE;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use self::error::Error;

pub mod attached_signature;
pub mod basic;
pub mod error;
pub mod self_addressing;
pub mod self_signing;

pub use attached_signature::AttachedSignaturePrefix;
pub use basic::BasicPrefix;
pub use self_addressing::{SelfAddressing, SelfAddressingPrefix};
pub use self_signing::SelfSigningPrefix;

use crate::keys::PublicKey;

pub(crate) fn from_text_to_bytes(text: &[u8]) -> Result<Vec<u8>, Error> {
    let lead_size = (4 - (text.len() % 4)) % 4;
    let full_derivative = ["A".repeat(lead_size).as_bytes(), text].concat();

    Ok(base64::decode_config(full_derivative, URL_SAFE)?)
}

pub(crate) fn from_bytes_to_text(bytes: &[u8]) -> String {
    let lead_size = (3 - (bytes.len() % 3)) % 3;
    let full_derivative: Vec<_> = std::iter::repeat(0)
        .take(lead_size)
        .chain(bytes.to_vec().into_iter())
        .collect();

    base64::encode_config(full_derivative, URL_SAFE)
}

const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub(crate) fn num_to_b64(num: u16) -> char {
    B64[(num % 64) as usize] as char
}

pub(crate) fn b64_to_num(c: char) -> Result<u16, Error> {
    B64.iter()
        .position(|b| *b as char == c)
        .map(|n| n as u16)
        .ok_or_else(|| Error::UnknownCodeError(c.to_string()))
}

pub trait Prefix: FromStr<Err = Error> {
    fn derivative(&self) -> Vec<u8>;
    fn derivation_code(&self) -> String;
    fn to_str(&self) -> String {
        match self.derivative().len() {
            // empty data cannot be prefixed!
            0 => "".to_string(),
            _ => {
                let dc = self.derivation_code();
                let lead_bytes = if dc.len() % 4 != 0 { dc.len() } else { 0 };
                // replace lead bytes with code
                let derivative_text =
                    from_bytes_to_text(&self.derivative())[lead_bytes..].to_string();
                [dc, derivative_text].join("")
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub enum IdentifierPrefix {
    Basic(BasicPrefix),
    SelfAddressing(SelfAddressingPrefix),
    SelfSigning(SelfSigningPrefix),
}

impl Display for IdentifierPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for IdentifierPrefix {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match BasicPrefix::from_str(s) {
            Ok(bp) => Ok(Self::Basic(bp)),
            Err(_) => match SelfAddressingPrefix::from_str(s) {
                Ok(sa) => Ok(Self::SelfAddressing(sa)),
                Err(_) => Ok(Self::SelfSigning(SelfSigningPrefix::from_str(s)?)),
            },
        }
    }
}

impl Prefix for IdentifierPrefix {
    fn derivative(&self) -> Vec<u8> {
        match self {
            Self::Basic(bp) => bp.derivative(),
            Self::SelfAddressing(sap) => sap.derivative(),
            Self::SelfSigning(ssp) => ssp.derivative(),
        }
    }
    fn derivation_code(&self) -> String {
        match self {
            Self::Basic(bp) => bp.derivation_code(),
            Self::SelfAddressing(sap) => sap.derivation_code(),
            Self::SelfSigning(ssp) => ssp.derivation_code(),
        }
    }
}

/// Serde compatible Serialize
impl Serialize for IdentifierPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_str())
    }
}

/// Serde compatible Deserialize
impl<'de> Deserialize<'de> for IdentifierPrefix {
    fn deserialize<D>(deserializer: D) -> Result<IdentifierPrefix, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        IdentifierPrefix::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for IdentifierPrefix {
    fn default() -> Self {
        IdentifierPrefix::SelfAddressing(SelfAddressingPrefix::default())
    }
}

/// Verify
///
/// Uses a public key to verify a signature against some data, with
/// the key and signature represented by Basic and Self-Signing Prefixes
pub fn verify(
    data: &[u8],
    key: &BasicPrefix,
    signature: &SelfSigningPrefix,
) -> Result<bool, Error> {
    match key {
        BasicPrefix::Ed25519(pk) | BasicPrefix::Ed25519NT(pk) => match signature {
            SelfSigningPrefix::Ed25519Sha512(signature) => Ok(pk.verify_ed(data, signature)),
        },
    }
}

/// Derive a basic prefix for a raw ed25519 public key.
pub fn basic_prefix(key: PublicKey, transferable: bool) -> BasicPrefix {
    if transferable {
        BasicPrefix::Ed25519(key)
    } else {
        BasicPrefix::Ed25519NT(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_deserialize() -> Result<(), Error> {
        let pref: IdentifierPrefix = "BAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".parse()?;

        assert_eq!(pref.derivation_code(), "B");
        assert_eq!(pref.derivative().len(), 32);
        assert_eq!(pref.derivative(), vec![0u8; 32]);

        Ok(())
    }

    #[test]
    fn length() {
        // correct
        assert!(IdentifierPrefix::from_str("BAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").is_ok());
        assert!(IdentifierPrefix::from_str("EAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").is_ok());

        // too short
        assert!(IdentifierPrefix::from_str("BAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").is_err());

        // too long
        assert!(
            IdentifierPrefix::from_str("BAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").is_err()
        );

        // not a known code
        assert!(IdentifierPrefix::from_str("ZAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").is_err());

        // not base 64 URL
        assert!(
            IdentifierPrefix::from_str("BAAAAAAAAAAAAAAAAAAA/AAAAAAAAAAAAAAAAAAAAAAA").is_err()
        );
    }

    #[test]
    fn simple_serialize() -> Result<(), Error> {
        let pref = BasicPrefix::Ed25519NT(PublicKey::new(vec![0; 32]));

        assert_eq!(
            pref.to_str(),
            "BAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
        );

        Ok(())
    }

    #[test]
    fn identifier_encoding() {
        let pub_key = vec![
            0x69, 0x4e, 0x89, 0x47, 0x69, 0xe6, 0xc3, 0x26, 0x7e, 0x8b, 0x47, 0x7c, 0x25, 0x90,
            0x28, 0x4c, 0xd6, 0x47, 0xdd, 0x42, 0xef, 0x60, 0x07, 0xd2, 0x54, 0xfc, 0xe1, 0xcd,
            0x2e, 0x9b, 0xe4, 0x23,
        ];
        let bp = BasicPrefix::Ed25519NT(PublicKey::new(pub_key));
        assert_eq!(bp.to_str(), "BGlOiUdp5sMmfotHfCWQKEzWR91C72AH0lT84c0um-Qj");

        let to_digest = "abcdefghijklmnopqrstuvwxyz0123456789";
        let dig = SelfAddressing::Blake3_256.derive(to_digest.as_bytes());
        assert!(dig.verify_binding(to_digest.as_bytes()));
        assert_eq!(dig.to_str(), "ELC5L3iBVD77d_MYbYGGCUQgqQBju1o4x1Ud-z2sL-ux");

        let to_digest = "BDjXHlcskwOzNj8rYbV8IQ6ox2TW_KkbA1K3-n0EU0un";
        let dig = SelfAddressing::Blake3_256.derive(to_digest.as_bytes());
        assert_eq!(dig.to_str(), "EP9XvFnpQP4vnaTNDNAMU2T7nxDPe1EZLUaiABcLRfS4");
    }

    #[test]
    fn round_trip() -> Result<(), Error> {
        let dig = SelfAddressing::Blake3_256.derive(b"some inception data");
        let pref = IdentifierPrefix::SelfAddressing(dig);
        let parsed: IdentifierPrefix = pref.to_str().parse()?;
        assert_eq!(pref, parsed);

        Ok(())
    }
}
