//! Serde helpers for hex-coded numeric fields (`s`, `bt`). The wire form
//! is lowercase hex with no leading zeros.

use serde::{de, Deserialize, Deserializer, Serializer};

use crate::error::Error;

pub fn serialize<S>(sn: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{:x}", sn))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_hex(&s).map_err(de::Error::custom)
}

pub(crate) fn parse_hex(s: &str) -> Result<u64, Error> {
    if s.is_empty()
        || (s.len() > 1 && s.starts_with('0'))
        || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Err(Error::DeserializeError(format!(
            "Invalid hex number: {}",
            s
        )));
    }
    u64::from_str_radix(s, 16).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_hex() {
        assert_eq!(parse_hex("0").unwrap(), 0);
        assert_eq!(parse_hex("1a").unwrap(), 26);
        assert_eq!(parse_hex("ff").unwrap(), 255);

        // leading zeros
        assert!(parse_hex("01").is_err());
        // uppercase
        assert!(parse_hex("1A").is_err());
        // not hex at all
        assert!(parse_hex("").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("-1").is_err());
    }
}
