pub mod serial_number;
pub mod serialization_info;

use crate::error::Error;
use serialization_info::SerializationInfo;

/// Extracts the version string from raw event bytes. The version field is
/// the first field of every serialization, so it sits within the leading
/// bytes regardless of format.
pub fn version(raw: &[u8]) -> Result<SerializationInfo, Error> {
    let scan = &raw[..raw.len().min(32)];
    let start = scan
        .windows(4)
        .position(|w| w == b"KERI")
        .ok_or_else(|| Error::DeserializeError("Missing version string".into()))?;
    let vs = raw
        .get(start..start + 17)
        .ok_or_else(|| Error::DeserializeError("Truncated version string".into()))?;
    std::str::from_utf8(vs)
        .map_err(|_| Error::DeserializeError("Invalid version string".into()))?
        .parse()
}

#[cfg(test)]
mod tests {
    use super::serialization_info::SerializationFormats;
    use super::*;

    #[test]
    fn version_from_raw() -> Result<(), Error> {
        let raw = br#"{"v":"KERI10JSON0000ad_","i":"EjD_sFljMHXJCC3rEFL93MwHNGguKdC11mcMuQnZitcs","s":"0"}"#;
        let info = version(raw)?;
        assert_eq!(info.kind, SerializationFormats::JSON);
        assert_eq!(info.size, 0xad);

        assert!(version(b"{}").is_err());
        Ok(())
    }
}
