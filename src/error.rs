use core::num::ParseIntError;

use base64::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error during serialization: {0}")]
    SerializationError(String),

    #[error("JSON serialization error")]
    JsonDeserError,

    #[error("CBOR serialization error")]
    CborDeserError,

    #[error("MessagePack serialization error")]
    MsgPackDeserError,

    #[error("Error parsing numerical value")]
    ParseIntError,

    #[error("Error while applying event: {0}")]
    SemanticError(String),

    #[error("Error while applying event: out of order event")]
    EventOutOfOrderError,

    #[error("Error while applying event: missing anchoring event")]
    MissingAnchorError,

    #[error("Not enough backer signatures to satisfy threshold")]
    NotEnoughBackerSignaturesError,

    #[error("Error while applying event: likely duplicitous event")]
    LikelyDuplicitousError,

    #[error("Missing database entry: {0}")]
    MissingEntryError(String),

    #[error("Event not yet in database")]
    MissingEvent,

    #[error("Duplicate event")]
    EventDuplicateError,

    #[error("Deserialize error: {0}")]
    DeserializeError(String),

    #[error("Base64 decoding error")]
    Base64DecodingError,

    #[error("Improper prefix type")]
    ImproperPrefixType,

    #[error("ED25519Dalek signature error")]
    Ed25519DalekSignatureError,

    #[error("Sled error")]
    SledError,

    #[error(transparent)]
    DbError(#[from] crate::database::DbError),

    #[error(transparent)]
    PrefixModuleError(#[from] crate::prefix::error::Error),
}

impl From<ParseIntError> for Error {
    fn from(_: ParseIntError) -> Self {
        Error::ParseIntError
    }
}

impl From<DecodeError> for Error {
    fn from(_: DecodeError) -> Self {
        Error::Base64DecodingError
    }
}

impl From<ed25519_dalek::SignatureError> for Error {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        Error::Ed25519DalekSignatureError
    }
}

impl From<sled::Error> for Error {
    fn from(_: sled::Error) -> Self {
        Error::SledError
    }
}
