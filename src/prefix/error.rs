use base64::DecodeError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Incorrect prefix length: {0}")]
    IncorrectLengthError(String),

    #[error("Unknown derivation code: {0}")]
    UnknownCodeError(String),

    #[error("Base64 decoding error")]
    Base64DecodingError,

    #[error("Wrong signature type")]
    WrongSignatureTypeError,

    #[error("Wrong key type")]
    WrongKeyTypeError,
}

impl From<DecodeError> for Error {
    fn from(_: DecodeError) -> Self {
        Error::Base64DecodingError
    }
}
