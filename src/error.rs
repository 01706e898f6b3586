use thiserror::Error;

use crate::service::template::PlaceholderKind;

pub type Result<T> = std::result::Result<T, ScreenError>;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unknown video service: {0}")]
    UnknownService(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Malformed state payload. The message is discarded whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated payload: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("VarInt is longer than 5 bytes")]
    VarIntTooLong,

    #[error("invalid string length {0}")]
    InvalidStringLength(i32),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("unknown facing value {0:?}")]
    UnknownFacing(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no value supplied for {0} placeholder")]
    MissingValue(PlaceholderKind),

    #[error("placeholder %{token} is not allowed in a {role} template")]
    UnexpectedPlaceholder { role: &'static str, token: char },

    #[error("volume template mixes percent and fraction placeholders")]
    MixedVolumeEncodings,
}
