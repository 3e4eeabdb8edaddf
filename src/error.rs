use std::fmt;

use crate::identify::IdentifyError;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Export was requested without a record or without an image.
    MissingInput(&'static str),
    /// The source image could not be decoded or measured.
    ImageDecode(String),
    InvalidRecord(String),
    Config(String),
    Font(String),
    History(String),
    Identification(IdentifyError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::MissingInput(what) => write!(f, "nothing to export: no {what} available"),
            Error::ImageDecode(msg) => write!(f, "image decode failed: {msg}"),
            Error::InvalidRecord(msg) => write!(f, "invalid attribute record: {msg}"),
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Error::Font(msg) => write!(f, "font error: {msg}"),
            Error::History(msg) => write!(f, "history store error: {msg}"),
            Error::Identification(e) => write!(f, "identification failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Identification(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
