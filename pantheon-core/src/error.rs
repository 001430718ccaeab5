use std::{error, fmt, io};

use crate::item::ContentKind;

#[derive(Debug)]
pub enum Error {
    ItemNotFound(String),
    UnknownFigure(String),
    UnknownKind(String),
    KindMismatch {
        expected: ContentKind,
        found: ContentKind,
    },
    UnknownCategory(String),
    InvalidImport(String),
    InvalidShare(String),
    StorageError(String),
    NetworkError(Box<dyn error::Error + Send>),
    JsonError(Box<dyn error::Error + Send>),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "Item not found: {id}"),
            Self::UnknownFigure(id) => write!(f, "Unknown figure: {id}"),
            Self::UnknownKind(kind) => write!(f, "Unknown content kind: {kind}"),
            Self::KindMismatch { expected, found } => {
                write!(f, "Cannot put {} into {}", found.slug(), expected.slug())
            }
            Self::UnknownCategory(cat) => write!(f, "Unknown category: {cat}"),
            Self::InvalidImport(reason) => write!(f, "Invalid import: {reason}"),
            Self::InvalidShare(reason) => write!(f, "Invalid share link: {reason}"),
            Self::StorageError(reason) => write!(f, "Storage failure: {reason}"),
            Self::NetworkError(err) => write!(f, "Failed to fetch: {err}"),
            Self::JsonError(err) => err.fmt(f),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::JsonError(Box::new(err))
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Error {
        Error::NetworkError(Box::new(err))
    }
}
