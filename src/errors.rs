//! Module for errors.
use std::{error::Error, fmt::Display};

/// Error from the spot archive interface.
#[derive(Debug)]
pub enum WsprDataErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// Database error
    Database(::rusqlite::Error),
    /// Error forwarded from the http client
    Http(::reqwest::Error),

    // My own errors from this crate
    /// A source record that does not match the archive line format
    MalformedSpot(String),
    /// A grid locator with no coordinate mapping
    UnknownGrid(String),
    /// A month number outside 1 through 12
    InvalidMonth(u32),
    /// A required configuration value that is not set
    MissingConfig(&'static str),
}

impl Display for WsprDataErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::WsprDataErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            Database(err) => write!(f, "database error: {}", err),
            Http(err) => write!(f, "http error: {}", err),

            MalformedSpot(msg) => write!(f, "malformed spot record: {}", msg),
            UnknownGrid(grid) => write!(f, "unknown grid locator: {}", grid),
            InvalidMonth(month) => write!(f, "invalid month: {}", month),
            MissingConfig(key) => write!(f, "missing configuration: {} is not set", key),
        }
    }
}

impl Error for WsprDataErr {}

impl From<::std::io::Error> for WsprDataErr {
    fn from(err: ::std::io::Error) -> WsprDataErr {
        WsprDataErr::IO(err)
    }
}

impl From<::rusqlite::Error> for WsprDataErr {
    fn from(err: ::rusqlite::Error) -> WsprDataErr {
        WsprDataErr::Database(err)
    }
}

impl From<::reqwest::Error> for WsprDataErr {
    fn from(err: ::reqwest::Error) -> WsprDataErr {
        WsprDataErr::Http(err)
    }
}
