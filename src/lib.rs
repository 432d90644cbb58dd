#![deny(missing_docs)]
//! Package to manage a local archive of WSPR propagation spot reports.
//!
//! The crate synchronizes the monthly spot archives published on
//! [wsprnet.org](http://wsprnet.org/archive/) into a local sqlite database.
//! A run downloads the archive for its target month when the remote copy has
//! grown past the local one. Records then stream into batched transactions,
//! with transmitter and receiver coordinates derived from the grid locators
//! along the way. The highest spot id already stored is the resume
//! watermark, so interrupted or repeated runs import every record exactly
//! once.

//
// Public API
//
pub use crate::config::Config;
pub use crate::download::{download_archive, ArchiveMonth, ARCHIVE_URL};
pub use crate::errors::WsprDataErr;
pub use crate::geo::{grid_to_coords, CacheStats, Coords, GridResolver};
pub use crate::ingest::{run_ingest, IngestOptions, IngestSummary, SPOTS_PER_BATCH};
pub use crate::reader::SpotReader;
pub use crate::spot::Spot;
pub use crate::store::SpotStore;

//
// Implementation only
//
mod config;
mod download;
mod errors;
mod geo;
mod ingest;
mod reader;
mod spot;
mod store;
