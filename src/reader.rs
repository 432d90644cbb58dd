//! Streaming decompression and parsing of spot archives.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::errors::WsprDataErr;
use crate::geo::{CacheStats, GridResolver};
use crate::spot::Spot;

/// An iterator over the spots in a gzip compressed archive.
///
/// Yields records with an id above the resume watermark, in file order,
/// with their coordinates resolved. Decompression and parsing happen a line
/// at a time; an archive is never held in memory whole. The first bad line
/// ends the stream with an error and nothing is yielded after it.
#[derive(Debug)]
pub struct SpotReader {
    lines: Lines<BufReader<GzDecoder<File>>>,
    start_id: i64,
    line_no: u64,
    resolver: GridResolver,
    failed: bool,
}

impl SpotReader {
    /// Open an archive for records with ids above `start_id`.
    pub fn open(path: &Path, start_id: i64) -> Result<Self, WsprDataErr> {
        let file = File::open(path)?;

        Ok(SpotReader {
            lines: BufReader::new(GzDecoder::new(file)).lines(),
            start_id,
            line_no: 0,
            resolver: GridResolver::new(),
            failed: false,
        })
    }

    /// Accounting from the grid resolver, for the end of run log.
    pub fn resolver_stats(&self) -> CacheStats {
        self.resolver.stats()
    }

    fn at_line(&self, err: WsprDataErr) -> WsprDataErr {
        match err {
            WsprDataErr::MalformedSpot(msg) => {
                WsprDataErr::MalformedSpot(format!("line {}: {}", self.line_no, msg))
            }
            other => other,
        }
    }
}

impl Iterator for SpotReader {
    type Item = Result<Spot, WsprDataErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            };
            self.line_no += 1;

            // The watermark check needs only the leading id, already
            // imported lines are skipped without full parsing.
            match Spot::leading_id(&line) {
                Ok(id) if id <= self.start_id => continue,
                Ok(_) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(self.at_line(err)));
                }
            }

            let spot = Spot::parse(&line, &mut self.resolver);
            if spot.is_err() {
                self.failed = true;
            }

            return Some(spot.map_err(|err| self.at_line(err)));
        }
    }
}
