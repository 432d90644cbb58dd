//! Maidenhead grid locators and their geographic coordinates.
//!
//! Spot records carry 4 or 6 character grid locators instead of coordinates.
//! The same few thousand grids recur millions of times across an archive, so
//! the resolver memoizes conversions for the life of a run and reports its
//! cache accounting at the end.

use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::errors::WsprDataErr;

/// The center of a grid cell in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    /// Degrees north of the equator, negative south.
    pub lat: f64,
    /// Degrees east of the prime meridian, negative west.
    pub lon: f64,
}

/// Convert a Maidenhead grid locator to the center of its cell.
///
/// Accepts 4 character (field and square) and 6 character (plus subsquare)
/// locators, upper or lower case. Returns `None` for any other length or for
/// characters outside the field, square, or subsquare ranges.
pub fn grid_to_coords(grid: &str) -> Option<Coords> {
    let grid = grid.to_uppercase();
    let chars = grid.as_bytes();

    if chars.len() != 4 && chars.len() != 6 {
        return None;
    }

    let field = |c: u8| match c {
        b'A'..=b'R' => Some(f64::from(c - b'A')),
        _ => None,
    };
    let square = |c: u8| match c {
        b'0'..=b'9' => Some(f64::from(c - b'0')),
        _ => None,
    };
    let subsquare = |c: u8| match c {
        b'A'..=b'X' => Some(f64::from(c - b'A')),
        _ => None,
    };

    // Fields span 20 by 10 degrees, squares 2 by 1 within them.
    let mut lon = -180.0 + field(chars[0])? * 20.0 + square(chars[2])? * 2.0;
    let mut lat = -90.0 + field(chars[1])? * 10.0 + square(chars[3])?;

    if chars.len() == 6 {
        // Subsquares divide a square 24 ways in each direction; offset by
        // half a subsquare to land on the center.
        lon += subsquare(chars[4])? * 2.0 / 24.0 + 1.0 / 24.0;
        lat += subsquare(chars[5])? / 24.0 + 1.0 / 48.0;
    } else {
        lon += 1.0;
        lat += 0.5;
    }

    Some(Coords { lat, lon })
}

/// Cumulative cache accounting for a [`GridResolver`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the conversion.
    pub misses: u64,
    /// Distinct grids cached so far.
    pub entries: usize,
}

impl Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "grid cache: {} hits, {} misses, {} entries",
            self.hits, self.misses, self.entries
        )
    }
}

/// A memoizing wrapper around [`grid_to_coords`].
///
/// The cache is unbounded and never invalidated, grid geometry being what it
/// is. One resolver lives for one run.
#[derive(Debug, Default)]
pub struct GridResolver {
    cache: HashMap<String, Coords>,
    hits: u64,
    misses: u64,
}

impl GridResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a grid locator, consulting the cache first.
    pub fn resolve(&mut self, grid: &str) -> Result<Coords, WsprDataErr> {
        if let Some(coords) = self.cache.get(grid) {
            self.hits += 1;
            return Ok(*coords);
        }

        let coords =
            grid_to_coords(grid).ok_or_else(|| WsprDataErr::UnknownGrid(grid.to_owned()))?;
        self.misses += 1;
        self.cache.insert(grid.to_owned(), coords);

        Ok(coords)
    }

    /// The accounting accumulated so far.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "{} is not close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn four_character_grids_map_to_square_centers() {
        let coords = grid_to_coords("FN42").expect("valid grid");
        assert_close(coords.lat, 42.5);
        assert_close(coords.lon, -71.0);

        let coords = grid_to_coords("CM87").expect("valid grid");
        assert_close(coords.lat, 37.5);
        assert_close(coords.lon, -123.0);

        // The extremes of the grid.
        let coords = grid_to_coords("AA00").expect("valid grid");
        assert_close(coords.lat, -89.5);
        assert_close(coords.lon, -179.0);

        let coords = grid_to_coords("RR99").expect("valid grid");
        assert_close(coords.lat, 89.5);
        assert_close(coords.lon, 179.0);
    }

    #[test]
    fn six_character_grids_map_to_subsquare_centers() {
        let coords = grid_to_coords("FN42AB").expect("valid grid");
        assert_close(coords.lat, 42.0 + 1.0 / 24.0 + 1.0 / 48.0);
        assert_close(coords.lon, -72.0 + 1.0 / 24.0);

        // The last subsquare of a square ends flush with its edge.
        let coords = grid_to_coords("FN42XX").expect("valid grid");
        assert_close(coords.lat, 43.0 - 1.0 / 48.0);
        assert_close(coords.lon, -70.0 - 1.0 / 24.0);
    }

    #[test]
    fn case_does_not_matter() {
        assert_eq!(grid_to_coords("fn42"), grid_to_coords("FN42"));
        assert_eq!(grid_to_coords("fn42ab"), grid_to_coords("FN42AB"));
    }

    #[test]
    fn invalid_grids_are_rejected() {
        // Wrong lengths.
        assert_eq!(grid_to_coords(""), None);
        assert_eq!(grid_to_coords("FN4"), None);
        assert_eq!(grid_to_coords("FN42A"), None);
        assert_eq!(grid_to_coords("FN42ABCD"), None);

        // Characters outside their ranges.
        assert_eq!(grid_to_coords("SN42"), None); // field past R
        assert_eq!(grid_to_coords("FNAB"), None); // letters where digits go
        assert_eq!(grid_to_coords("FN42YY"), None); // subsquare past X
        assert_eq!(grid_to_coords("F-42"), None);
    }

    #[test]
    fn resolver_counts_hits_and_misses() {
        let mut resolver = GridResolver::new();

        resolver.resolve("FN42").expect("valid grid");
        resolver.resolve("FN42").expect("valid grid");
        resolver.resolve("CM87").expect("valid grid");
        resolver.resolve("fn42").expect("valid grid");

        let stats = resolver.stats();
        assert_eq!(stats.hits, 1);
        // Lower case is a distinct cache key, converted on its own.
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.entries, 3);
    }

    #[test]
    fn resolver_reports_unknown_grids() {
        let mut resolver = GridResolver::new();

        match resolver.resolve("ZZ99") {
            Err(WsprDataErr::UnknownGrid(grid)) => assert_eq!(grid, "ZZ99"),
            res => panic!("unexpected result: {:?}", res),
        }

        // A failed lookup caches nothing.
        assert_eq!(resolver.stats().entries, 0);
    }
}
