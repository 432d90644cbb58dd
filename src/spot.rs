//! Spot records and the archive line format.

use std::str::FromStr;

use crate::errors::WsprDataErr;
use crate::geo::GridResolver;

/// Number of comma separated fields in an archive line.
pub(crate) const SOURCE_FIELDS: usize = 15;

/// One observed propagation event, enriched with coordinates.
///
/// The first fifteen fields mirror the archive line layout in order; the
/// four coordinate fields are derived from the grid locators while parsing.
/// `time` is seconds since the unix epoch and `frequency` is carried
/// through as reported.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub spot_id: i64,
    pub time: i64,
    pub tx_call: String,
    pub tx_grid: String,
    pub snr: i32,
    pub frequency: f64,
    pub rx_call: String,
    pub rx_grid: String,
    pub power: i32,
    pub drift: i32,
    pub distance: f64,
    pub azimuth: f64,
    pub band: i32,
    pub version: String,
    pub code: i32,
    pub tx_lat: f64,
    pub tx_lon: f64,
    pub rx_lat: f64,
    pub rx_lon: f64,
}

impl Spot {
    /// Parse one archive line, resolving both grid locators.
    pub fn parse(line: &str, resolver: &mut GridResolver) -> Result<Self, WsprDataErr> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();

        if fields.len() != SOURCE_FIELDS {
            return Err(WsprDataErr::MalformedSpot(format!(
                "expected {} fields, found {}",
                SOURCE_FIELDS,
                fields.len()
            )));
        }

        let tx_coords = resolver.resolve(fields[3])?;
        let rx_coords = resolver.resolve(fields[7])?;

        Ok(Spot {
            spot_id: parse_field(fields[0], "spot_id")?,
            time: parse_field(fields[1], "time")?,
            tx_call: fields[2].to_owned(),
            tx_grid: fields[3].to_owned(),
            snr: parse_field(fields[4], "snr")?,
            frequency: parse_field(fields[5], "frequency")?,
            rx_call: fields[6].to_owned(),
            rx_grid: fields[7].to_owned(),
            power: parse_field(fields[8], "power")?,
            drift: parse_field(fields[9], "drift")?,
            distance: parse_field(fields[10], "distance")?,
            azimuth: parse_field(fields[11], "azimuth")?,
            band: parse_field(fields[12], "band")?,
            version: fields[13].to_owned(),
            code: parse_field(fields[14], "code")?,
            tx_lat: tx_coords.lat,
            tx_lon: tx_coords.lon,
            rx_lat: rx_coords.lat,
            rx_lon: rx_coords.lon,
        })
    }

    /// The leading id of a line, without touching the rest of it.
    ///
    /// The resume watermark is applied on this value before a line is worth
    /// parsing in full.
    pub(crate) fn leading_id(line: &str) -> Result<i64, WsprDataErr> {
        let id_field = line.split(',').next().unwrap_or("");

        id_field.parse().map_err(|_| {
            WsprDataErr::MalformedSpot(format!("unparseable spot id: {:?}", id_field))
        })
    }
}

fn parse_field<T>(raw: &str, name: &str) -> Result<T, WsprDataErr>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| WsprDataErr::MalformedSpot(format!("bad {} field: {:?}", name, raw)))
}

#[cfg(test)]
mod unit {
    use super::*;

    // A real looking archive line. Fields in order: spot id, epoch time,
    // tx call, tx grid, snr, frequency, rx call, rx grid, power, drift,
    // distance, azimuth, band, version, code.
    const LINE: &str =
        "1234567,1654039800,K1ABC,FN42,-21,14.097076,W6XYZ,CM87,37,0,4311,283,14,1.4_wsprd,1";

    #[test]
    fn parses_a_full_line() {
        let mut resolver = GridResolver::new();
        let spot = Spot::parse(LINE, &mut resolver).expect("valid line");

        assert_eq!(spot.spot_id, 1234567);
        assert_eq!(spot.time, 1654039800);
        assert_eq!(spot.tx_call, "K1ABC");
        assert_eq!(spot.tx_grid, "FN42");
        assert_eq!(spot.snr, -21);
        assert!((spot.frequency - 14.097076).abs() < 1e-9);
        assert_eq!(spot.rx_call, "W6XYZ");
        assert_eq!(spot.rx_grid, "CM87");
        assert_eq!(spot.power, 37);
        assert_eq!(spot.drift, 0);
        assert!((spot.distance - 4311.0).abs() < 1e-9);
        assert!((spot.azimuth - 283.0).abs() < 1e-9);
        assert_eq!(spot.band, 14);
        assert_eq!(spot.version, "1.4_wsprd");
        assert_eq!(spot.code, 1);

        assert!((spot.tx_lat - 42.5).abs() < 1e-9);
        assert!((spot.tx_lon - -71.0).abs() < 1e-9);
        assert!((spot.rx_lat - 37.5).abs() < 1e-9);
        assert!((spot.rx_lon - -123.0).abs() < 1e-9);
    }

    #[test]
    fn tolerates_a_trailing_carriage_return() {
        let mut resolver = GridResolver::new();
        let line = format!("{}\r", LINE);

        let spot = Spot::parse(&line, &mut resolver).expect("valid line");
        assert_eq!(spot.code, 1);
    }

    #[test]
    fn the_version_field_may_be_empty() {
        let mut resolver = GridResolver::new();
        let line = LINE.replace("1.4_wsprd", "");

        let spot = Spot::parse(&line, &mut resolver).expect("valid line");
        assert_eq!(spot.version, "");
        assert_eq!(spot.code, 1);
    }

    #[test]
    fn rejects_wrong_field_counts() {
        let mut resolver = GridResolver::new();

        let short = "1234567,1654039800,K1ABC";
        match Spot::parse(short, &mut resolver) {
            Err(WsprDataErr::MalformedSpot(msg)) => {
                assert!(msg.contains("expected 15 fields, found 3"), "{}", msg)
            }
            res => panic!("unexpected result: {:?}", res),
        }

        let long = format!("{},extra", LINE);
        assert!(Spot::parse(&long, &mut resolver).is_err());
    }

    #[test]
    fn rejects_unparseable_numeric_fields() {
        let mut resolver = GridResolver::new();
        let line = LINE.replace(",-21,", ",loud,");

        match Spot::parse(&line, &mut resolver) {
            Err(WsprDataErr::MalformedSpot(msg)) => {
                assert!(msg.contains("bad snr field"), "{}", msg)
            }
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn rejects_unknown_grids() {
        let mut resolver = GridResolver::new();
        let line = LINE.replace("CM87", "not-a-grid");

        match Spot::parse(&line, &mut resolver) {
            Err(WsprDataErr::UnknownGrid(grid)) => assert_eq!(grid, "not-a-grid"),
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn leading_id_reads_only_the_first_field() {
        assert_eq!(Spot::leading_id(LINE).expect("valid id"), 1234567);
        assert_eq!(
            Spot::leading_id("42,garbage that would never parse").expect("valid id"),
            42
        );

        assert!(Spot::leading_id("").is_err());
        assert!(Spot::leading_id("abc,1,2").is_err());
    }
}
