//! The sqlite spot store.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OpenFlags, NO_PARAMS};
use tracing::debug;

use crate::errors::WsprDataErr;
use crate::geo::Coords;
use crate::spot::Spot;

const INSERT_SPOT: &str = "
    INSERT INTO wspr VALUES
    (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(15);

/// A handle to the spot database.
///
/// Owns the connection for the duration of a run and closes it when dropped,
/// on every exit path. Batches commit their own transactions, so there is
/// never pending work to lose at close.
#[derive(Debug)]
pub struct SpotStore {
    conn: Connection,
}

impl SpotStore {
    /// Open the store, creating the database file if there is none.
    pub fn open(db_path: &Path) -> Result<Self, WsprDataErr> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(SpotStore { conn })
    }

    /// Create the spot table and its indexes when absent, and set the
    /// journaling pragmas. Safe to run on every start.
    pub fn ensure_schema(&self) -> Result<(), WsprDataErr> {
        self.conn.execute_batch(include_str!("store/schema.sql"))?;

        // WAL lets readers work while an import is writing. The pragma
        // answers with the mode now in effect.
        let journal_mode: String =
            self.conn
                .query_row("PRAGMA journal_mode = WAL", NO_PARAMS, |row| row.get(0))?;
        debug!("journal mode {}", journal_mode);

        self.conn.pragma_update(None, "synchronous", &"EXTRA")?;

        Ok(())
    }

    /// The highest stored spot id, 0 for an empty store.
    ///
    /// This is the resume watermark: ids at or below it have already been
    /// imported.
    pub fn max_spot_id(&self) -> Result<i64, WsprDataErr> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(spot_id) FROM wspr", NO_PARAMS, |row| row.get(0))?;

        Ok(max.unwrap_or(0))
    }

    /// Number of spots in the store.
    pub fn spot_count(&self) -> Result<i64, WsprDataErr> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM wspr", NO_PARAMS, |row| row.get(0))?;

        Ok(count)
    }

    /// Insert a batch of spots in one transaction.
    ///
    /// The batch lands whole or not at all: any failure rolls the entire
    /// transaction back and previously committed batches are untouched. An
    /// empty batch is a no-op.
    pub fn insert_batch(&mut self, spots: &[Spot]) -> Result<(), WsprDataErr> {
        if spots.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_SPOT)?;

            for spot in spots {
                stmt.execute(&[
                    &spot.spot_id as &dyn ToSql,
                    &spot.time,
                    &spot.tx_call,
                    &spot.tx_grid,
                    &spot.snr,
                    &spot.frequency,
                    &spot.rx_call,
                    &spot.rx_grid,
                    &spot.power,
                    &spot.drift,
                    &spot.distance,
                    &spot.azimuth,
                    &spot.band,
                    &spot.version,
                    &spot.code,
                    &spot.tx_lat,
                    &spot.tx_lon,
                    &spot.rx_lat,
                    &spot.rx_lon,
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    /// Transmitter coordinates of every spot observed in `[start, end)`,
    /// in time order. Both bounds are naive UTC.
    pub fn tx_coords_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Coords>, WsprDataErr> {
        let mut stmt = self.conn.prepare(
            "
                SELECT tx_lat, tx_lon
                FROM wspr
                WHERE time >= ?1 AND time < ?2
                ORDER BY time
            ",
        )?;

        let coords: Result<Vec<Coords>, _> = stmt
            .query_map(
                &[
                    &start.and_utc().timestamp() as &dyn ToSql,
                    &end.and_utc().timestamp(),
                ],
                |row| {
                    Ok(Coords {
                        lat: row.get(0)?,
                        lon: row.get(1)?,
                    })
                },
            )?
            .map(|res| res.map_err(WsprDataErr::Database))
            .collect();

        coords
    }
}
