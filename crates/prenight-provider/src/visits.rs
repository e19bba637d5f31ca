use rusqlite::{Connection, OpenFlags};
use tracing::{debug, instrument};

use crate::error::Result;

/// One row of the `observations` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub observation_id: i64,
    /// Degrees.
    pub field_ra: f64,
    pub field_dec: f64,
    pub observation_start_mjd: f64,
    /// Passband, one of `ugrizy`.
    pub filter: String,
}

/// Read-only handle on a simulated or historical visit database.
pub struct VisitStore {
    conn: Connection,
}

impl VisitStore {
    /// Open an existing database read-only. A missing file is an error,
    /// never an empty new database.
    #[instrument]
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// All visits, ordered by `observationId`.
    #[instrument(skip(self))]
    pub fn load_visits(&self) -> Result<Vec<Visit>> {
        let mut stmt = self.conn.prepare("SELECT * FROM observations")?;
        let mut visits = stmt
            .query_map([], |row| {
                Ok(Visit {
                    observation_id: row.get("observationId")?,
                    field_ra: row.get("fieldRA")?,
                    field_dec: row.get("fieldDec")?,
                    observation_start_mjd: row.get("observationStartMJD")?,
                    filter: row.get("filter")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        visits.sort_by_key(|v| v.observation_id);
        debug!(count = visits.len(), "visits loaded");
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn loads_visits_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.db");
        let mut expected = fixtures::visits();
        // insert out of order
        expected.reverse();
        fixtures::write_visit_db(&path, &expected).unwrap();

        let store = VisitStore::open(path.to_str().unwrap()).unwrap();
        let visits = store.load_visits().unwrap();
        assert_eq!(visits.len(), expected.len());
        assert!(visits.windows(2).all(|w| w[0].observation_id < w[1].observation_id));
        assert_eq!(visits[0].filter, "u");
    }

    #[test]
    fn missing_database_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        assert!(VisitStore::open(path.to_str().unwrap()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn missing_table_is_a_database_error() {
        let store = VisitStore::from_connection(Connection::open_in_memory().unwrap());
        assert!(matches!(
            store.load_visits(),
            Err(crate::ProviderError::Database(_))
        ));
    }
}
