use rf_core::error::StoreError;
use rf_core::store::Store;
use rusqlite::Connection;

use crate::review_repo::ReviewRepo;
use crate::util::storage;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Store for DbStore {
    type Reviews<'a>
        = ReviewRepo<'a>
    where
        Self: 'a;

    fn reviews(&self) -> Self::Reviews<'_> {
        ReviewRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Self) -> Result<T, StoreError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(storage)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(storage)?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").map_err(storage)?;
                Err(err)
            }
        }
    }
}
