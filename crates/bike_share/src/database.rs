use std::{error, result};

use async_trait::async_trait;
use model::{Availability, ColumnInfo, Station};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("row not found")]
    NotFound,
    #[error("row already exists")]
    AlreadyExists,
    #[error("database error: {0}")]
    Other(Box<dyn error::Error + Send + Sync>),
}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait StationRepo {
    /// Inserts a single station.
    ///
    /// Fails with `DatabaseError::AlreadyExists` if a station with the same
    /// number is already stored. The stored station is left untouched.
    async fn insert_station(&mut self, station: &Station) -> Result<()>;

    async fn station(&mut self, number: i32) -> Result<Station>;

    /// Returns all stations ordered by their number.
    async fn stations(&mut self) -> Result<Vec<Station>>;
}

#[async_trait]
pub trait AvailabilityRepo {
    /// Inserts a single availability snapshot, ignoring snapshots whose
    /// `(number, last_update)` pair is already stored.
    ///
    /// Returns `false` if the snapshot was ignored.
    async fn insert_availability(&mut self, availability: &Availability)
        -> Result<bool>;

    /// Returns all snapshots of a station ordered by `last_update`.
    async fn availabilities(&mut self, number: i32) -> Result<Vec<Availability>>;
}

#[async_trait]
pub trait SchemaRepo {
    async fn ensure_station_table(&mut self) -> Result<()>;

    /// Must run after `ensure_station_table`, as availability rows reference
    /// stations.
    async fn ensure_availability_table(&mut self) -> Result<()>;

    /// Column names and types of the station and availability tables.
    async fn inspect_schema(&mut self) -> Result<Vec<ColumnInfo>>;
}

pub trait DatabaseOperations: StationRepo + AvailabilityRepo + SchemaRepo {}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// Trait to implement a bike-share database.
///
/// A transaction which is dropped without calling `commit` is rolled back.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    /// Creates the database itself, if it does not exist yet.
    async fn ensure_database(&self) -> Result<()>;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;

    /// Closes all connections once the transactions in flight have handed
    /// theirs back. Operations started afterwards fail.
    async fn close(&self);
}
