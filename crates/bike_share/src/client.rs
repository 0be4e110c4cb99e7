use model::{Availability, ColumnInfo, Station};

use crate::{
    database::{
        AvailabilityRepo, Database, DatabaseTransaction, SchemaRepo, StationRepo,
    },
    RequestResult,
};

/// Entry point for all reads and writes of the ingestion tables.
///
/// Every write runs in a transaction of its own. If an operation fails, the
/// transaction is dropped and thereby rolled back, while writes of earlier
/// records stay committed.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database,
{
    id: String,
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new<S>(id: S, database: D) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: id.into(),
            database,
        }
    }

    // schema

    pub async fn ensure_database(&self) -> RequestResult<()> {
        self.database.ensure_database().await?;
        Ok(())
    }

    pub async fn ensure_station_table(&self) -> RequestResult<()> {
        let mut tx = self.database.transaction().await?;
        tx.ensure_station_table().await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn ensure_availability_table(&self) -> RequestResult<()> {
        let mut tx = self.database.transaction().await?;
        tx.ensure_availability_table().await?;
        tx.commit().await?;
        Ok(())
    }

    /// Creates the database and both tables, if missing.
    pub async fn ensure_schema(&self) -> RequestResult<()> {
        self.ensure_database().await?;
        self.ensure_station_table().await?;
        self.ensure_availability_table().await?;
        log::info!("[{}] schema is up to date", self.id);
        Ok(())
    }

    pub async fn inspect_schema(&self) -> RequestResult<Vec<ColumnInfo>> {
        let mut tx = self.database.transaction().await?;
        let columns = tx.inspect_schema().await?;
        tx.commit().await?;
        Ok(columns)
    }

    // static data

    /// Inserts the stations one by one and returns how many were inserted.
    ///
    /// Stops at the first station which can not be inserted, e.g. because it
    /// already exists.
    pub async fn insert_stations(&self, stations: &[Station]) -> RequestResult<usize> {
        for station in stations {
            let mut tx = self.database.transaction().await?;
            if let Err(why) = tx.insert_station(station).await {
                log::warn!(
                    "[{}] could not insert station {}: {}",
                    self.id,
                    station.number,
                    why
                );
                return Err(why.into());
            }
            tx.commit().await?;
        }
        log::info!("[{}] inserted {} stations", self.id, stations.len());
        Ok(stations.len())
    }

    pub async fn station(&self, number: i32) -> RequestResult<Station> {
        Ok(self.database.auto().station(number).await?)
    }

    pub async fn stations(&self) -> RequestResult<Vec<Station>> {
        Ok(self.database.auto().stations().await?)
    }

    // dynamic data

    /// Inserts the snapshots one by one and returns how many were new.
    /// Already known snapshots are skipped.
    pub async fn insert_availability(
        &self,
        availabilities: &[Availability],
    ) -> RequestResult<usize> {
        let mut inserted = 0;
        for availability in availabilities {
            let mut tx = self.database.transaction().await?;
            if tx.insert_availability(availability).await? {
                inserted += 1;
            } else {
                log::debug!(
                    "[{}] ignored known snapshot of station {} at {}",
                    self.id,
                    availability.number,
                    availability.last_update
                );
            }
            tx.commit().await?;
        }
        log::info!(
            "[{}] inserted {} of {} availability snapshots",
            self.id,
            inserted,
            availabilities.len()
        );
        Ok(inserted)
    }

    pub async fn availabilities(&self, number: i32) -> RequestResult<Vec<Availability>> {
        Ok(self.database.auto().availabilities(number).await?)
    }

    pub async fn close(&self) {
        self.database.close().await;
        log::debug!("[{}] closed database", self.id);
    }
}
