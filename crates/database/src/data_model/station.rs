use async_trait::async_trait;
use bike_share::database::{Result, StationRepo};
use model::Station;
use sqlx::prelude::FromRow;

use crate::{
    queries::station::{get, get_all, insert},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct StationRow {
    pub number: i32,
    pub address: String,
    pub banking: bool,
    pub name: String,
    pub position_lat: f64,
    pub position_long: f64,
}

impl DatabaseRow for StationRow {
    type Model = Station;

    fn to_model(self) -> Self::Model {
        Station {
            number: self.number,
            address: self.address,
            banking: self.banking,
            name: self.name,
            latitude: self.position_lat,
            longitude: self.position_long,
        }
    }
}

// Repo

#[async_trait]
impl StationRepo for PgDatabaseAutocommit {
    async fn insert_station(&mut self, station: &Station) -> Result<()> {
        insert(&self.pool, station).await
    }

    async fn station(&mut self, number: i32) -> Result<Station> {
        get(&self.pool, number).await
    }

    async fn stations(&mut self) -> Result<Vec<Station>> {
        get_all(&self.pool).await
    }
}

#[async_trait]
impl<'a> StationRepo for PgDatabaseTransaction<'a> {
    async fn insert_station(&mut self, station: &Station) -> Result<()> {
        insert(&mut *self.tx, station).await
    }

    async fn station(&mut self, number: i32) -> Result<Station> {
        get(&mut *self.tx, number).await
    }

    async fn stations(&mut self) -> Result<Vec<Station>> {
        get_all(&mut *self.tx).await
    }
}
