use async_trait::async_trait;
use bike_share::database::{AvailabilityRepo, Result};
use chrono::{DateTime, Utc};
use model::Availability;
use sqlx::prelude::FromRow;

use crate::{
    queries::availability::{get_by_station, insert},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct AvailabilityRow {
    pub number: i32,
    pub last_update: DateTime<Utc>,
    pub open: bool,
    pub bike_stands: i32,
    pub available_bikes: i32,
    pub available_bike_stands: i32,
}

impl DatabaseRow for AvailabilityRow {
    type Model = Availability;

    fn to_model(self) -> Self::Model {
        Availability {
            number: self.number,
            last_update: self.last_update,
            open: self.open,
            bike_stands: self.bike_stands,
            available_bikes: self.available_bikes,
            available_bike_stands: self.available_bike_stands,
        }
    }
}

// Repo

#[async_trait]
impl AvailabilityRepo for PgDatabaseAutocommit {
    async fn insert_availability(
        &mut self,
        availability: &Availability,
    ) -> Result<bool> {
        insert(&self.pool, availability).await
    }

    async fn availabilities(&mut self, number: i32) -> Result<Vec<Availability>> {
        get_by_station(&self.pool, number).await
    }
}

#[async_trait]
impl<'a> AvailabilityRepo for PgDatabaseTransaction<'a> {
    async fn insert_availability(
        &mut self,
        availability: &Availability,
    ) -> Result<bool> {
        insert(&mut *self.tx, availability).await
    }

    async fn availabilities(&mut self, number: i32) -> Result<Vec<Availability>> {
        get_by_station(&mut *self.tx, number).await
    }
}
