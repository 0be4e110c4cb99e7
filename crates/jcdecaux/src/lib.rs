//! Station records as published by the JCDecaux bike-share API, and their
//! ingestion into the station and availability tables.
//!
//! A single station object of the API carries both the static and the dynamic
//! attributes. `StaticStationRecord` and `DynamicStationRecord` each pick
//! their part of it, so the same payload can be parsed into either.

use std::io::Read;

use bike_share::{client::Client, database::Database, RequestError};
use chrono::{DateTime, Utc};
use model::{Availability, Station};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

/// Status reported by stations which accept rentals and returns.
pub const OPEN_STATUS: &str = "OPEN";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed station data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("station {0} has no last update")]
    MissingTimestamp(i32),
    #[error("timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),
    #[error(transparent)]
    Request(#[from] RequestError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticStationRecord {
    pub number: i32,
    pub address: String,
    pub banking: bool,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamicStationRecord {
    pub number: i32,
    /// Milliseconds since the unix epoch. Missing for stations which never
    /// reported.
    pub last_update: Option<i64>,
    pub status: String,
    pub bike_stands: i32,
    pub available_bikes: i32,
    pub available_bike_stands: i32,
}

impl From<StaticStationRecord> for Station {
    fn from(record: StaticStationRecord) -> Self {
        Station {
            number: record.number,
            address: record.address,
            banking: record.banking,
            name: record.name,
            latitude: record.position.lat,
            longitude: record.position.lng,
        }
    }
}

impl TryFrom<DynamicStationRecord> for Availability {
    type Error = FeedError;

    fn try_from(record: DynamicStationRecord) -> Result<Self, Self::Error> {
        let last_update = record
            .last_update
            .ok_or(FeedError::MissingTimestamp(record.number))?;
        Ok(Availability {
            number: record.number,
            last_update: timestamp_from_millis(last_update)?,
            open: is_open(&record.status),
            bike_stands: record.bike_stands,
            available_bikes: record.available_bikes,
            available_bike_stands: record.available_bike_stands,
        })
    }
}

/// Converts epoch milliseconds into a timestamp with whole-second precision,
/// rounding to the nearest second (half a second rounds up).
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, FeedError> {
    millis
        .checked_add(500)
        .and_then(|rounded| DateTime::from_timestamp(rounded.div_euclid(1000), 0))
        .ok_or(FeedError::InvalidTimestamp(millis))
}

pub fn is_open(status: &str) -> bool {
    status == OPEN_STATUS
}

/// Parses a JSON array of station objects.
pub fn parse_records<T, R>(reader: R) -> Result<Vec<T>, FeedError>
where
    T: DeserializeOwned,
    R: Read,
{
    Ok(serde_json::from_reader(reader)?)
}

pub async fn insert_static_data<D: Database>(
    client: &Client<D>,
    records: Vec<StaticStationRecord>,
) -> Result<usize, FeedError> {
    let stations = records.into_iter().map(Station::from).collect::<Vec<_>>();
    Ok(client.insert_stations(&stations).await?)
}

/// Inserts the availability part of the records. Records without a last
/// update are skipped.
pub async fn insert_dynamic_data<D: Database>(
    client: &Client<D>,
    records: Vec<DynamicStationRecord>,
) -> Result<usize, FeedError> {
    let mut availabilities = Vec::with_capacity(records.len());
    for record in records {
        match Availability::try_from(record) {
            Ok(availability) => availabilities.push(availability),
            Err(FeedError::MissingTimestamp(number)) => {
                log::warn!("skipping station {} without last update", number);
            }
            Err(why) => return Err(why),
        }
    }
    Ok(client.insert_availability(&availabilities).await?)
}
