use chrono::{DateTime, Utc};

/// One availability snapshot of a station.
///
/// `(number, last_update)` identifies a snapshot. Storing the same pair twice
/// has no effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    /// Number of the station this snapshot belongs to.
    pub number: i32,
    /// Time of the observation, with whole-second precision.
    pub last_update: DateTime<Utc>,
    pub open: bool,
    pub bike_stands: i32,
    pub available_bikes: i32,
    pub available_bike_stands: i32,
}
