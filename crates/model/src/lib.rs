pub mod availability;
pub mod schema;
pub mod station;

pub use availability::Availability;
pub use schema::ColumnInfo;
pub use station::Station;

/// Name of the table holding static station data.
pub const STATION_TABLE: &str = "station";

/// Name of the table holding availability snapshots.
pub const AVAILABILITY_TABLE: &str = "availability";
