pub mod availability;
pub mod schema;
pub mod station;

/// A row as read from the database, convertible into its domain model.
pub trait DatabaseRow {
    type Model;

    fn to_model(self) -> Self::Model;
}
