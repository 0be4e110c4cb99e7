use bike_share::database::DatabaseError;

pub mod availability;
pub mod schema;
pub mod station;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            DatabaseError::AlreadyExists
        }
        _ => DatabaseError::Other(Box::new(why)),
    }
}
