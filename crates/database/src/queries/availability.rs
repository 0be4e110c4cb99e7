use bike_share::database::Result;
use model::Availability;
use sqlx::{Executor, Postgres};

use crate::data_model::{availability::AvailabilityRow, DatabaseRow as _};

use super::convert_error;

/// Returns `false` if a snapshot with the same station and timestamp is
/// already stored; the stored snapshot is kept in that case.
pub async fn insert<'c, E>(executor: E, availability: &Availability) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO availability (
            number, last_update, open,
            bike_stands, available_bikes, available_bike_stands
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (number, last_update) DO NOTHING;
        ",
    )
    .bind(availability.number)
    .bind(availability.last_update)
    .bind(availability.open)
    .bind(availability.bike_stands)
    .bind(availability.available_bikes)
    .bind(availability.available_bike_stands)
    .execute(executor)
    .await
    .map_err(convert_error)
    .map(|result| result.rows_affected() > 0)
}

pub async fn get_by_station<'c, E>(executor: E, number: i32) -> Result<Vec<Availability>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            number, last_update, open,
            bike_stands, available_bikes, available_bike_stands
        FROM
            availability
        WHERE
            number = $1
        ORDER BY
            last_update;
        ",
    )
    .bind(number)
    .fetch_all(executor)
    .await
    .map_err(convert_error)
    .map(|rows: Vec<AvailabilityRow>| rows.into_iter().map(|row| row.to_model()).collect())
}
