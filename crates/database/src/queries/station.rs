use bike_share::database::Result;
use model::Station;
use sqlx::{Executor, Postgres};

use crate::data_model::{station::StationRow, DatabaseRow as _};

use super::convert_error;

pub async fn insert<'c, E>(executor: E, station: &Station) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO station (
            number, address, banking, name, position_lat, position_long
        )
        VALUES ($1, $2, $3, $4, $5, $6);
        ",
    )
    .bind(station.number)
    .bind(&station.address)
    .bind(station.banking)
    .bind(&station.name)
    .bind(station.latitude)
    .bind(station.longitude)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}

pub async fn get<'c, E>(executor: E, number: i32) -> Result<Station>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            number, address, banking, name, position_lat, position_long
        FROM
            station
        WHERE
            number = $1;
        ",
    )
    .bind(number)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: StationRow| row.to_model())
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<Station>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            number, address, banking, name, position_lat, position_long
        FROM
            station
        ORDER BY
            number;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)
    .map(|rows: Vec<StationRow>| rows.into_iter().map(|row| row.to_model()).collect())
}
