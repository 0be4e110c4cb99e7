use bike_share::database::Result;
use model::{ColumnInfo, AVAILABILITY_TABLE, STATION_TABLE};
use sqlx::{
    postgres::PgConnectOptions, Connection as _, Executor, PgConnection, Postgres,
};

use crate::data_model::{schema::ColumnRow, DatabaseRow as _};

use super::convert_error;

/// SQLSTATE raised by `CREATE DATABASE` if the database already exists.
const DUPLICATE_DATABASE: &str = "42P04";

/// Quotes an identifier, so it can be embedded into statements which do not
/// accept bind parameters.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Creates the database `name`, unless it already exists.
///
/// `CREATE DATABASE` can neither run inside the database it creates nor
/// inside a transaction, so this uses a dedicated connection to the
/// maintenance database.
pub async fn ensure_database(options: &PgConnectOptions, name: &str) -> Result<()> {
    let mut connection = PgConnection::connect_with(options)
        .await
        .map_err(convert_error)?;

    let exists: bool = sqlx::query_scalar(
        "
        SELECT EXISTS (
            SELECT 1 FROM pg_database WHERE datname = $1
        );
        ",
    )
    .bind(name)
    .fetch_one(&mut connection)
    .await
    .map_err(convert_error)?;

    if exists {
        log::debug!("database {} already exists", name);
    } else {
        let statement = format!("CREATE DATABASE {};", quote_identifier(name));
        match connection.execute(statement.as_str()).await {
            Ok(_) => log::info!("created database {}", name),
            // created concurrently by someone else
            Err(sqlx::Error::Database(why))
                if why.code().as_deref() == Some(DUPLICATE_DATABASE)
                    || why.is_unique_violation() =>
            {
                log::debug!("database {} already exists", name)
            }
            Err(why) => return Err(convert_error(why)),
        }
    }

    connection.close().await.map_err(convert_error)
}

pub async fn ensure_station_table<'c, E>(executor: E) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS station (
            number INTEGER NOT NULL,
            address VARCHAR(128) NOT NULL,
            banking BOOLEAN NOT NULL,
            name VARCHAR(128) NOT NULL,
            position_lat DOUBLE PRECISION NOT NULL,
            position_long DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (number)
        );
        ",
    )
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}

pub async fn ensure_availability_table<'c, E>(executor: E) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS availability (
            number INTEGER NOT NULL,
            last_update TIMESTAMPTZ NOT NULL,
            open BOOLEAN NOT NULL,
            bike_stands INTEGER NOT NULL,
            available_bikes INTEGER NOT NULL,
            available_bike_stands INTEGER NOT NULL,
            PRIMARY KEY (number, last_update),
            FOREIGN KEY (number) REFERENCES station (number)
        );
        ",
    )
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}

pub async fn get_columns<'c, E>(executor: E) -> Result<Vec<ColumnInfo>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            table_name::text AS table_name,
            column_name::text AS column_name,
            data_type::text AS data_type
        FROM
            information_schema.columns
        WHERE
            table_schema = current_schema()
            AND table_name IN ($1, $2)
        ORDER BY
            table_name, ordinal_position;
        ",
    )
    .bind(STATION_TABLE)
    .bind(AVAILABILITY_TABLE)
    .fetch_all(executor)
    .await
    .map_err(convert_error)
    .map(|rows: Vec<ColumnRow>| rows.into_iter().map(|row| row.to_model()).collect())
}
