//! Runs the gateway against a live PostgreSQL server.
//!
//! Ignored by default. Set the `DATABASE_*` variables (the configured database
//! itself is not touched) and run `cargo test -p database -- --ignored`. Every
//! test creates and drops a database of its own.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use bike_share::{client::Client, RequestError};
use chrono::DateTime;
use database::{queries::schema::quote_identifier, DatabaseConnectionInfo, PgDatabase};
use jcdecaux::{DynamicStationRecord, StaticStationRecord};
use model::{Availability, Station};
use sqlx::{postgres::PgConnectOptions, Connection as _, Executor as _, PgConnection};

static NEXT_DATABASE: AtomicUsize = AtomicUsize::new(0);

struct TestDatabase {
    client: Client<PgDatabase>,
    maintenance_options: PgConnectOptions,
    name: String,
}

impl TestDatabase {
    async fn create() -> Self {
        let mut info = DatabaseConnectionInfo::from_env()
            .expect("expected database connection info in env.");
        info.database = format!(
            "bike_share_test_{}_{}",
            std::process::id(),
            NEXT_DATABASE.fetch_add(1, Ordering::SeqCst)
        );
        let name = info.database.clone();
        let maintenance_options = info.maintenance_connect_options();

        let client = Client::new("test", PgDatabase::new(info));
        client.ensure_schema().await.unwrap();

        Self {
            client,
            maintenance_options,
            name,
        }
    }

    async fn remove(self) {
        self.client.close().await;
        let mut connection = PgConnection::connect_with(&self.maintenance_options)
            .await
            .unwrap();
        let statement = format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE);",
            quote_identifier(&self.name)
        );
        connection.execute(statement.as_str()).await.unwrap();
        connection.close().await.unwrap();
    }
}

/// Number of server sessions connected to the database `name`. Backends exit
/// shortly after their client hangs up, so this polls for a moment until the
/// count drops to zero.
async fn sessions(options: &PgConnectOptions, name: &str) -> i64 {
    let mut connection = PgConnection::connect_with(options).await.unwrap();
    let mut count = 0;
    for _ in 0..50 {
        count = sqlx::query_scalar(
            "
            SELECT count(*) FROM pg_stat_activity WHERE datname = $1;
            ",
        )
        .bind(name)
        .fetch_one(&mut connection)
        .await
        .unwrap();
        if count == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    connection.close().await.unwrap();
    count
}

fn station(number: i32, name: &str, address: &str) -> Station {
    Station {
        number,
        address: address.to_owned(),
        banking: true,
        name: name.to_owned(),
        latitude: 53.1,
        longitude: -6.2,
    }
}

fn availability(number: i32, timestamp: i64) -> Availability {
    Availability {
        number,
        last_update: DateTime::from_timestamp(timestamp, 0).unwrap(),
        open: true,
        bike_stands: 30,
        available_bikes: 11,
        available_bike_stands: 19,
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn schema_operations_are_idempotent() {
    let db = TestDatabase::create().await;

    db.client.ensure_database().await.unwrap();
    db.client.ensure_station_table().await.unwrap();
    db.client.ensure_availability_table().await.unwrap();
    db.client.ensure_schema().await.unwrap();

    let columns = db.client.inspect_schema().await.unwrap();
    let count = |table: &str| columns.iter().filter(|c| c.table_name == table).count();
    assert_eq!(count("station"), 6);
    assert_eq!(count("availability"), 6);

    let last_update = columns
        .iter()
        .find(|c| c.table_name == "availability" && c.column_name == "last_update")
        .unwrap();
    assert_eq!(last_update.data_type, "timestamp with time zone");

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn quotes_round_trip() {
    let db = TestDatabase::create().await;

    let records: Vec<StaticStationRecord> = serde_json::from_str(
        r#"[{
            "number": 42,
            "address": "O'Brien St",
            "banking": true,
            "name": "Test",
            "position": { "lat": 53.1, "lng": -6.2 }
        }]"#,
    )
    .unwrap();
    jcdecaux::insert_static_data(&db.client, records).await.unwrap();

    let stations = db.client.stations().await.unwrap();
    assert_eq!(stations, vec![station(42, "Test", "O'Brien St")]);

    db.client
        .insert_stations(&[station(43, "St. Patrick's 'Park'", "''")])
        .await
        .unwrap();
    let stored = db.client.station(43).await.unwrap();
    assert_eq!(stored.name, "St. Patrick's 'Park'");
    assert_eq!(stored.address, "''");

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn duplicate_station_fails_and_keeps_original() {
    let db = TestDatabase::create().await;

    db.client
        .insert_stations(&[station(1, "Original", "Main St")])
        .await
        .unwrap();
    let result = db
        .client
        .insert_stations(&[station(1, "Replacement", "Side St")])
        .await;

    assert!(matches!(result, Err(RequestError::AlreadyExists)));
    assert_eq!(
        db.client.station(1).await.unwrap(),
        station(1, "Original", "Main St")
    );

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn duplicate_availability_is_stored_once() {
    let db = TestDatabase::create().await;
    db.client
        .insert_stations(&[station(5, "Heuston", "Heuston")])
        .await
        .unwrap();

    let first = db
        .client
        .insert_availability(&[availability(5, 1_676_041_200)])
        .await
        .unwrap();
    let mut changed = availability(5, 1_676_041_200);
    changed.available_bikes = 0;
    let second = db.client.insert_availability(&[changed]).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(
        db.client.availabilities(5).await.unwrap(),
        vec![availability(5, 1_676_041_200)]
    );

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn status_and_timestamp_are_converted() {
    let db = TestDatabase::create().await;
    db.client
        .insert_stations(&[station(8, "Open", "A"), station(9, "Closed", "B")])
        .await
        .unwrap();

    let records: Vec<DynamicStationRecord> = serde_json::from_str(
        r#"[
            {
                "number": 8, "last_update": 1676041234567, "status": "OPEN",
                "bike_stands": 20, "available_bikes": 5, "available_bike_stands": 15
            },
            {
                "number": 9, "last_update": 1676041234999, "status": "CLOSED",
                "bike_stands": 20, "available_bikes": 0, "available_bike_stands": 20
            }
        ]"#,
    )
    .unwrap();
    let inserted = jcdecaux::insert_dynamic_data(&db.client, records)
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let open = db.client.availabilities(8).await.unwrap();
    let closed = db.client.availabilities(9).await.unwrap();
    assert!(open[0].open);
    assert!(!closed[0].open);
    assert_eq!(open[0].last_update.timestamp(), 1_676_041_235);
    assert_eq!(closed[0].last_update, open[0].last_update);

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn availability_of_unknown_station_fails() {
    let db = TestDatabase::create().await;

    let result = db
        .client
        .insert_availability(&[availability(404, 1_676_041_200)])
        .await;

    assert!(matches!(result, Err(RequestError::Other(_))));
    assert!(db.client.availabilities(404).await.unwrap().is_empty());

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn unknown_station_is_not_found() {
    let db = TestDatabase::create().await;

    let result = db.client.station(1234).await;
    assert!(matches!(result, Err(RequestError::NotFound)));

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn close_releases_all_connections() {
    let db = TestDatabase::create().await;

    db.client
        .insert_stations(&[station(11, "Grand Canal", "Grand Canal Dock")])
        .await
        .unwrap();
    db.client
        .insert_availability(&[
            availability(11, 1_676_041_200),
            availability(11, 1_676_041_500),
        ])
        .await
        .unwrap();
    db.client.inspect_schema().await.unwrap();
    db.client.station(11).await.unwrap();
    db.client.close().await;

    assert_eq!(sessions(&db.maintenance_options, &db.name).await, 0);

    db.remove().await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn snapshots_round_to_distinct_seconds() {
    let db = TestDatabase::create().await;
    db.client
        .insert_stations(&[station(1, "Smithfield", "Smithfield North")])
        .await
        .unwrap();

    let records: Vec<DynamicStationRecord> = serde_json::from_str(
        r#"[
            {
                "number": 1, "last_update": 1676041234400, "status": "OPEN",
                "bike_stands": 20, "available_bikes": 5, "available_bike_stands": 15
            },
            {
                "number": 1, "last_update": 1676041234600, "status": "OPEN",
                "bike_stands": 20, "available_bikes": 4, "available_bike_stands": 16
            }
        ]"#,
    )
    .unwrap();
    let inserted = jcdecaux::insert_dynamic_data(&db.client, records)
        .await
        .unwrap();

    assert_eq!(inserted, 2);
    let stored = db
        .client
        .availabilities(1)
        .await
        .unwrap()
        .into_iter()
        .map(|availability| availability.last_update.timestamp())
        .collect::<Vec<_>>();
    assert_eq!(stored, vec![1_676_041_234, 1_676_041_235]);

    db.remove().await;
}
