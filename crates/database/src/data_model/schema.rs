use async_trait::async_trait;
use bike_share::database::{Result, SchemaRepo};
use model::ColumnInfo;
use sqlx::prelude::FromRow;

use crate::{
    queries::schema::{ensure_availability_table, ensure_station_table, get_columns},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

impl DatabaseRow for ColumnRow {
    type Model = ColumnInfo;

    fn to_model(self) -> Self::Model {
        ColumnInfo {
            table_name: self.table_name,
            column_name: self.column_name,
            data_type: self.data_type,
        }
    }
}

// Repo

#[async_trait]
impl SchemaRepo for PgDatabaseAutocommit {
    async fn ensure_station_table(&mut self) -> Result<()> {
        ensure_station_table(&self.pool).await
    }

    async fn ensure_availability_table(&mut self) -> Result<()> {
        ensure_availability_table(&self.pool).await
    }

    async fn inspect_schema(&mut self) -> Result<Vec<ColumnInfo>> {
        get_columns(&self.pool).await
    }
}

#[async_trait]
impl<'a> SchemaRepo for PgDatabaseTransaction<'a> {
    async fn ensure_station_table(&mut self) -> Result<()> {
        ensure_station_table(&mut *self.tx).await
    }

    async fn ensure_availability_table(&mut self) -> Result<()> {
        ensure_availability_table(&mut *self.tx).await
    }

    async fn inspect_schema(&mut self) -> Result<Vec<ColumnInfo>> {
        get_columns(&mut *self.tx).await
    }
}
