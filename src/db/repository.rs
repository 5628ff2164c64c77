//! SQLite-backed record store.
//!
//! Column names are checked against the collection whitelist before any SQL is built,
//! so table and column identifiers never come from user input.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use super::schema::{self, Collection, Column, ColumnKind};
use crate::store::{Fields, RecordFilter, RecordStore, StoreError};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Database repository for all record operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve the collection and the target column of every field.
    fn resolve(
        collection: &str,
        fields: &Fields,
    ) -> Result<(&'static Collection, Vec<&'static Column>), StoreError> {
        let table = schema::collection(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let columns = fields
            .keys()
            .map(|key| {
                table.column(key).ok_or_else(|| StoreError::UnknownColumn {
                    collection: collection.to_string(),
                    column: key.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((table, columns))
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let (table, columns) = Self::resolve(collection, &fields)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        names.extend(["id", "created_at", "updated_at"]);
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            names.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (column, value) in columns.iter().zip(fields.values()) {
            query = bind_value(query, column.kind, value);
        }
        query
            .bind(&id)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        tracing::debug!(collection = table.name, %id, "Record created");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let (table, columns) = Self::resolve(collection, &fields)?;
        let now = Utc::now().to_rfc3339();

        let mut assignments: Vec<String> =
            columns.iter().map(|c| format!("{} = ?", c.name)).collect();
        assignments.push("updated_at = ?".to_string());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            table.name,
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for (column, value) in columns.iter().zip(fields.values()) {
            query = bind_value(query, column.kind, value);
        }
        let result = query.bind(&now).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        tracing::debug!(collection = table.name, %id, columns = columns.len(), "Record updated");
        Ok(())
    }

    async fn select(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<Fields>, StoreError> {
        let table = schema::collection(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let mut sql = format!("SELECT * FROM {} WHERE 1 = 1", table.name);
        if filter.id.is_some() {
            sql.push_str(" AND id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut query = sqlx::query(&sql);
        if let Some(id) = &filter.id {
            query = query.bind(id);
        }
        if let Some(status) = &filter.status {
            query = query.bind(status);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(|row| record_from_row(table, row)).collect())
    }
}

// Helper functions for value conversion

fn bind_value<'q>(query: SqliteQuery<'q>, kind: ColumnKind, value: &Value) -> SqliteQuery<'q> {
    match (kind, value) {
        (_, Value::Null) => query.bind(None::<String>),
        (ColumnKind::Bool, Value::Bool(b)) => query.bind(*b as i32),
        (ColumnKind::Text, Value::String(s)) => query.bind(s.clone()),
        (ColumnKind::Text, other) => query.bind(other.to_string()),
        (ColumnKind::Bool, other) => query.bind(other.as_i64().unwrap_or(0) != 0),
        (ColumnKind::Json, other) => query.bind(other.to_string()),
    }
}

fn record_from_row(table: &Collection, row: &SqliteRow) -> Fields {
    let mut record = Fields::new();
    record.insert("id".to_string(), Value::String(row.get("id")));

    for column in table.columns {
        let value = match column.kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(column.name)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::String),
            ColumnKind::Bool => row
                .try_get::<Option<i32>, _>(column.name)
                .ok()
                .flatten()
                .map_or(Value::Null, |v| Value::Bool(v != 0)),
            ColumnKind::Json => row
                .try_get::<Option<String>, _>(column.name)
                .ok()
                .flatten()
                .map_or(Value::Null, |s| parse_json(&s)),
        };
        record.insert(column.name.to_string(), value);
    }

    for stamp in ["created_at", "updated_at"] {
        let value: String = row.get(stamp);
        record.insert(stamp.to_string(), Value::String(value));
    }
    record
}

fn parse_json(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or(Value::Null)
}
