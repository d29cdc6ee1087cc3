//! Creates and fills the sample `user_data` table from a CSV file.

use crate::sql::base::{adapter::SqlAdapter, dialect::Dialect, error::DbError};
use bigdecimal::BigDecimal;
use model::core::value::Value;
use serde::Deserialize;
use std::{path::Path, str::FromStr};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid age '{value}' for {email}")]
    InvalidAge { email: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

/// One line of the seed CSV (`name,email,age`).
#[derive(Debug, Clone, Deserialize)]
struct UserRecord {
    name: String,
    email: String,
    age: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: BigDecimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub skipped: u64,
}

pub fn user_table_ddl(dialect: &dyn Dialect, table: &str) -> String {
    let q = |ident: &str| dialect.quote_identifier(ident);
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} {} PRIMARY KEY, {} VARCHAR(100) NOT NULL, {} VARCHAR(100) NOT NULL, {} DECIMAL(5,2) NOT NULL)",
        dialect.quote_path(table),
        q("user_id"),
        dialect.uuid_type(),
        q("name"),
        q("email"),
        q("age"),
    )
}

pub async fn create_user_table(adapter: &dyn SqlAdapter, table: &str) -> Result<(), SeedError> {
    let ddl = user_table_ddl(adapter.dialect(), table);
    adapter.execute(&ddl, Vec::new()).await?;
    info!(table, "Table created or already exists");
    Ok(())
}

pub fn read_users(path: impl AsRef<Path>) -> Result<Vec<NewUser>, SeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    reader
        .deserialize::<UserRecord>()
        .map(|record| -> Result<NewUser, SeedError> {
            let record = record?;
            let age = BigDecimal::from_str(&record.age).map_err(|_| SeedError::InvalidAge {
                email: record.email.clone(),
                value: record.age.clone(),
            })?;
            Ok(NewUser {
                name: record.name,
                email: record.email,
                age,
            })
        })
        .collect()
}

/// Inserts every user whose email is not in `table` yet.
pub async fn insert_users(
    adapter: &dyn SqlAdapter,
    table: &str,
    users: &[NewUser],
) -> Result<SeedReport, SeedError> {
    let dialect = adapter.dialect();
    let table_sql = dialect.quote_path(table);
    let exists_sql = format!(
        "SELECT {} FROM {table_sql} WHERE {} = {} LIMIT 1",
        dialect.quote_identifier("user_id"),
        dialect.quote_identifier("email"),
        dialect.get_placeholder(0),
    );
    let insert_sql = format!(
        "INSERT INTO {table_sql} ({}, {}, {}, {}) VALUES ({}, {}, {}, {})",
        dialect.quote_identifier("user_id"),
        dialect.quote_identifier("name"),
        dialect.quote_identifier("email"),
        dialect.quote_identifier("age"),
        dialect.get_placeholder(0),
        dialect.get_placeholder(1),
        dialect.get_placeholder(2),
        dialect.get_placeholder(3),
    );

    let mut report = SeedReport::default();
    for user in users {
        let existing = adapter
            .query(table, &exists_sql, vec![Value::String(user.email.clone())])
            .await?;
        if !existing.is_empty() {
            debug!(email = %user.email, "User already exists, skipping");
            report.skipped += 1;
            continue;
        }

        adapter
            .execute(
                &insert_sql,
                vec![
                    Value::Uuid(Uuid::new_v4()),
                    Value::String(user.name.clone()),
                    Value::String(user.email.clone()),
                    Value::Decimal(user.age.clone()),
                ],
            )
            .await?;
        debug!(email = %user.email, "Inserted user");
        report.inserted += 1;
    }

    info!(
        table,
        inserted = report.inserted,
        skipped = report.skipped,
        "Seeding finished"
    );
    Ok(report)
}
