use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnection};
use sqlx::query::Query;
use sqlx::Connection;
use tracing::debug;

use crate::config::SinkConfig;
use crate::record::FormattedRecord;
use crate::store::{Connector, LogStore, StoreError};

/// Opens dedicated MySQL connections for the sink using `sqlx`.
///
/// The connection is separate from whatever pool the application uses for
/// its own data, so log rows survive rolled back application transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

/// A single MySQL connection owned by the sink.
#[derive(Debug)]
pub struct MySqlStore {
    conn: MySqlConnection,
}

#[async_trait]
impl Connector for MySqlConnector {
    type Connection = MySqlStore;

    async fn connect(&self, config: &SinkConfig) -> Result<MySqlStore, StoreError> {
        let conn = MySqlConnection::connect(&config.connection_url())
            .await
            .map_err(|e| StoreError::Connect {
                address: config.address(),
                code: error_code(&e),
                source: Box::new(e),
            })?;

        debug!(address = %config.address(), "connected to log database");
        Ok(MySqlStore { conn })
    }
}

#[async_trait]
impl LogStore for MySqlStore {
    async fn insert(&mut self, table: &str, row: &FormattedRecord) -> Result<(), StoreError> {
        let sql = insert_statement(table, row.keys().map(String::as_str));
        let query = row.values().fold(sqlx::query(&sql), bind_value);

        query
            .execute(&mut self.conn)
            .await
            .map_err(|e| StoreError::Insert {
                table: table.to_string(),
                code: error_code(&e),
                source: Box::new(e),
            })?;
        Ok(())
    }
}

/// `INSERT INTO `table` (`a`, `b`) VALUES (?, ?)`; an empty row becomes
/// `INSERT INTO `table` () VALUES ()`, i.e. all column defaults.
fn insert_statement<'a>(table: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let columns: Vec<String> = columns.map(quote_identifier).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns.join(", "),
        placeholders
    )
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Nested values are stored as their JSON text.
        other => query.bind(other.to_string()),
    }
}

fn error_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_insert_with_placeholders() {
        let sql = insert_statement("system_log", ["level", "message"].into_iter());
        assert_eq!(
            sql,
            "INSERT INTO `system_log` (`level`, `message`) VALUES (?, ?)"
        );
    }

    #[test]
    fn empty_row_inserts_defaults() {
        let sql = insert_statement("system_log", std::iter::empty());
        assert_eq!(sql, "INSERT INTO `system_log` () VALUES ()");
    }

    #[test]
    fn escapes_backticks_in_identifiers() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
        let sql = insert_statement("logs", ["a`b"].into_iter());
        assert_eq!(sql, "INSERT INTO `logs` (`a``b`) VALUES (?)");
    }
}
