//! Shared fixtures for integration tests

#![allow(dead_code)]

use rowhaus::prelude::*;
use std::collections::VecDeque;
use std::sync::Mutex;

record_kind! {
    pub struct Business: BusinessField {
        Id("id", FieldType::Integer) [not_null, has_default, read_only];
        Username("username", FieldType::Text) [not_null];
        Password("password", FieldType::Text) [not_null];
        Email("email", FieldType::Text) [not_null];
        Phone("phone", FieldType::Text);
        Created("created", FieldType::Timestamp) [not_null, has_default];
    }
}

/// Executor that logs statements and answers from a queue of result sets
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    statements: Mutex<Vec<(String, Vec<SqlValue>)>>,
    results: Mutex<VecDeque<Vec<RowMap>>>,
}

impl ScriptedExecutor {
    pub fn reply(&self, rows: Vec<RowMap>) {
        self.results.lock().unwrap().push_back(rows);
    }

    pub fn statements(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.statements.lock().unwrap().clone()
    }

    fn next(&self, sql: &str, args: &[SqlValue]) -> Vec<RowMap> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        self.results.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseExecutor for ScriptedExecutor {
    async fn fetch_one(&self, sql: &str, args: &[SqlValue]) -> Result<Option<RowMap>, sqlx::Error> {
        Ok(self.next(sql, args).into_iter().next())
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<RowMap>, sqlx::Error> {
        Ok(self.next(sql, args))
    }

    async fn modify(&self, sql: &str, args: &[SqlValue]) -> Result<u64, sqlx::Error> {
        Ok(self.next(sql, args).len() as u64)
    }
}

pub fn database_config() -> DatabaseConfig {
    DatabaseConfig::new(
        "localhost".to_string(),
        5432,
        "rowhaus".to_string(),
        "postgres".to_string(),
        "password".to_string(),
        1,
        5,
        30,
        600,
        3600,
    )
}

pub fn app_config(cache: CacheConfig) -> AppConfig {
    AppConfig {
        database: database_config(),
        cache,
        bulk: BulkConfig::new(2),
    }
}

pub fn business_row(id: i64, username: &str) -> RowMap {
    RowMap::from([
        ("id".to_string(), SqlValue::Integer(id)),
        ("username".to_string(), SqlValue::from(username)),
        ("email".to_string(), SqlValue::from(format!("{}@example.com", username))),
        ("phone".to_string(), SqlValue::Null),
    ])
}
