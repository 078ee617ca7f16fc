//! Record kinds and a recording executor shared by unit tests

use crate::errors::RecordError;
use crate::executor::DatabaseExecutor;
use crate::record::Record;
use crate::record_kind;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use type_mapping::{FieldType, RowMap, SqlValue};

record_kind! {
    pub struct Business: BusinessField {
        Id("id", FieldType::Integer) [not_null, has_default, read_only];
        Username("username", FieldType::Text) [not_null];
        Password("password", FieldType::Text) [not_null];
        Email("email", FieldType::Text) [not_null];
        Phone("phone", FieldType::Text);
        FullAddress("full_address", FieldType::Text);
        HashRecovery("hash_recovery", FieldType::Text);
        BusinessRole("business_role", FieldType::Text);
        BusinessOwnerId("business_owner_id", FieldType::Integer) [not_null, has_default, read_only];
        Created("created", FieldType::Timestamp) [not_null, has_default];
    }
}

record_kind! {
    pub struct Session: SessionField {
        Id("id", FieldType::Text) [not_null];
        Modified("modified", FieldType::Timestamp);
        Lifetime("lifetime", FieldType::Integer);
        Data("data", FieldType::Text);
        BusinessId("business_id", FieldType::Integer);
        SetCookie("set_cookie", FieldType::Boolean) [not_null, has_default] = false;
    }
    impl {
        // The cookie flag is decided per response and never written
        fn to_db(mut record: Record<Self>) -> Result<Record<Self>, RecordError> {
            record.unset(SessionField::SetCookie);
            Ok(record)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    FetchOne,
    FetchAll,
    Modify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: CallKind,
    pub sql: String,
    pub args: Vec<SqlValue>,
}

/// In-memory executor that records every statement and replays queued
/// result sets in order
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    results: Mutex<VecDeque<Vec<RowMap>>>,
    fail_on_call: Option<usize>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `index`-th statement (zero based) with a protocol error
    pub fn failing_on(index: usize) -> Self {
        Self {
            fail_on_call: Some(index),
            ..Self::default()
        }
    }

    pub fn push_rows(&self, rows: Vec<RowMap>) {
        self.results.lock().unwrap().push_back(rows);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: CallKind, sql: &str, args: &[SqlValue]) -> Result<Vec<RowMap>, sqlx::Error> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(Call {
            kind,
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        if self.fail_on_call == Some(index) {
            return Err(sqlx::Error::Protocol("connection reset".to_string()));
        }
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }
}

#[async_trait]
impl DatabaseExecutor for RecordingExecutor {
    async fn fetch_one(&self, sql: &str, args: &[SqlValue]) -> Result<Option<RowMap>, sqlx::Error> {
        Ok(self.record(CallKind::FetchOne, sql, args)?.into_iter().next())
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<RowMap>, sqlx::Error> {
        self.record(CallKind::FetchAll, sql, args)
    }

    async fn modify(&self, sql: &str, args: &[SqlValue]) -> Result<u64, sqlx::Error> {
        self.record(CallKind::Modify, sql, args).map(|rows| rows.len() as u64)
    }
}

/// Row mapping from `(column, value)` pairs
pub fn row<I, V>(pairs: I) -> RowMap
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<SqlValue>,
{
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value.into()))
        .collect()
}
