//! Generic mapper
//!
//! A [`Mapper`] runs insert, select, update and delete statements for one
//! table and one record kind. Statements are prepared synchronously from a
//! record (so invalid input never reaches the database) and then handed to a
//! [`DatabaseExecutor`]. [`CachedMapper`] adds a read-through cache in front
//! of `select`.

mod cached;
mod store;

pub use cached::CachedMapper;
pub use store::RecordStore;

use crate::errors::{RecordError, StoreError};
use crate::executor::DatabaseExecutor;
use crate::record::{Properties, Record, RecordKind};
use crate::sql_builder::{Operator, ParamCounter, SqlBuilder, Template};
use crate::validation::ValidatedTableName;
use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use type_mapping::{RowMap, SqlValue};

/// SQL text plus its positional arguments, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

/// Statement runner for one table
pub struct Mapper<K: RecordKind> {
    executor: Arc<dyn DatabaseExecutor>,
    table: ValidatedTableName,
    _kind: PhantomData<fn() -> K>,
}

impl<K: RecordKind> Mapper<K> {
    /// Bind `K` to `table_name`. Both the table name and every attribute
    /// name of `K` must be valid identifiers.
    pub fn new(executor: Arc<dyn DatabaseExecutor>, table_name: &str) -> Result<Self, StoreError> {
        let table = ValidatedTableName::new(table_name)?;
        K::schema().validate()?;
        Ok(Self {
            executor,
            table,
            _kind: PhantomData,
        })
    }

    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    pub fn executor(&self) -> &Arc<dyn DatabaseExecutor> {
        &self.executor
    }

    /// `INSERT ... ON CONFLICT DO NOTHING RETURNING <all columns>`.
    ///
    /// `forced_id` supplies an explicit `id` column value.
    pub fn prepare_insert(
        &self,
        record: Record<K>,
        forced_id: Option<SqlValue>,
    ) -> Result<Statement, StoreError> {
        let record = K::to_db(record)?;
        record.check_nulls()?;
        record.check_required()?;

        let mut builder = SqlBuilder::from_record(&record);
        if let Some(id) = forced_id {
            builder.add_insert("id", Template::Param, vec![id]);
        }

        let mut params = ParamCounter::new();
        let (columns, values, mut args) = builder.render_insert(&mut params);
        let (select, select_args) = builder.render_select("", &mut params);
        args.extend(select_args);

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES ON CONFLICT DO NOTHING RETURNING {}",
                self.table, select
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT DO NOTHING RETURNING {}",
                self.table, columns, values, select
            )
        };
        Ok(Statement { sql, args })
    }

    /// `SELECT <all columns> FROM <table> WHERE <where_column> IN (...)`
    pub fn prepare_select(&self, record: Record<K>, where_column: &str) -> Result<Statement, StoreError> {
        let record = K::to_db(record)?;
        record.check_nulls()?;

        let filter = self.filter_in(&record, where_column)?;
        let builder = SqlBuilder::from_record(&record);

        let mut params = ParamCounter::new();
        let (select, mut args) = builder.render_select("", &mut params);
        let (condition, where_args) = filter.render_where(" AND ", "", &mut params);
        args.extend(where_args);

        Ok(Statement {
            sql: format!("SELECT {} FROM {} WHERE {}", select, self.table, condition),
            args,
        })
    }

    /// `UPDATE <table> SET ... WHERE <where_column> = $n RETURNING <all columns>`
    pub fn prepare_update(&self, record: Record<K>, where_column: &str) -> Result<Statement, StoreError> {
        let record = K::to_db(record)?;
        record.check_nulls()?;

        let mut filter = SqlBuilder::new();
        match self.where_value(&record, where_column)? {
            SqlValue::Array(items) => filter.add_where(where_column, Operator::In, Template::List, items),
            value => filter.add_where(where_column, Operator::Eq, Template::Param, vec![value]),
        }
        let builder = SqlBuilder::from_record(&record);

        let mut params = ParamCounter::new();
        let (assignments, mut args) = builder.render_update("", &mut params);
        if assignments.is_empty() {
            return Err(StoreError::EmptyUpdate(self.table.to_string()));
        }
        let (condition, where_args) = filter.render_where(" AND ", "", &mut params);
        let (select, select_args) = builder.render_select("", &mut params);
        args.extend(where_args);
        args.extend(select_args);

        Ok(Statement {
            sql: format!(
                "UPDATE {} SET {} WHERE {} RETURNING {}",
                self.table, assignments, condition, select
            ),
            args,
        })
    }

    /// `DELETE FROM <table> WHERE <where_column> IN (...)`
    pub fn prepare_delete(&self, record: Record<K>, where_column: &str) -> Result<Statement, StoreError> {
        let record = K::to_db(record)?;
        let filter = self.filter_in(&record, where_column)?;
        let (condition, args) = filter.render_where(" AND ", "", &mut ParamCounter::new());
        Ok(Statement {
            sql: format!("DELETE FROM {} WHERE {}", self.table, condition),
            args,
        })
    }

    /// Run a prepared select and return the raw first row
    pub async fn fetch_row(&self, statement: &Statement) -> Result<Option<RowMap>, StoreError> {
        Ok(self
            .executor
            .fetch_one(&statement.sql, &statement.args)
            .await?)
    }

    /// Turn a returned row back into a record
    pub fn rehydrate(&self, row: RowMap) -> Result<Record<K>, RecordError> {
        K::to_user(Record::from_row(row))
    }

    fn where_value(&self, record: &Record<K>, column: &str) -> Result<SqlValue, StoreError> {
        if K::schema().position(column).is_none() {
            return Err(RecordError::UnknownAttribute {
                attribute: column.to_string(),
            }
            .into());
        }
        // A null anywhere in the filter would drop the whole condition and
        // leave `WHERE TRUE`
        match record.get(column) {
            None | Some(SqlValue::Null) => Err(self.missing_where_value(column)),
            Some(SqlValue::Array(items)) if items.iter().any(SqlValue::is_null) => {
                Err(self.missing_where_value(column))
            }
            Some(value) => Ok(value.clone()),
        }
    }

    fn missing_where_value(&self, column: &str) -> StoreError {
        StoreError::MissingWhereValue {
            table: self.table.to_string(),
            column: column.to_string(),
        }
    }

    fn filter_in(&self, record: &Record<K>, column: &str) -> Result<SqlBuilder, StoreError> {
        let values = match self.where_value(record, column)? {
            SqlValue::Array(items) => items,
            value => vec![value],
        };
        let mut filter = SqlBuilder::new();
        filter.add_where(column, Operator::In, Template::List, values);
        Ok(filter)
    }
}

#[async_trait]
impl<K: RecordKind> RecordStore<K> for Mapper<K> {
    fn table_name(&self) -> &str {
        self.table.as_str()
    }

    async fn insert(
        &self,
        record: Record<K>,
        forced_id: Option<SqlValue>,
    ) -> Result<Option<Record<K>>, StoreError> {
        let statement = self.prepare_insert(record, forced_id)?;
        tracing::debug!(
            "[INSERT] Table: {}, Args: {}",
            self.table,
            statement.args.len()
        );

        match self.fetch_row(&statement).await? {
            Some(row) => Ok(Some(self.rehydrate(row)?)),
            None => {
                tracing::debug!("[INSERT] Table: {}, row already present", self.table);
                Ok(None)
            }
        }
    }

    async fn select(&self, record: Record<K>, where_column: &str) -> Result<Option<Record<K>>, StoreError> {
        let statement = self.prepare_select(record, where_column)?;
        tracing::debug!(
            "[SELECT] Table: {}, Column: {}, Args: {}",
            self.table,
            where_column,
            statement.args.len()
        );

        match self.fetch_row(&statement).await? {
            Some(row) => Ok(Some(self.rehydrate(row)?)),
            None => Ok(None),
        }
    }

    async fn select_all(&self, record: Record<K>, where_column: &str) -> Result<Vec<Record<K>>, StoreError> {
        let statement = self.prepare_select(record, where_column)?;
        tracing::debug!(
            "[SELECT_ALL] Table: {}, Column: {}, Args: {}",
            self.table,
            where_column,
            statement.args.len()
        );

        let rows = self
            .executor
            .fetch_all(&statement.sql, &statement.args)
            .await?;
        rows.into_iter()
            .map(|row| self.rehydrate(row).map_err(StoreError::from))
            .collect()
    }

    async fn update(&self, record: Record<K>, where_column: &str) -> Result<Option<Record<K>>, StoreError> {
        let statement = self.prepare_update(record, where_column)?;
        tracing::debug!(
            "[UPDATE] Table: {}, Column: {}, Args: {}",
            self.table,
            where_column,
            statement.args.len()
        );

        match self.fetch_row(&statement).await? {
            Some(row) => Ok(Some(self.rehydrate(row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, record: Record<K>, where_column: &str) -> Result<u64, StoreError> {
        let statement = self.prepare_delete(record, where_column)?;
        let affected = self
            .executor
            .modify(&statement.sql, &statement.args)
            .await?;
        tracing::debug!(
            "[DELETE] Table: {}, Column: {}, Rows: {}",
            self.table,
            where_column,
            affected
        );
        Ok(affected)
    }

    fn get_properties(&self) -> Properties {
        Record::<K>::new().describe()
    }
}

impl<K: RecordKind> Clone for Mapper<K> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            table: self.table.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: RecordKind> fmt::Debug for Mapper<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("table", &self.table.as_str())
            .field("kind", &std::any::type_name::<K>())
            .finish()
    }
}
