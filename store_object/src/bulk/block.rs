//! Multi-row statements
//!
//! Each block renders one statement for a slice of rows. [`Block`] and
//! [`BlockUpdate`] inline values as escaped SQL literals; [`BlockList`]
//! binds them as `$n` parameters.

use super::template::{BulkRow, Fields, RowTemplate};
use crate::errors::{BulkError, StoreError};
use crate::executor::DatabaseExecutor;
use crate::sql_builder::ParamCounter;
use crate::validation::ValidatedFieldName;
use async_trait::async_trait;
use type_mapping::{RowMap, SqlValue};

/// Postgres accepts at most this many bind parameters per statement
pub const MAX_PARAMETERS: usize = 65535;

const ON_CONFLICT: &str = " ON CONFLICT DO NOTHING ";
const RETURNING_ID: &str = " RETURNING id ";

/// A rendered block ready to run
#[async_trait]
pub trait BulkStatement: Sync {
    /// SQL text and bound arguments
    fn statement(&self) -> (String, Vec<SqlValue>);

    /// Whether the statement returns rows
    fn returns_rows(&self) -> bool;

    fn row_count(&self) -> usize;

    /// Run the statement. Returned rows are empty unless the block was
    /// built with `ret`.
    async fn execute(&self, executor: &dyn DatabaseExecutor) -> Result<Vec<RowMap>, StoreError> {
        let (sql, args) = self.statement();
        if self.returns_rows() {
            Ok(executor.fetch_all(&sql, &args).await?)
        } else {
            executor.modify(&sql, &args).await?;
            Ok(Vec::new())
        }
    }
}

fn check_not_empty(rows: &[BulkRow]) -> Result<(), BulkError> {
    if rows.is_empty() {
        return Err(BulkError::InvalidBlockSize);
    }
    Ok(())
}

/// `<header> values <rows> ON CONFLICT DO NOTHING [RETURNING id]`
#[derive(Debug, Clone)]
pub struct Block<'a> {
    header: &'a str,
    template: RowTemplate,
    rows: &'a [BulkRow],
    ret: bool,
}

impl<'a> Block<'a> {
    /// `header` is the statement head, e.g. `INSERT INTO t (a, b)`;
    /// `template` spells one row, e.g. `({}, {})` or `({a}, {b})`.
    pub fn new(header: &'a str, template: &str, rows: &'a [BulkRow], ret: bool) -> Result<Self, BulkError> {
        Self::with_template(header, RowTemplate::parse(template)?, rows, ret)
    }

    pub(crate) fn with_template(
        header: &'a str,
        template: RowTemplate,
        rows: &'a [BulkRow],
        ret: bool,
    ) -> Result<Self, BulkError> {
        check_not_empty(rows)?;
        template.check_rows(rows)?;
        Ok(Self {
            header,
            template,
            rows,
            ret,
        })
    }

    pub fn sql(&self) -> String {
        let values: Vec<String> = self
            .rows
            .iter()
            .map(|row| self.template.render_literals(row))
            .collect();

        let mut sql = format!("{} values {}{}", self.header, values.join(","), ON_CONFLICT);
        if self.ret {
            sql.push_str(RETURNING_ID);
        }
        sql
    }
}

#[async_trait]
impl BulkStatement for Block<'_> {
    fn statement(&self) -> (String, Vec<SqlValue>) {
        (self.sql(), Vec::new())
    }

    fn returns_rows(&self) -> bool {
        self.ret
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Bulk update joining the target table against a `VALUES` list:
///
/// ```text
/// <header> update_tb  SET c=data.c  FROM  (VALUES ...)  AS data(cols) WHERE update_tb.k=data.k
/// ```
#[derive(Debug, Clone)]
pub struct BlockUpdate<'a> {
    header: &'a str,
    template: RowTemplate,
    rows: &'a [BulkRow],
    keys: Vec<String>,
    update_cols: Vec<String>,
    ret: bool,
}

impl<'a> BlockUpdate<'a> {
    /// `header` is typically `UPDATE t`. Rows must be named. `keys` pick the
    /// join columns; `update_cols` defaults to every template column that
    /// is not a key.
    pub fn new(
        header: &'a str,
        template: &str,
        rows: &'a [BulkRow],
        keys: &[&str],
        update_cols: Option<&[&str]>,
        ret: bool,
    ) -> Result<Self, BulkError> {
        Self::with_template(header, RowTemplate::parse(template)?, rows, keys, update_cols, ret)
    }

    pub(crate) fn with_template(
        header: &'a str,
        template: RowTemplate,
        rows: &'a [BulkRow],
        keys: &[&str],
        update_cols: Option<&[&str]>,
        ret: bool,
    ) -> Result<Self, BulkError> {
        check_not_empty(rows)?;
        if rows.iter().any(|row| row.is_named() != rows[0].is_named()) {
            return Err(BulkError::MixedRows);
        }
        if !rows[0].is_named() {
            return Err(BulkError::PositionalUpdate);
        }
        if !matches!(template.fields(), Fields::Named { .. }) {
            return Err(BulkError::Template(
                "bulk update template must use named fields".to_string(),
            ));
        }
        template.check_rows(rows)?;

        let columns = template.columns();
        for column in columns {
            ValidatedFieldName::new(column).map_err(|e| BulkError::Template(e.to_string()))?;
        }

        if keys.is_empty() {
            return Err(BulkError::InvalidKey("at least one key column is required".to_string()));
        }
        if let Some(key) = keys.iter().find(|key| !columns.iter().any(|c| c == *key)) {
            return Err(BulkError::InvalidKey(format!("{} is not a template column", key)));
        }

        let update_cols: Vec<String> = match update_cols {
            Some(cols) => {
                if let Some(col) = cols.iter().find(|col| !columns.iter().any(|c| c == *col)) {
                    return Err(BulkError::InvalidKey(format!("{} is not a template column", col)));
                }
                cols.iter().map(|col| col.to_string()).collect()
            }
            None => columns
                .iter()
                .filter(|c| !keys.contains(&c.as_str()))
                .cloned()
                .collect(),
        };
        if update_cols.is_empty() {
            return Err(BulkError::InvalidKey("no columns left to update".to_string()));
        }

        Ok(Self {
            header,
            template,
            rows,
            keys: keys.iter().map(|key| key.to_string()).collect(),
            update_cols,
            ret,
        })
    }

    pub fn sql(&self) -> String {
        let set_list: Vec<String> = self
            .update_cols
            .iter()
            .map(|col| format!("{col}=data.{col}"))
            .collect();
        let values: Vec<String> = self
            .rows
            .iter()
            .map(|row| self.template.render_literals(row))
            .collect();
        let conditions: Vec<String> = self
            .keys
            .iter()
            .map(|key| format!("update_tb.{key}=data.{key}"))
            .collect();

        let mut sql = format!(
            "{} update_tb  SET {}  FROM  (VALUES {})  AS data({}) WHERE {}",
            self.header,
            set_list.join(","),
            values.join(","),
            self.template.columns().join(","),
            conditions.join(" AND ")
        );
        if self.ret {
            let returning: Vec<String> = self
                .template
                .columns()
                .iter()
                .map(|col| format!("update_tb.{col}"))
                .collect();
            sql.push_str(" RETURNING ");
            sql.push_str(&returning.join(","));
        }
        sql
    }
}

#[async_trait]
impl BulkStatement for BlockUpdate<'_> {
    fn statement(&self) -> (String, Vec<SqlValue>) {
        (self.sql(), Vec::new())
    }

    fn returns_rows(&self) -> bool {
        self.ret
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// `<header> values <rows>` with every value bound as a parameter. No
/// conflict handling.
#[derive(Debug, Clone)]
pub struct BlockList<'a> {
    header: &'a str,
    template: RowTemplate,
    rows: &'a [BulkRow],
    ret: bool,
}

impl<'a> BlockList<'a> {
    pub fn new(header: &'a str, template: &str, rows: &'a [BulkRow], ret: bool) -> Result<Self, BulkError> {
        Self::with_template(header, RowTemplate::parse(template)?, rows, ret)
    }

    pub(crate) fn with_template(
        header: &'a str,
        template: RowTemplate,
        rows: &'a [BulkRow],
        ret: bool,
    ) -> Result<Self, BulkError> {
        check_not_empty(rows)?;
        template.check_rows(rows)?;

        let count = template.placeholder_count() * rows.len();
        if count > MAX_PARAMETERS {
            return Err(BulkError::TooManyParameters {
                count,
                limit: MAX_PARAMETERS,
            });
        }
        Ok(Self {
            header,
            template,
            rows,
            ret,
        })
    }
}

#[async_trait]
impl BulkStatement for BlockList<'_> {
    fn statement(&self) -> (String, Vec<SqlValue>) {
        let mut params = ParamCounter::new();
        let mut args = Vec::with_capacity(self.template.placeholder_count() * self.rows.len());
        let values: Vec<String> = self
            .rows
            .iter()
            .map(|row| self.template.render_params(row, &mut params, &mut args))
            .collect();

        let mut sql = format!("{} values {}", self.header, values.join(","));
        if self.ret {
            sql.push_str(RETURNING_ID);
        }
        (sql, args)
    }

    fn returns_rows(&self) -> bool {
        self.ret
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}
