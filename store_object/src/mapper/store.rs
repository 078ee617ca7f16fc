use crate::errors::{RecordError, StoreError};
use crate::record::{Properties, Record, RecordKind};
use async_trait::async_trait;
use type_mapping::SqlValue;

/// Operations offered for one table of records of kind `K`
#[async_trait]
pub trait RecordStore<K: RecordKind>: Send + Sync {
    fn table_name(&self) -> &str;

    /// Insert `record`. A row that already exists is absorbed by
    /// `ON CONFLICT DO NOTHING` and yields `None`.
    async fn insert(
        &self,
        record: Record<K>,
        forced_id: Option<SqlValue>,
    ) -> Result<Option<Record<K>>, StoreError>;

    /// First row whose `where_column` matches the record's value
    async fn select(&self, record: Record<K>, where_column: &str) -> Result<Option<Record<K>>, StoreError>;

    /// Every row whose `where_column` matches the record's value
    async fn select_all(&self, record: Record<K>, where_column: &str) -> Result<Vec<Record<K>>, StoreError>;

    /// Write every set, writable attribute to the row matched by
    /// `where_column`. Merge changes onto a previously selected record
    /// first; unset attributes are left untouched in the database.
    async fn update(&self, record: Record<K>, where_column: &str) -> Result<Option<Record<K>>, StoreError>;

    /// Delete matching rows, returning how many went
    async fn delete(&self, record: Record<K>, where_column: &str) -> Result<u64, StoreError>;

    /// Attribute listing of `K`, without touching the database
    fn get_properties(&self) -> Properties;

    /// Fresh record populated from `values`
    fn get_record<I, S, V>(&self, values: I) -> Result<Record<K>, RecordError>
    where
        Self: Sized,
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<SqlValue>,
    {
        Record::with_values(values)
    }

    /// Records for a set of initial values where some values are lists.
    ///
    /// Scalar values are shared by every record; each element of each list
    /// value yields one record. Without list values this is a single record.
    fn get_records<I, S>(&self, values: I) -> Result<Vec<Record<K>>, RecordError>
    where
        Self: Sized,
        I: IntoIterator<Item = (S, SqlValue)>,
        S: AsRef<str>,
    {
        let mut base = Record::new();
        let mut lists = Vec::new();
        for (name, value) in values {
            match value {
                SqlValue::Array(items) => lists.push((name, items)),
                scalar => base.set(name.as_ref(), scalar)?,
            }
        }

        let mut records = Vec::new();
        for (name, items) in lists {
            for item in items {
                let mut record = base.clone();
                record.set(name.as_ref(), item)?;
                records.push(record);
            }
        }
        if records.is_empty() {
            records.push(base);
        }
        Ok(records)
    }
}
