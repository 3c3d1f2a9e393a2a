//! Storage engine implementation.

use super::key;
use super::{Row, StorageConfig};
use crate::catalog::{TableDef, CREATED_ON, UPDATED_ON};
use crate::error::Error;
use serde_json::Value;
use sled::transaction::{
    abort, ConflictableTransactionError, TransactionError, Transactional, TransactionalTree,
};
use sled::{Db, Tree};
use tracing::{debug, warn};

/// Tree name prefix for table rows.
const TABLE_PREFIX: &str = "table:";

/// Tree name prefix for secondary indexes.
const INDEX_PREFIX: &str = "index:";

type TxResult<T> = Result<T, ConflictableTransactionError<Error>>;

/// A sled-backed row store driven by table definitions.
///
/// Each table lives in its own tree keyed by encoded primary key, and each
/// secondary index in a tree keyed by `index values, separator, primary key`.
/// Every write touches the row tree and all index trees of its table in one
/// sled transaction.
pub struct StorageEngine {
    /// The underlying sled database.
    db: Db,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        Ok(Self { db })
    }

    /// Check if the database was recovered from a previous run.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Insert a new row.
    ///
    /// Missing audit timestamps are stamped with the current time. Fails with
    /// [`Error::PrimaryKeyViolation`] if a row with the same key exists.
    pub fn insert(&self, table: &TableDef, mut row: Row) -> Result<Row, Error> {
        let now = Value::from(key::current_timestamp());
        stamp_if_missing(&mut row, CREATED_ON, &now);
        stamp_if_missing(&mut row, UPDATED_ON, &now);
        validate_row(table, &row)?;

        let pk = row_key(table, &row)?;
        let bytes = serde_json::to_vec(&row)?;
        let entries = index_entries(table, &pk, &row);

        self.transact(table, |tx| {
            if tx.rows.get(pk.as_slice())?.is_some() {
                let key = key::display(table.primary_key.fields().iter().filter_map(|f| row.get(f)));
                warn!(table = %table.name, key = %key, "Rejected duplicate primary key");
                return abort(Error::PrimaryKeyViolation {
                    table: table.name.clone(),
                    key,
                });
            }

            tx.rows.insert(pk.as_slice(), bytes.as_slice())?;
            tx.index(&entries, &pk)
        })?;

        debug!(table = %table.name, "Inserted row");
        Ok(row)
    }

    /// Get a row by its primary-key values, in key order.
    pub fn get(&self, table: &TableDef, key_values: &[Value]) -> Result<Option<Row>, Error> {
        let pk = self.key_from_values(table, key_values)?;
        self.get_encoded(table, &pk)
    }

    /// All rows of a table in primary-key order.
    pub fn scan(&self, table: &TableDef) -> Result<Vec<Row>, Error> {
        self.table_tree(table)?
            .iter()
            .values()
            .map(|bytes| -> Result<Row, Error> { Ok(serde_json::from_slice(&bytes?)?) })
            .collect()
    }

    /// Rows whose `field` equals `value`, in primary-key order.
    ///
    /// Uses a secondary index led by `field` when one is declared.
    pub fn find_by(&self, table: &TableDef, field: &str, value: &Value) -> Result<Vec<Row>, Error> {
        if table.get_field(field).is_none() {
            return Err(Error::invalid_row(
                &table.name,
                format!("unknown field '{field}'"),
            ));
        }

        if let Some(index) = table.index_on(field) {
            let Some(prefix) = key::prefix(value) else {
                return Ok(Vec::new());
            };
            let tree = self.index_tree(table, &index.name)?;
            let mut rows = Vec::new();
            for entry in tree.scan_prefix(prefix) {
                let (_, pk) = entry?;
                if let Some(row) = self.get_encoded(table, &pk)? {
                    // the index is read outside the row's transaction
                    if row.get(field) == Some(value) {
                        rows.push(row);
                    }
                }
            }
            return Ok(rows);
        }

        Ok(self
            .scan(table)?
            .into_iter()
            .filter(|row| row.get(field) == Some(value))
            .collect())
    }

    /// Merge `changes` into the existing row with the same key.
    ///
    /// `createdOn` is preserved and `updatedOn` refreshed. Returns `None` if
    /// no row has that key.
    pub fn update(&self, table: &TableDef, changes: Row) -> Result<Option<Row>, Error> {
        let pk = row_key(table, &changes)?;
        let now = Value::from(key::current_timestamp());

        let updated = self.transact(table, |tx| {
            let Some(existing) = tx.read(&pk)? else {
                return Ok(None);
            };

            let merged = merge(&existing, &changes, &now);
            validate_row(table, &merged).map_err(ConflictableTransactionError::Abort)?;
            let bytes = serde_json::to_vec(&merged).map_err(aborted)?;

            tx.unindex(&index_entries(table, &pk, &existing))?;
            tx.rows.insert(pk.as_slice(), bytes)?;
            tx.index(&index_entries(table, &pk, &merged), &pk)?;
            Ok(Some(merged))
        })?;

        if updated.is_some() {
            debug!(table = %table.name, "Updated row");
        }
        Ok(updated)
    }

    /// Delete a row by its primary-key values. Returns the removed row.
    pub fn delete(&self, table: &TableDef, key_values: &[Value]) -> Result<Option<Row>, Error> {
        let pk = self.key_from_values(table, key_values)?;

        let removed = self.transact(table, |tx| {
            let Some(row) = tx.read(&pk)? else {
                return Ok(None);
            };

            tx.rows.remove(pk.as_slice())?;
            tx.unindex(&index_entries(table, &pk, &row))?;
            Ok(Some(row))
        })?;

        if removed.is_some() {
            debug!(table = %table.name, "Deleted row");
        }
        Ok(removed)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Run `f` in one transaction over the table's row tree and index trees.
    ///
    /// `f` may run more than once on conflict.
    fn transact<T>(
        &self,
        table: &TableDef,
        f: impl Fn(&TableTx<'_>) -> TxResult<T>,
    ) -> Result<T, Error> {
        let mut trees = Vec::with_capacity(table.indexes.len() + 1);
        trees.push(self.table_tree(table)?);
        for index in &table.indexes {
            trees.push(self.index_tree(table, &index.name)?);
        }

        trees[..]
            .transaction(|txs| match txs.split_first() {
                Some((rows, indexes)) => f(&TableTx { rows, indexes }),
                None => abort(Error::UnknownEntity(table.name.clone())),
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => Error::Storage(e),
            })
    }

    fn table_tree(&self, table: &TableDef) -> Result<Tree, Error> {
        Ok(self.db.open_tree(format!("{TABLE_PREFIX}{}", table.name))?)
    }

    fn index_tree(&self, table: &TableDef, index: &str) -> Result<Tree, Error> {
        Ok(self
            .db
            .open_tree(format!("{INDEX_PREFIX}{}:{index}", table.name))?)
    }

    fn get_encoded(&self, table: &TableDef, pk: &[u8]) -> Result<Option<Row>, Error> {
        match self.table_tree(table)?.get(pk)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn key_from_values(&self, table: &TableDef, values: &[Value]) -> Result<Vec<u8>, Error> {
        let expected = table.primary_key.fields().len();
        if values.len() != expected {
            return Err(Error::invalid_row(
                &table.name,
                format!("expected {expected} key values, got {}", values.len()),
            ));
        }
        key::encode(values)
            .ok_or_else(|| Error::invalid_row(&table.name, "key values must be text or integers"))
    }
}

/// A table's trees inside a transaction. `indexes` follows `TableDef::indexes`.
struct TableTx<'t> {
    rows: &'t TransactionalTree,
    indexes: &'t [TransactionalTree],
}

impl TableTx<'_> {
    fn read(&self, pk: &[u8]) -> TxResult<Option<Row>> {
        match self.rows.get(pk)? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(aborted),
            None => Ok(None),
        }
    }

    fn index(&self, entries: &[Option<Vec<u8>>], pk: &[u8]) -> TxResult<()> {
        for (tree, entry) in self.indexes.iter().zip(entries) {
            if let Some(entry) = entry {
                tree.insert(entry.as_slice(), pk)?;
            }
        }
        Ok(())
    }

    fn unindex(&self, entries: &[Option<Vec<u8>>]) -> TxResult<()> {
        for (tree, entry) in self.indexes.iter().zip(entries) {
            if let Some(entry) = entry {
                tree.remove(entry.as_slice())?;
            }
        }
        Ok(())
    }
}

fn aborted(e: impl Into<Error>) -> ConflictableTransactionError<Error> {
    ConflictableTransactionError::Abort(e.into())
}

/// One entry per declared index, in declaration order.
fn index_entries(table: &TableDef, pk: &[u8], row: &Row) -> Vec<Option<Vec<u8>>> {
    table
        .indexes
        .iter()
        .map(|index| index_key(index.fields.iter().map(|f| row.get(f)), pk))
        .collect()
}

/// Build `index values, separator, pk`. Rows with a null indexed value are not indexed.
fn index_key<'a>(values: impl Iterator<Item = Option<&'a Value>>, pk: &[u8]) -> Option<Vec<u8>> {
    let values: Option<Vec<&Value>> = values.collect();
    let mut entry = key::encode(values?)?;
    entry.extend_from_slice(key::SEPARATOR);
    entry.extend_from_slice(pk);
    Some(entry)
}

fn merge(existing: &Row, changes: &Row, now: &Value) -> Row {
    let mut merged = existing.clone();
    merged.extend(changes.clone());
    if let Some(created) = existing.get(CREATED_ON) {
        merged.insert(CREATED_ON.to_string(), created.clone());
    }
    merged.insert(UPDATED_ON.to_string(), now.clone());
    merged
}

fn stamp_if_missing(row: &mut Row, field: &str, now: &Value) {
    if row.get(field).map_or(true, Value::is_null) {
        row.insert(field.to_string(), now.clone());
    }
}

fn row_key(table: &TableDef, row: &Row) -> Result<Vec<u8>, Error> {
    let values = table
        .primary_key
        .fields()
        .iter()
        .map(|f| {
            row.get(f)
                .filter(|v| !v.is_null())
                .ok_or_else(|| Error::invalid_row(&table.name, format!("missing key field '{f}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    key::encode(values)
        .ok_or_else(|| Error::invalid_row(&table.name, "key values must be text or integers"))
}

/// Check a row against the table's type tags and nullability.
fn validate_row(table: &TableDef, row: &Row) -> Result<(), Error> {
    if let Some(unknown) = row.keys().find(|name| table.get_field(name).is_none()) {
        return Err(Error::invalid_row(
            &table.name,
            format!("unknown field '{unknown}'"),
        ));
    }

    for field in table.fields.all() {
        match row.get(&field.name) {
            None | Some(Value::Null) => {
                if !field.nullable {
                    return Err(Error::invalid_row(
                        &table.name,
                        format!("field '{}' must not be null", field.name),
                    ));
                }
            }
            Some(value) if !field.field_type.accepts(value) => {
                return Err(Error::invalid_row(
                    &table.name,
                    format!("field '{}' expects {}", field.name, field.field_type.tag()),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
