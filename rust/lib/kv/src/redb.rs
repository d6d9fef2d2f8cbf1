use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use tracing::debug;

use crate::error::KVError;
use crate::traits::{KVRead, KVStore, KVTxn};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage<E: std::fmt::Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

/// Collect every entry of a key range that still starts with `prefix`.
fn collect_prefix(
    iter: redb::Range<'_, &'static str, &'static [u8]>,
    prefix: &str,
) -> Result<Vec<(String, Vec<u8>)>, KVError> {
    let mut results = Vec::new();
    for entry in iter {
        let (key, value) = entry.map_err(storage)?;
        let key = key.value().to_string();
        if !key.starts_with(prefix) {
            break;
        }
        results.push((key, value.value().to_vec()));
    }
    Ok(results)
}

/// RedbStore is a KVStore implementation backed by redb: one writer at a time,
/// snapshot readers.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Ensure the table exists so snapshots can open it.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        debug!("opened redb store at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        self.snapshot()?.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut txn = self.begin()?;
        txn.set(key, value)?;
        txn.commit()
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let mut txn = self.begin()?;
        txn.delete(key)?;
        txn.commit()
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        self.snapshot()?.scan(prefix)
    }

    fn begin(&self) -> Result<Box<dyn KVTxn + '_>, KVError> {
        let txn = self.db.begin_write().map_err(storage)?;
        Ok(Box::new(RedbTxn { txn }))
    }

    fn snapshot(&self) -> Result<Box<dyn KVRead + '_>, KVError> {
        let txn = self.db.begin_read().map_err(storage)?;
        Ok(Box::new(RedbSnapshot { txn }))
    }
}

/// A redb write transaction. Dropping it uncommitted aborts it.
struct RedbTxn {
    txn: WriteTransaction,
}

impl KVRead for RedbTxn {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let table = self.txn.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let table = self.txn.open_table(TABLE).map_err(storage)?;
        let iter = table.range(prefix..).map_err(storage)?;
        collect_prefix(iter, prefix)
    }
}

impl KVTxn for RedbTxn {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut table = self.txn.open_table(TABLE).map_err(storage)?;
        table.insert(key, value).map_err(storage)?;
        Ok(())
    }

    fn insert_new(&mut self, key: &str, value: &[u8]) -> Result<bool, KVError> {
        let mut table = self.txn.open_table(TABLE).map_err(storage)?;
        if table.get(key).map_err(storage)?.is_some() {
            return Ok(false);
        }
        table.insert(key, value).map_err(storage)?;
        Ok(true)
    }

    fn delete(&mut self, key: &str) -> Result<bool, KVError> {
        let mut table = self.txn.open_table(TABLE).map_err(storage)?;
        let removed = table.remove(key).map_err(storage)?.is_some();
        Ok(removed)
    }

    fn commit(self: Box<Self>) -> Result<(), KVError> {
        let RedbTxn { txn } = *self;
        txn.commit().map_err(storage)
    }
}

/// A redb read transaction pinned to the state at the time it was opened.
struct RedbSnapshot {
    txn: ReadTransaction,
}

impl KVRead for RedbSnapshot {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let table = self.txn.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let table = self.txn.open_table(TABLE).map_err(storage)?;
        let iter = table.range(prefix..).map_err(storage)?;
        collect_prefix(iter, prefix)
    }
}
