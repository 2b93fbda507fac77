//! RocksDB storage implementation.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, Batch, Storage},
};
use async_trait::async_trait;
use rocksdb::{Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use tempfile::TempDir;
use tracing::debug;

/// RocksDB storage implementation
///
/// Every write goes through a single in-process lock so that the
/// read-modify-write primitives (`take`, `put_if_absent`,
/// `compare_and_swap`) are linearizable against plain writes.
pub struct RocksDbStorage {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
    // Held so test databases outlive their directory.
    _temp_dir: Option<TempDir>,
}

impl RocksDbStorage {
    /// Open RocksDB database at the specified path
    ///
    /// Creates all required column families if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Self::open_db(path.as_ref())?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            _temp_dir: None,
        })
    }

    /// Open RocksDB database in a fresh temporary directory
    ///
    /// This is public for use in other crates' test modules. The directory is
    /// removed when the storage is dropped.
    pub fn open_test() -> Result<Self> {
        let temp_dir = TempDir::new().map_err(StorageError::IoError)?;
        let db = Self::open_db(temp_dir.path())?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            _temp_dir: Some(temp_dir),
        })
    }

    fn open_db(path: &Path) -> Result<DB> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, all_column_families())
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!("Opened RocksDB at {:?}", path);

        Ok(db)
    }

    fn cf_handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned)
    }

    fn read_raw(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf_handle = self.cf_handle(cf)?;
        self.db
            .get_cf(cf_handle, key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn put_raw(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf_handle = self.cf_handle(cf)?;
        self.db
            .put_cf(cf_handle, key, value)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn delete_raw(&self, cf: &str, key: &[u8]) -> Result<()> {
        let cf_handle = self.cf_handle(cf)?;
        self.db
            .delete_cf(cf_handle, key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn locked_put(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let _guard = self.lock()?;
        self.put_raw(cf, key, value)
    }

    fn locked_delete(&self, cf: &str, key: &[u8]) -> Result<()> {
        let _guard = self.lock()?;
        self.delete_raw(cf, key)
    }

    fn locked_take(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock()?;
        let existing = self.read_raw(cf, key)?;
        if existing.is_some() {
            self.delete_raw(cf, key)?;
        }
        Ok(existing)
    }

    fn locked_put_if_absent(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<bool> {
        let _guard = self.lock()?;
        if self.read_raw(cf, key)?.is_some() {
            return Ok(false);
        }
        self.put_raw(cf, key, value)?;
        Ok(true)
    }

    fn locked_compare_and_swap(
        &self,
        cf: &str,
        key: &[u8],
        expected: &[u8],
        new: &[u8],
    ) -> Result<bool> {
        let _guard = self.lock()?;
        match self.read_raw(cf, key)? {
            Some(current) if current == expected => {
                self.put_raw(cf, key, new)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl Storage for RocksDbStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let key_bytes = serialize_key(key)?;

        match self.read_raw(cf, &key_bytes)? {
            Some(bytes) => {
                let value = deserialize_value(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;

        self.locked_put(cf, &key_bytes, &value_bytes)
    }

    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;

        self.locked_delete(cf, &key_bytes)
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;

        Ok(self.read_raw(cf, &key_bytes)?.is_some())
    }

    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let cf_handle = self.cf_handle(cf)?;
        let prefix_bytes = serialize_key(prefix)?;

        let mut results = Vec::new();

        // Seek to the prefix; no prefix extractor is configured
        let iter = self.db.iterator_cf(
            cf_handle,
            rocksdb::IteratorMode::From(&prefix_bytes, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::Database(e.to_string()))?;

            if key.starts_with(&prefix_bytes) {
                let deserialized_value = deserialize_value(&value)?;
                results.push((key.to_vec(), deserialized_value));
            } else {
                // Keys are sorted, so once we're past the prefix, we're done
                break;
            }
        }

        Ok(results)
    }

    async fn take<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let key_bytes = serialize_key(key)?;

        match self.locked_take(cf, &key_bytes)? {
            Some(bytes) => Ok(Some(deserialize_value(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_if_absent<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<bool>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;

        self.locked_put_if_absent(cf, &key_bytes, &value_bytes)
    }

    async fn compare_and_swap<K, V>(&self, cf: &str, key: &K, expected: &V, new: &V) -> Result<bool>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let expected_bytes = serialize_value(expected)?;
        let new_bytes = serialize_value(new)?;

        self.locked_compare_and_swap(cf, &key_bytes, &expected_bytes, &new_bytes)
    }

    fn batch(&self) -> Box<dyn Batch> {
        Box::new(RocksDbBatch {
            db: Arc::clone(&self.db),
            write_lock: Arc::clone(&self.write_lock),
            write_batch: WriteBatch::default(),
        })
    }
}

/// RocksDB batch implementation
pub struct RocksDbBatch {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
    write_batch: WriteBatch,
}

impl RocksDbBatch {
    fn write(db: &DB, write_lock: &Mutex<()>, write_batch: WriteBatch) -> Result<()> {
        let _guard = write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        db.write(write_batch)
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

#[async_trait]
impl Batch for RocksDbBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let cf_handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;

        self.write_batch.put_cf(cf_handle, &key, &value);

        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        let cf_handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;

        self.write_batch.delete_cf(cf_handle, &key);

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let RocksDbBatch {
            db,
            write_lock,
            write_batch,
        } = *self;

        Self::write(&db, &write_lock, write_batch)?;

        debug!("Batch committed successfully");
        Ok(())
    }
}
