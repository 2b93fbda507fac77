//! Store interface shared by the user directory and the token service.

use crate::errors::{Result, StorageError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Column-family key-value store.
///
/// Keys and values are bincode encoded. Prefix scans compare encoded bytes,
/// so a tuple key `(user_id, hash)` can be scanned by `user_id` alone.
///
/// `take`, `put_if_absent` and `compare_and_swap` are each a single atomic
/// step against the store. Flows that must not race (consuming OAuth state,
/// rotating a refresh record, claiming a provider identity) are built on
/// them rather than on a `get` followed by a `put`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// `Ok(None)` when the key is absent
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned;

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync;

    /// Deleting an absent key is not an error
    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync;

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync;

    /// Every entry whose encoded key starts with the encoded `prefix`,
    /// returned with its raw key
    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned;

    /// Read and delete in one step.
    ///
    /// Of any number of concurrent callers for the same key, at most one
    /// observes `Some`.
    async fn take<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned;

    /// `Ok(false)` if the key already existed; nothing is written then
    async fn put_if_absent<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<bool>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync;

    /// Replace the value at `key` with `new` only if it currently encodes
    /// to the same bytes as `expected`. A missing key never matches.
    async fn compare_and_swap<K, V>(&self, cf: &str, key: &K, expected: &V, new: &V) -> Result<bool>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync;

    /// Start a write batch; nothing is written unless it is committed
    fn batch(&self) -> Box<dyn Batch>;
}

/// Multi-key write applied atomically on commit.
///
/// Object safe, so it deals in encoded bytes; [`BatchExt`] adds the typed
/// `put` and `delete`.
#[async_trait]
pub trait Batch: Send {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Typed helpers over [`Batch`]
pub trait BatchExt: Batch {
    fn put<K, V>(&mut self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        self.put_raw(cf, serialize_key(key)?, serialize_value(value)?)
    }

    fn delete<K>(&mut self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize,
    {
        self.delete_raw(cf, serialize_key(key)?)
    }
}

impl<T: Batch + ?Sized> BatchExt for T {}

pub(crate) fn serialize_key<K: Serialize>(key: &K) -> Result<Vec<u8>> {
    bincode::serialize(key).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub(crate) fn serialize_value<V: Serialize>(value: &V) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub(crate) fn deserialize_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<V> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Deserialization(e.to_string()))
}
