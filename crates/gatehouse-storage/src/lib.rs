//! # gatehouse-storage
//!
//! Storage abstraction layer for gatehouse using RocksDB.
//!
//! Keys and values are bincode-encoded. Besides plain reads and writes the
//! [`Storage`] trait exposes the three atomic primitives the credential
//! flows depend on: `take` (read and delete), `put_if_absent` and
//! `compare_and_swap`.

#![warn(clippy::all)]

pub mod column_families;
pub mod errors;
pub mod rocksdb_impl;
pub mod traits;

pub use column_families::*;
pub use errors::{Result, StorageError};
pub use rocksdb_impl::RocksDbStorage;
pub use traits::{Batch, BatchExt, Storage};
