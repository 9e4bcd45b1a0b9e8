use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use polars::prelude::*;
use serde::Serialize;

use crate::values::FieldValue;

/// Content digest of a frame: column names, dtypes and every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_frame(frame: &DataFrame) -> PolarsResult<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(frame.width() as u64).to_le_bytes());
        hasher.update(&(frame.height() as u64).to_le_bytes());

        for column in frame.get_columns() {
            hash_str(&mut hasher, column.name().as_str());
            hash_str(&mut hasher, &column.dtype().to_string());
            let series = column.as_materialized_series();
            for idx in 0..series.len() {
                hash_value(&mut hasher, &FieldValue::from(series.get(idx)?));
            }
        }

        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Order-sensitive digest of several fingerprints.
    pub fn combine(parts: &[Fingerprint]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&part.0);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn hash_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_value(hasher: &mut blake3::Hasher, value: &FieldValue) {
    match value {
        FieldValue::Null => {
            hasher.update(&[0]);
        }
        FieldValue::Bool(value) => {
            hasher.update(&[1, u8::from(*value)]);
        }
        FieldValue::Int(value) => {
            hasher.update(&[2]);
            hasher.update(&value.to_le_bytes());
        }
        FieldValue::Float(value) => {
            hasher.update(&[3]);
            hasher.update(&value.to_bits().to_le_bytes());
        }
        FieldValue::Text(value) => {
            hasher.update(&[4]);
            hash_str(hasher, value);
        }
    }
}

/// Identity of one loaded snapshot of the station store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SnapshotKey {
    pub store: String,
    pub version: u64,
}

impl SnapshotKey {
    pub fn new(store: impl Into<String>, version: u64) -> Self {
        Self {
            store: store.into(),
            version,
        }
    }

    /// Key for a reload of the same store.
    pub fn next(&self) -> Self {
        Self::new(self.store.clone(), self.version + 1)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.store, self.version)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Process-lifetime memo. Entries live until invalidated or cleared; the
/// memo knows nothing about changes in the store.
#[derive(Debug)]
pub struct Memo<K, V> {
    entries: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: Eq + Hash, V: Clone> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Cached value for `key`, computing and storing it on a miss. Failed
    /// computations are not cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(value.clone());
        }
        self.misses += 1;
        let value = compute()?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}
