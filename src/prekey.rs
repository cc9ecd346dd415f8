// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stores for one-time and signed pre-key records.
//!
//! Both stores index opaque key-pair records by a caller-assigned numeric id. They are
//! structurally identical but live in strictly separate namespaces: ids are never shared and each
//! store mirrors into its own fixed key-file section.
use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::address::{PreKeyId, SignedPreKeyId};
use crate::buffer::KeyBuffer;
use crate::keyfile::{KeyFile, KeyFileError, decode_id, decode_record, encode_record};

/// Key-file section holding one-time pre-key records.
pub const PREKEYS_SECTION: &str = "prekeys";

/// Key-file section holding signed pre-key records.
pub const SIGNED_PREKEYS_SECTION: &str = "signed_prekeys";

/// Single-level index of numeric key id to record, mirrored under one fixed key-file section.
#[derive(Debug)]
struct NumericKeyStore<K> {
    records: HashMap<u32, KeyBuffer>,
    keyfile: K,
    section: &'static str,
}

impl<K> NumericKeyStore<K>
where
    K: KeyFile,
{
    fn new(keyfile: K, section: &'static str) -> Self {
        Self {
            records: HashMap::new(),
            keyfile,
            section,
        }
    }

    fn from_keyfile(keyfile: K, section: &'static str) -> Result<Self, KeyFileError> {
        let mut records = HashMap::new();
        for key in keyfile.keys(section) {
            let id = decode_id(section, &key)?;
            let value = keyfile
                .get(section, &key)
                .expect("enumerated key exists in key-file");
            records.insert(id, decode_record(section, &key, value)?);
        }
        Ok(Self {
            records,
            keyfile,
            section,
        })
    }

    fn load(&self, id: u32) -> Result<KeyBuffer, PreKeyStoreError> {
        self.records
            .get(&id)
            .cloned()
            .ok_or(PreKeyStoreError::InvalidKeyId(id))
    }

    fn store(&mut self, id: u32, record: &[u8]) -> Result<(), PreKeyStoreError> {
        self.keyfile
            .set(self.section, &id.to_string(), encode_record(record));
        self.keyfile.save()?;

        self.records.insert(id, KeyBuffer::from(record));
        debug!(section = self.section, id, "stored pre-key record");
        Ok(())
    }

    fn contains(&self, id: u32) -> bool {
        self.records.contains_key(&id)
    }

    /// Removes the record from the mirror and the index, returning whether the index held one.
    ///
    /// The mirror removal is issued even when the id is unknown in memory, matching the write
    /// path's rule that the durable form never lags behind the index.
    fn remove(&mut self, id: u32) -> Result<bool, PreKeyStoreError> {
        self.keyfile.remove(self.section, &id.to_string());
        self.keyfile.save()?;

        let removed = self.records.remove(&id).is_some();
        if removed {
            debug!(section = self.section, id, "removed pre-key record");
        }
        Ok(removed)
    }
}

/// Store for one-time pre-key records, mirrored under the [`PREKEYS_SECTION`] key-file section.
#[derive(Debug)]
pub struct MirroredPreKeyStore<K> {
    inner: NumericKeyStore<K>,
}

impl<K> MirroredPreKeyStore<K>
where
    K: KeyFile,
{
    pub fn new(keyfile: K) -> Self {
        Self {
            inner: NumericKeyStore::new(keyfile, PREKEYS_SECTION),
        }
    }

    /// Rebuilds the index from the `prekeys` section of a previously mirrored key-file.
    pub fn from_keyfile(keyfile: K) -> Result<Self, KeyFileError> {
        Ok(Self {
            inner: NumericKeyStore::from_keyfile(keyfile, PREKEYS_SECTION)?,
        })
    }

    /// Returns a copy of the pre-key record with this id.
    pub fn load(&self, id: PreKeyId) -> Result<KeyBuffer, PreKeyStoreError> {
        self.inner.load(id)
    }

    /// Inserts or replaces the record and makes it durable before returning.
    pub fn store(&mut self, id: PreKeyId, record: &[u8]) -> Result<(), PreKeyStoreError> {
        self.inner.store(id, record)
    }

    pub fn contains(&self, id: PreKeyId) -> bool {
        self.inner.contains(id)
    }

    /// Removes the record from memory and the mirror.
    ///
    /// Fails with [`PreKeyStoreError::InvalidKeyId`] when no record existed to remove.
    pub fn remove(&mut self, id: PreKeyId) -> Result<(), PreKeyStoreError> {
        match self.inner.remove(id)? {
            true => Ok(()),
            false => Err(PreKeyStoreError::InvalidKeyId(id)),
        }
    }

    pub fn keyfile(&self) -> &K {
        &self.inner.keyfile
    }
}

/// Store for signed pre-key records, mirrored under the [`SIGNED_PREKEYS_SECTION`] key-file
/// section.
#[derive(Debug)]
pub struct MirroredSignedPreKeyStore<K> {
    inner: NumericKeyStore<K>,
}

impl<K> MirroredSignedPreKeyStore<K>
where
    K: KeyFile,
{
    pub fn new(keyfile: K) -> Self {
        Self {
            inner: NumericKeyStore::new(keyfile, SIGNED_PREKEYS_SECTION),
        }
    }

    /// Rebuilds the index from the `signed_prekeys` section of a previously mirrored key-file.
    pub fn from_keyfile(keyfile: K) -> Result<Self, KeyFileError> {
        Ok(Self {
            inner: NumericKeyStore::from_keyfile(keyfile, SIGNED_PREKEYS_SECTION)?,
        })
    }

    /// Returns a copy of the signed pre-key record with this id.
    pub fn load(&self, id: SignedPreKeyId) -> Result<KeyBuffer, PreKeyStoreError> {
        self.inner.load(id)
    }

    /// Inserts or replaces the record and makes it durable before returning.
    pub fn store(&mut self, id: SignedPreKeyId, record: &[u8]) -> Result<(), PreKeyStoreError> {
        self.inner.store(id, record)
    }

    pub fn contains(&self, id: SignedPreKeyId) -> bool {
        self.inner.contains(id)
    }

    /// Removes the record from memory and the mirror, returning the in-memory removal count.
    ///
    /// Unlike [`MirroredPreKeyStore::remove`] an unknown id is not an error here, the count is
    /// simply 0. Long-standing callers of the signed pre-key namespace consume the count directly,
    /// so the asymmetry between the two remove operations is kept rather than unified.
    pub fn remove(&mut self, id: SignedPreKeyId) -> Result<usize, PreKeyStoreError> {
        Ok(self.inner.remove(id)? as usize)
    }

    pub fn keyfile(&self) -> &K {
        &self.inner.keyfile
    }
}

#[derive(Debug, Error)]
pub enum PreKeyStoreError {
    /// No record is stored under the requested key id.
    #[error("unknown pre-key id {0}")]
    InvalidKeyId(u32),

    #[error(transparent)]
    KeyFile(#[from] KeyFileError),
}

#[cfg(test)]
mod tests {
    use crate::keyfile::{KeyFile, MemoryKeyFile, encode_record};

    use super::{
        MirroredPreKeyStore, MirroredSignedPreKeyStore, PREKEYS_SECTION, PreKeyStoreError,
        SIGNED_PREKEYS_SECTION,
    };

    #[test]
    fn store_then_load_round_trip() {
        let mut store = MirroredPreKeyStore::new(MemoryKeyFile::new());
        store.store(1, b"pre-key record").unwrap();

        assert_eq!(store.load(1).unwrap().as_bytes(), b"pre-key record");
        assert!(store.contains(1));
        assert!(!store.contains(2));
    }

    #[test]
    fn load_unknown_id_fails() {
        let store = MirroredPreKeyStore::new(MemoryKeyFile::new());
        assert!(matches!(
            store.load(42),
            Err(PreKeyStoreError::InvalidKeyId(42))
        ));
    }

    #[test]
    fn remove_unknown_pre_key_fails() {
        let mut store = MirroredPreKeyStore::new(MemoryKeyFile::new());
        assert!(matches!(
            store.remove(7),
            Err(PreKeyStoreError::InvalidKeyId(7))
        ));

        store.store(7, b"record").unwrap();
        store.remove(7).unwrap();
        assert!(!store.contains(7));
        assert_eq!(store.keyfile().get(PREKEYS_SECTION, "7"), None);
    }

    #[test]
    fn signed_remove_returns_count() {
        let mut store = MirroredSignedPreKeyStore::new(MemoryKeyFile::new());

        // An unknown id is a zero count, not an error.
        assert_eq!(store.remove(3).unwrap(), 0);

        store.store(3, b"record").unwrap();
        assert_eq!(store.remove(3).unwrap(), 1);
        assert!(!store.contains(3));
    }

    #[test]
    fn namespaces_are_separate() {
        let mut pre_keys = MirroredPreKeyStore::new(MemoryKeyFile::new());
        let mut signed_pre_keys = MirroredSignedPreKeyStore::new(MemoryKeyFile::new());

        pre_keys.store(1, b"one-time").unwrap();
        signed_pre_keys.store(1, b"signed").unwrap();

        assert_eq!(pre_keys.load(1).unwrap().as_bytes(), b"one-time");
        assert_eq!(signed_pre_keys.load(1).unwrap().as_bytes(), b"signed");
        assert_eq!(
            pre_keys.keyfile().get(PREKEYS_SECTION, "1"),
            Some(encode_record(b"one-time").as_str())
        );
        assert_eq!(
            signed_pre_keys.keyfile().get(SIGNED_PREKEYS_SECTION, "1"),
            Some(encode_record(b"signed").as_str())
        );
    }

    #[test]
    fn store_overwrites_and_mirrors() {
        let mut store = MirroredPreKeyStore::new(MemoryKeyFile::new());
        store.store(9, b"first").unwrap();
        store.store(9, b"second").unwrap();

        assert_eq!(store.load(9).unwrap().as_bytes(), b"second");
        assert_eq!(
            store.keyfile().get(PREKEYS_SECTION, "9"),
            Some(encode_record(b"second").as_str())
        );
        // Two stores, two flushes.
        assert_eq!(store.keyfile().save_count(), 2);
    }

    #[test]
    fn failed_flush_leaves_index_unchanged() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.fail_next_save();
        let mut store = MirroredSignedPreKeyStore::new(keyfile);

        assert!(store.store(1, b"record").is_err());
        assert!(!store.contains(1));
    }

    #[test]
    fn startup_load_reads_own_section_only() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.set(PREKEYS_SECTION, "1", encode_record(b"one-time"));
        keyfile.set(SIGNED_PREKEYS_SECTION, "2", encode_record(b"signed"));

        let store = MirroredPreKeyStore::from_keyfile(keyfile).unwrap();
        assert!(store.contains(1));
        assert!(!store.contains(2));
    }
}
