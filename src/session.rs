// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store for ratchet session records of remote devices.
//!
//! Sessions are indexed by identity name first and device id second. The set of device ids known
//! for an identity is always derived from the session index itself, the store's mutation methods
//! are the only writers.
use std::collections::HashMap;

use tracing::debug;

use crate::address::{Address, DeviceId};
use crate::buffer::KeyBuffer;
use crate::keyfile::{KeyFile, KeyFileError, decode_id, decode_record, encode_record};

/// Session store mirroring every stored record into a key-file.
///
/// The key-file layout is one section per identity name, one key per stringified device id, with
/// base64-encoded session records as values. Single and bulk deletes are in-memory operations and
/// are not mirrored; they are maintenance paths which do not require durability in the same
/// transaction.
#[derive(Debug)]
pub struct MirroredSessionStore<K> {
    sessions: HashMap<String, HashMap<DeviceId, KeyBuffer>>,
    keyfile: K,
}

impl<K> MirroredSessionStore<K>
where
    K: KeyFile,
{
    /// Returns an empty session store writing its mirror into the given key-file.
    pub fn new(keyfile: K) -> Self {
        Self {
            sessions: HashMap::new(),
            keyfile,
        }
    }

    /// Rebuilds the in-memory index from a previously mirrored key-file.
    ///
    /// Called once at startup. Malformed entries are an error rather than being skipped, since a
    /// partially loaded session index would silently break running conversations.
    pub fn from_keyfile(keyfile: K) -> Result<Self, KeyFileError> {
        let mut sessions: HashMap<String, HashMap<DeviceId, KeyBuffer>> = HashMap::new();
        for section in keyfile.sections() {
            for key in keyfile.keys(&section) {
                let device_id = decode_id(&section, &key)?;
                let value = keyfile
                    .get(&section, &key)
                    .expect("enumerated key exists in key-file");
                let record = decode_record(&section, &key, value)?;
                sessions
                    .entry(section.clone())
                    .or_default()
                    .insert(device_id, record);
            }
        }
        Ok(Self { sessions, keyfile })
    }

    /// Returns a copy of the session record stored for this address.
    ///
    /// An unknown identity or device is not an error, the ratchet starts a fresh session in that
    /// case.
    pub fn load(&self, address: &Address) -> Option<KeyBuffer> {
        self.sessions
            .get(address.name())
            .and_then(|devices| devices.get(&address.device_id()))
            .cloned()
    }

    /// Returns every device id with a live session for this identity, in ascending order.
    pub fn device_ids(&self, name: &str) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = match self.sessions.get(name) {
            Some(devices) => devices.keys().copied().collect(),
            None => Vec::new(),
        };
        ids.sort_unstable();
        ids
    }

    /// Inserts or replaces the session record for this address and makes it durable.
    ///
    /// The mirror write and flush happen before the index update; on a flush failure the store is
    /// left unchanged.
    pub fn store(&mut self, address: &Address, record: &[u8]) -> Result<(), KeyFileError> {
        self.keyfile.set(
            address.name(),
            &address.device_id().to_string(),
            encode_record(record),
        );
        self.keyfile.save()?;

        self.sessions
            .entry(address.name().to_string())
            .or_default()
            .insert(address.device_id(), KeyBuffer::from(record));

        debug!(address = %address, len = record.len(), "stored session record");
        Ok(())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.sessions
            .get(address.name())
            .is_some_and(|devices| devices.contains_key(&address.device_id()))
    }

    /// Removes the session for a single device.
    ///
    /// Returns `true` when a session was removed.
    pub fn delete(&mut self, address: &Address) -> bool {
        let removed = self
            .sessions
            .get_mut(address.name())
            .is_some_and(|devices| devices.remove(&address.device_id()).is_some());
        if removed {
            debug!(address = %address, "deleted session record");
        }
        removed
    }

    /// Removes every session of an identity, returning how many were removed.
    pub fn delete_all(&mut self, name: &str) -> usize {
        let Some(devices) = self.sessions.get_mut(name) else {
            return 0;
        };
        let count = devices.len();
        devices.clear();
        debug!(name, count, "deleted all session records");
        count
    }

    pub fn keyfile(&self) -> &K {
        &self.keyfile
    }
}

#[cfg(test)]
mod tests {
    use crate::address::Address;
    use crate::keyfile::{KeyFile, MemoryKeyFile, encode_record};

    use super::MirroredSessionStore;

    #[test]
    fn store_then_load_round_trip() {
        let mut store = MirroredSessionStore::new(MemoryKeyFile::new());
        let address = Address::new("alice@example.org", 1);

        assert!(store.load(&address).is_none());
        assert!(!store.contains(&address));

        store.store(&address, b"session state").unwrap();
        assert_eq!(store.load(&address).unwrap().as_bytes(), b"session state");
        assert!(store.contains(&address));
    }

    #[test]
    fn store_replaces_existing_record() {
        let mut store = MirroredSessionStore::new(MemoryKeyFile::new());
        let address = Address::new("alice@example.org", 1);

        store.store(&address, b"first").unwrap();
        store.store(&address, b"second").unwrap();

        // Only the most recent record is retrievable.
        assert_eq!(store.load(&address).unwrap().as_bytes(), b"second");
        assert_eq!(store.device_ids("alice@example.org"), [1]);
    }

    #[test]
    fn device_ids_track_deletions() {
        let mut store = MirroredSessionStore::new(MemoryKeyFile::new());
        for device_id in [1, 3, 5] {
            store
                .store(&Address::new("alice@example.org", device_id), b"state")
                .unwrap();
        }
        assert_eq!(store.device_ids("alice@example.org"), [1, 3, 5]);

        assert!(store.delete(&Address::new("alice@example.org", 3)));
        assert_eq!(store.device_ids("alice@example.org"), [1, 5]);

        // Deleting again or deleting unknown addresses removes nothing.
        assert!(!store.delete(&Address::new("alice@example.org", 3)));
        assert!(!store.delete(&Address::new("bob@example.org", 1)));
    }

    #[test]
    fn delete_all_returns_count() {
        let mut store = MirroredSessionStore::new(MemoryKeyFile::new());
        for device_id in [2, 4] {
            store
                .store(&Address::new("alice@example.org", device_id), b"state")
                .unwrap();
        }

        assert_eq!(store.delete_all("alice@example.org"), 2);
        assert!(store.device_ids("alice@example.org").is_empty());
        assert_eq!(store.delete_all("alice@example.org"), 0);
        assert_eq!(store.delete_all("unknown@example.org"), 0);
    }

    #[test]
    fn unknown_identity_is_empty_not_an_error() {
        let store = MirroredSessionStore::new(MemoryKeyFile::new());
        assert!(store.device_ids("nobody@example.org").is_empty());
        assert!(store.load(&Address::new("nobody@example.org", 1)).is_none());
    }

    #[test]
    fn mirror_is_flushed_per_store() {
        let mut store = MirroredSessionStore::new(MemoryKeyFile::new());
        store
            .store(&Address::new("alice@example.org", 7), b"state")
            .unwrap();

        assert_eq!(store.keyfile().save_count(), 1);
        assert_eq!(
            store.keyfile().get("alice@example.org", "7"),
            Some(encode_record(b"state").as_str())
        );
    }

    #[test]
    fn failed_flush_leaves_index_unchanged() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.fail_next_save();
        let mut store = MirroredSessionStore::new(keyfile);

        let address = Address::new("alice@example.org", 1);
        assert!(store.store(&address, b"state").is_err());
        assert!(!store.contains(&address));

        // The next attempt goes through.
        store.store(&address, b"state").unwrap();
        assert!(store.contains(&address));
    }

    #[test]
    fn startup_load_rebuilds_index() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.set("alice@example.org", "1", encode_record(b"one"));
        keyfile.set("alice@example.org", "3", encode_record(b"three"));
        keyfile.set("bob@example.org", "2", encode_record(b"two"));

        let store = MirroredSessionStore::from_keyfile(keyfile).unwrap();
        assert_eq!(store.device_ids("alice@example.org"), [1, 3]);
        assert_eq!(
            store
                .load(&Address::new("bob@example.org", 2))
                .unwrap()
                .as_bytes(),
            b"two"
        );
    }

    #[test]
    fn startup_load_rejects_malformed_entries() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.set("alice@example.org", "not-a-device", encode_record(b"one"));
        assert!(MirroredSessionStore::from_keyfile(keyfile).is_err());

        let mut keyfile = MemoryKeyFile::new();
        keyfile.set("alice@example.org", "1", "not base64!".to_string());
        assert!(MirroredSessionStore::from_keyfile(keyfile).is_err());
    }
}
