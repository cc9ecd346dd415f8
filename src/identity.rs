// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local identity material and the trust store for remote identity keys.
//!
//! Trust here is trust-on-first-use: saving an identity key records "this is the last key this
//! device presented", and [`MirroredIdentityStore::is_trusted`] only confirms that a later
//! presented key is byte-identical to the recorded one. An unknown identity or device is simply
//! not trusted yet, it is never an error and never a denial.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::{Address, DeviceId, RegistrationId};
use crate::buffer::KeyBuffer;
use crate::keyfile::{KeyFile, KeyFileError, decode_id, decode_record, encode_record};

/// The local long-term identity key pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityKeyPair {
    public: KeyBuffer,
    private: KeyBuffer,
}

impl IdentityKeyPair {
    pub fn new(public: KeyBuffer, private: KeyBuffer) -> Self {
        Self { public, private }
    }

    pub fn public(&self) -> &KeyBuffer {
        &self.public
    }

    pub fn private(&self) -> &KeyBuffer {
        &self.private
    }
}

/// Store holding the local identity and the identity keys trusted for remote devices.
///
/// The local key pair and registration id are fixed at construction, the protocol cannot run
/// without them and they never change over the lifetime of a store. Trusted remote keys are
/// mirrored into the key-file with one section per identity name and one key per stringified
/// device id.
#[derive(Debug)]
pub struct MirroredIdentityStore<K> {
    key_pair: IdentityKeyPair,
    registration_id: RegistrationId,
    trusted: HashMap<String, HashMap<DeviceId, KeyBuffer>>,
    keyfile: K,
}

impl<K> MirroredIdentityStore<K>
where
    K: KeyFile,
{
    /// Returns an identity store with no trusted remote keys yet.
    pub fn new(key_pair: IdentityKeyPair, registration_id: RegistrationId, keyfile: K) -> Self {
        Self {
            key_pair,
            registration_id,
            trusted: HashMap::new(),
            keyfile,
        }
    }

    /// Rebuilds the trusted-key index from a previously mirrored key-file.
    pub fn from_keyfile(
        key_pair: IdentityKeyPair,
        registration_id: RegistrationId,
        keyfile: K,
    ) -> Result<Self, KeyFileError> {
        let mut trusted: HashMap<String, HashMap<DeviceId, KeyBuffer>> = HashMap::new();
        for section in keyfile.sections() {
            for key in keyfile.keys(&section) {
                let device_id = decode_id(&section, &key)?;
                let value = keyfile
                    .get(&section, &key)
                    .expect("enumerated key exists in key-file");
                let record = decode_record(&section, &key, value)?;
                trusted
                    .entry(section.clone())
                    .or_default()
                    .insert(device_id, record);
            }
        }
        Ok(Self {
            key_pair,
            registration_id,
            trusted,
            keyfile,
        })
    }

    /// Returns a copy of the local identity key pair.
    pub fn identity_key_pair(&self) -> IdentityKeyPair {
        self.key_pair.clone()
    }

    pub fn registration_id(&self) -> RegistrationId {
        self.registration_id
    }

    /// Records the identity key presented by a remote device, replacing any earlier one, and makes
    /// it durable.
    ///
    /// No history is kept: after a save only the latest key counts as trusted.
    pub fn save_identity(&mut self, address: &Address, key: &[u8]) -> Result<(), KeyFileError> {
        self.keyfile.set(
            address.name(),
            &address.device_id().to_string(),
            encode_record(key),
        );
        self.keyfile.save()?;

        let key = KeyBuffer::from(key);
        debug!(address = %address, key = %key.fingerprint(), "saved identity key");
        self.trusted
            .entry(address.name().to_string())
            .or_default()
            .insert(address.device_id(), key);
        Ok(())
    }

    /// Returns whether this exact key is the one last saved for the address.
    ///
    /// Unknown identities and devices are not trusted. The comparison runs in constant time.
    pub fn is_trusted(&self, address: &Address, key: &[u8]) -> bool {
        match self
            .trusted
            .get(address.name())
            .and_then(|devices| devices.get(&address.device_id()))
        {
            Some(trusted) => *trusted == KeyBuffer::from(key),
            None => false,
        }
    }

    pub fn keyfile(&self) -> &K {
        &self.keyfile
    }
}

#[cfg(test)]
mod tests {
    use crate::address::Address;
    use crate::buffer::KeyBuffer;
    use crate::keyfile::{KeyFile, MemoryKeyFile, encode_record};

    use super::{IdentityKeyPair, MirroredIdentityStore};

    fn key_pair() -> IdentityKeyPair {
        IdentityKeyPair::new(
            KeyBuffer::new(vec![1; 32]),
            KeyBuffer::new(vec![2; 32]),
        )
    }

    #[test]
    fn local_identity_is_returned_as_copy() {
        let store = MirroredIdentityStore::new(key_pair(), 4711, MemoryKeyFile::new());

        let pair = store.identity_key_pair();
        assert_eq!(pair.public().as_bytes(), &[1; 32]);
        assert_eq!(pair.private().as_bytes(), &[2; 32]);
        assert_eq!(store.registration_id(), 4711);
    }

    #[test]
    fn trust_on_first_use() {
        let mut store = MirroredIdentityStore::new(key_pair(), 1, MemoryKeyFile::new());
        let address = Address::new("alice@example.org", 1);

        // Nothing is trusted implicitly.
        assert!(!store.is_trusted(&address, b"remote key"));

        store.save_identity(&address, b"remote key").unwrap();
        assert!(store.is_trusted(&address, b"remote key"));

        // A different key for the same device is a detectable change.
        assert!(!store.is_trusted(&address, b"other key"));
        // Same identity, other device: unknown, so untrusted.
        assert!(!store.is_trusted(&Address::new("alice@example.org", 2), b"remote key"));
    }

    #[test]
    fn save_overwrites_previous_key() {
        let mut store = MirroredIdentityStore::new(key_pair(), 1, MemoryKeyFile::new());
        let address = Address::new("alice@example.org", 1);

        store.save_identity(&address, b"first key").unwrap();
        store.save_identity(&address, b"second key").unwrap();

        assert!(!store.is_trusted(&address, b"first key"));
        assert!(store.is_trusted(&address, b"second key"));
    }

    #[test]
    fn saved_keys_are_mirrored() {
        let mut store = MirroredIdentityStore::new(key_pair(), 1, MemoryKeyFile::new());
        store
            .save_identity(&Address::new("alice@example.org", 3), b"remote key")
            .unwrap();

        assert_eq!(
            store.keyfile().get("alice@example.org", "3"),
            Some(encode_record(b"remote key").as_str())
        );
        assert_eq!(store.keyfile().save_count(), 1);
    }

    #[test]
    fn failed_flush_leaves_trust_unchanged() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.fail_next_save();
        let mut store = MirroredIdentityStore::new(key_pair(), 1, keyfile);

        let address = Address::new("alice@example.org", 1);
        assert!(store.save_identity(&address, b"remote key").is_err());
        assert!(!store.is_trusted(&address, b"remote key"));
    }

    #[test]
    fn startup_load_restores_trust() {
        let mut keyfile = MemoryKeyFile::new();
        keyfile.set("alice@example.org", "1", encode_record(b"remote key"));

        let store = MirroredIdentityStore::from_keyfile(key_pair(), 1, keyfile).unwrap();
        assert!(store.is_trusted(&Address::new("alice@example.org", 1), b"remote key"));
        assert!(!store.is_trusted(&Address::new("alice@example.org", 1), b"wrong key"));
    }
}
