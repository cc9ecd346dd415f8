// SPDX-License-Identifier: MIT OR Apache-2.0

//! The complete callback surface handed to a protocol engine.
//!
//! [`ProtocolStore`] owns one store per kind and implements every trait in [`crate::traits`] by
//! typed delegation, there is no untyped dispatch anywhere. Engines hold the whole store and call
//! through the traits; applications construct it with one key-file per mirror.
//!
//! All operations are synchronous and complete before returning, including durable-write flushes.
//! The store is built for one logical thread of protocol execution. If it must be shared, wrap
//! the whole `ProtocolStore` in a single coarse lock: cross-index invariants are not designed to
//! tolerate interleaved partial updates.
use std::convert::Infallible;

use crate::address::{Address, DeviceId, PreKeyId, RegistrationId, SignedPreKeyId};
use crate::buffer::KeyBuffer;
use crate::identity::{IdentityKeyPair, MirroredIdentityStore};
use crate::keyfile::{KeyFile, KeyFileError, MemoryKeyFile};
use crate::prekey::{MirroredPreKeyStore, MirroredSignedPreKeyStore, PreKeyStoreError};
use crate::sender_key::{SenderKeyName, UnsupportedSenderKeyStore};
use crate::session::MirroredSessionStore;
use crate::traits::{
    IdentityKeyStore, PreKeyStore, SenderKeyStore, SessionStore, SignedPreKeyStore,
};

/// Set of key-files backing the four mirrored stores.
///
/// Pre-keys and signed pre-keys write into disjoint fixed sections, so both may be handed views
/// onto the same underlying file by the application.
#[derive(Debug, Default)]
pub struct KeyFiles<K> {
    pub sessions: K,
    pub pre_keys: K,
    pub signed_pre_keys: K,
    pub trust: K,
}

/// Key and session store exposing the full protocol callback surface.
#[derive(Debug)]
pub struct ProtocolStore<K> {
    sessions: MirroredSessionStore<K>,
    pre_keys: MirroredPreKeyStore<K>,
    signed_pre_keys: MirroredSignedPreKeyStore<K>,
    identity: MirroredIdentityStore<K>,
    sender_keys: UnsupportedSenderKeyStore,
}

impl<K> ProtocolStore<K>
where
    K: KeyFile,
{
    /// Returns a store with empty indexes, mirroring into the given key-files.
    pub fn new(
        key_pair: IdentityKeyPair,
        registration_id: RegistrationId,
        keyfiles: KeyFiles<K>,
    ) -> Self {
        Self {
            sessions: MirroredSessionStore::new(keyfiles.sessions),
            pre_keys: MirroredPreKeyStore::new(keyfiles.pre_keys),
            signed_pre_keys: MirroredSignedPreKeyStore::new(keyfiles.signed_pre_keys),
            identity: MirroredIdentityStore::new(key_pair, registration_id, keyfiles.trust),
            sender_keys: UnsupportedSenderKeyStore::new(),
        }
    }

    /// Returns a store with indexes rebuilt from previously mirrored key-files.
    ///
    /// This is the startup path: sessions, pre-keys and trusted identity keys survive a restart
    /// through their mirrors. Sender keys do not, see
    /// [`UnsupportedSenderKeyStore`](crate::UnsupportedSenderKeyStore).
    pub fn from_keyfiles(
        key_pair: IdentityKeyPair,
        registration_id: RegistrationId,
        keyfiles: KeyFiles<K>,
    ) -> Result<Self, KeyFileError> {
        Ok(Self {
            sessions: MirroredSessionStore::from_keyfile(keyfiles.sessions)?,
            pre_keys: MirroredPreKeyStore::from_keyfile(keyfiles.pre_keys)?,
            signed_pre_keys: MirroredSignedPreKeyStore::from_keyfile(keyfiles.signed_pre_keys)?,
            identity: MirroredIdentityStore::from_keyfile(
                key_pair,
                registration_id,
                keyfiles.trust,
            )?,
            sender_keys: UnsupportedSenderKeyStore::new(),
        })
    }

    pub fn sessions(&self) -> &MirroredSessionStore<K> {
        &self.sessions
    }

    pub fn pre_keys(&self) -> &MirroredPreKeyStore<K> {
        &self.pre_keys
    }

    pub fn signed_pre_keys(&self) -> &MirroredSignedPreKeyStore<K> {
        &self.signed_pre_keys
    }

    pub fn identity(&self) -> &MirroredIdentityStore<K> {
        &self.identity
    }
}

impl ProtocolStore<MemoryKeyFile> {
    /// Returns a store mirroring into memory only, without durability. Useful for tests and
    /// throwaway instances.
    pub fn ephemeral(key_pair: IdentityKeyPair, registration_id: RegistrationId) -> Self {
        Self::new(key_pair, registration_id, KeyFiles::default())
    }
}

impl<K> SessionStore for ProtocolStore<K>
where
    K: KeyFile,
{
    type Error = KeyFileError;

    fn load_session(&self, address: &Address) -> Result<Option<KeyBuffer>, Self::Error> {
        Ok(self.sessions.load(address))
    }

    fn sub_device_sessions(&self, name: &str) -> Result<Vec<DeviceId>, Self::Error> {
        Ok(self.sessions.device_ids(name))
    }

    fn store_session(&mut self, address: &Address, record: &[u8]) -> Result<(), Self::Error> {
        self.sessions.store(address, record)
    }

    fn contains_session(&self, address: &Address) -> Result<bool, Self::Error> {
        Ok(self.sessions.contains(address))
    }

    fn delete_session(&mut self, address: &Address) -> Result<bool, Self::Error> {
        Ok(self.sessions.delete(address))
    }

    fn delete_all_sessions(&mut self, name: &str) -> Result<usize, Self::Error> {
        Ok(self.sessions.delete_all(name))
    }
}

impl<K> PreKeyStore for ProtocolStore<K>
where
    K: KeyFile,
{
    type Error = PreKeyStoreError;

    fn load_pre_key(&self, id: PreKeyId) -> Result<KeyBuffer, Self::Error> {
        self.pre_keys.load(id)
    }

    fn store_pre_key(&mut self, id: PreKeyId, record: &[u8]) -> Result<(), Self::Error> {
        self.pre_keys.store(id, record)
    }

    fn contains_pre_key(&self, id: PreKeyId) -> Result<bool, Self::Error> {
        Ok(self.pre_keys.contains(id))
    }

    fn remove_pre_key(&mut self, id: PreKeyId) -> Result<(), Self::Error> {
        self.pre_keys.remove(id)
    }
}

impl<K> SignedPreKeyStore for ProtocolStore<K>
where
    K: KeyFile,
{
    type Error = PreKeyStoreError;

    fn load_signed_pre_key(&self, id: SignedPreKeyId) -> Result<KeyBuffer, Self::Error> {
        self.signed_pre_keys.load(id)
    }

    fn store_signed_pre_key(
        &mut self,
        id: SignedPreKeyId,
        record: &[u8],
    ) -> Result<(), Self::Error> {
        self.signed_pre_keys.store(id, record)
    }

    fn contains_signed_pre_key(&self, id: SignedPreKeyId) -> Result<bool, Self::Error> {
        Ok(self.signed_pre_keys.contains(id))
    }

    fn remove_signed_pre_key(&mut self, id: SignedPreKeyId) -> Result<usize, Self::Error> {
        self.signed_pre_keys.remove(id)
    }
}

impl<K> IdentityKeyStore for ProtocolStore<K>
where
    K: KeyFile,
{
    type Error = KeyFileError;

    fn identity_key_pair(&self) -> Result<IdentityKeyPair, Self::Error> {
        Ok(self.identity.identity_key_pair())
    }

    fn local_registration_id(&self) -> Result<RegistrationId, Self::Error> {
        Ok(self.identity.registration_id())
    }

    fn save_identity(&mut self, address: &Address, key: &[u8]) -> Result<(), Self::Error> {
        self.identity.save_identity(address, key)
    }

    fn is_trusted_identity(&self, address: &Address, key: &[u8]) -> Result<bool, Self::Error> {
        Ok(self.identity.is_trusted(address, key))
    }
}

impl<K> SenderKeyStore for ProtocolStore<K>
where
    K: KeyFile,
{
    type Error = Infallible;

    fn store_sender_key(
        &mut self,
        name: &SenderKeyName,
        record: &[u8],
    ) -> Result<(), Self::Error> {
        self.sender_keys.store(name, record)
    }

    fn load_sender_key(&self, name: &SenderKeyName) -> Result<Option<KeyBuffer>, Self::Error> {
        self.sender_keys.load(name)
    }
}
