// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::address::{PreKeyId, SignedPreKeyId};
use crate::buffer::KeyBuffer;

/// Manages one-time pre-key records, keyed by a caller-assigned numeric id.
pub trait PreKeyStore {
    type Error: Error;

    /// Returns a copy of the record with this id. Fails when the id is unknown, the caller then
    /// decides whether to request a fresh pre-key.
    fn load_pre_key(&self, id: PreKeyId) -> Result<KeyBuffer, Self::Error>;

    /// Inserts or replaces the record. The record must be durable when the call returns.
    fn store_pre_key(&mut self, id: PreKeyId, record: &[u8]) -> Result<(), Self::Error>;

    fn contains_pre_key(&self, id: PreKeyId) -> Result<bool, Self::Error>;

    /// Removes the record from memory and from durable storage. Fails when no record existed to
    /// remove.
    fn remove_pre_key(&mut self, id: PreKeyId) -> Result<(), Self::Error>;
}

/// Manages signed pre-key records, in a namespace strictly separate from [`PreKeyStore`].
pub trait SignedPreKeyStore {
    type Error: Error;

    /// Returns a copy of the record with this id, failing when the id is unknown.
    fn load_signed_pre_key(&self, id: SignedPreKeyId) -> Result<KeyBuffer, Self::Error>;

    /// Inserts or replaces the record. The record must be durable when the call returns.
    fn store_signed_pre_key(
        &mut self,
        id: SignedPreKeyId,
        record: &[u8],
    ) -> Result<(), Self::Error>;

    fn contains_signed_pre_key(&self, id: SignedPreKeyId) -> Result<bool, Self::Error>;

    /// Removes the record from memory and from durable storage, returning the in-memory removal
    /// count (0 or 1).
    ///
    /// Note the asymmetry with [`PreKeyStore::remove_pre_key`]: an unknown id is a zero count
    /// here, not an error. Callers of this namespace consume the count directly, so both
    /// behaviours are preserved distinctly.
    fn remove_signed_pre_key(&mut self, id: SignedPreKeyId) -> Result<usize, Self::Error>;
}
