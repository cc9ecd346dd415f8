// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::address::{Address, DeviceId};
use crate::buffer::KeyBuffer;

/// Manages ratchet session records for remote devices.
pub trait SessionStore {
    type Error: Error;

    /// Returns a copy of the session record for this address, or `None` when the identity or
    /// device is unknown. An absent session is never an error.
    fn load_session(&self, address: &Address) -> Result<Option<KeyBuffer>, Self::Error>;

    /// Returns every device id of this identity with a live session, empty when the identity is
    /// unknown.
    fn sub_device_sessions(&self, name: &str) -> Result<Vec<DeviceId>, Self::Error>;

    /// Inserts or replaces the session record for this address. The record must be durable when
    /// the call returns.
    fn store_session(&mut self, address: &Address, record: &[u8]) -> Result<(), Self::Error>;

    fn contains_session(&self, address: &Address) -> Result<bool, Self::Error>;

    /// Removes the session for one device.
    ///
    /// Returns `true` when the removal occurred and `false` when no session existed.
    fn delete_session(&mut self, address: &Address) -> Result<bool, Self::Error>;

    /// Removes every session of an identity, returning how many were removed.
    fn delete_all_sessions(&mut self, name: &str) -> Result<usize, Self::Error>;
}
