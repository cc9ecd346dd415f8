// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::buffer::KeyBuffer;
use crate::sender_key::SenderKeyName;

/// Manages sender keys for group messaging.
///
/// The implementation shipped with this crate is a documented no-op, see
/// [`UnsupportedSenderKeyStore`](crate::UnsupportedSenderKeyStore).
pub trait SenderKeyStore {
    type Error: Error;

    /// Stores the sender-key record for a group member.
    fn store_sender_key(
        &mut self,
        name: &SenderKeyName,
        record: &[u8],
    ) -> Result<(), Self::Error>;

    /// Returns a copy of the sender-key record for a group member, or `None` when absent.
    fn load_sender_key(&self, name: &SenderKeyName) -> Result<Option<KeyBuffer>, Self::Error>;
}
