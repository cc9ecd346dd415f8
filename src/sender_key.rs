// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group sender-key capability, deliberately unsupported.
//!
//! The protocol engine expects a sender-key store for group messaging. This store satisfies the
//! interface without retaining anything: `store` reports success and drops the record, `load`
//! reports success and returns absent. The gap is carried in the type name instead of an empty
//! function body so integrators see it at the call site.
//!
//! Known limitation: callers relying on persisted sender keys across restarts will silently lose
//! that state.
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::buffer::KeyBuffer;

/// Addressing for group sender keys: the group combined with the sending member's address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderKeyName {
    group_id: String,
    sender: Address,
}

impl SenderKeyName {
    pub fn new(group_id: impl Into<String>, sender: Address) -> Self {
        Self {
            group_id: group_id.into(),
            sender,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }
}

/// Sender-key store which accepts every record and retains none.
#[derive(Clone, Debug, Default)]
pub struct UnsupportedSenderKeyStore;

impl UnsupportedSenderKeyStore {
    pub fn new() -> Self {
        Self
    }

    /// Reports success without storing the record.
    pub fn store(&mut self, _name: &SenderKeyName, _record: &[u8]) -> Result<(), Infallible> {
        Ok(())
    }

    /// Reports success while always returning absent.
    pub fn load(&self, _name: &SenderKeyName) -> Result<Option<KeyBuffer>, Infallible> {
        Ok(None)
    }
}
