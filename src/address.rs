// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one client instance among a peer's possibly-multiple devices.
pub type DeviceId = u32;

/// Unique identifier of a one-time pre-key within its own namespace.
pub type PreKeyId = u32;

/// Unique identifier of a signed pre-key within its own namespace.
pub type SignedPreKeyId = u32;

/// Local registration id assigned when an account is created.
pub type RegistrationId = u32;

/// Address of a single remote protocol participant: the peer's identity name combined with one of
/// their device ids.
///
/// Session and trust state is always keyed by the full address, never by the identity name alone,
/// since every device of a peer runs its own ratchet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    name: String,
    device_id: DeviceId,
}

impl Address {
    pub fn new(name: impl Into<String>, device_id: DeviceId) -> Self {
        Self {
            name: name.into(),
            device_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.device_id)
    }
}
