// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::address::{Address, RegistrationId};
use crate::identity::IdentityKeyPair;

/// Manages the local identity and the identity keys trusted for remote devices.
pub trait IdentityKeyStore {
    type Error: Error;

    /// Returns a copy of the local long-term identity key pair.
    fn identity_key_pair(&self) -> Result<IdentityKeyPair, Self::Error>;

    fn local_registration_id(&self) -> Result<RegistrationId, Self::Error>;

    /// Records the identity key presented by a remote device, replacing any earlier one. This is
    /// the explicit trust decision, nothing is trusted implicitly.
    fn save_identity(&mut self, address: &Address, key: &[u8]) -> Result<(), Self::Error>;

    /// Returns whether this exact key is the one last saved for the address. An unknown identity
    /// or device is `false`, never an error.
    fn is_trusted_identity(&self, address: &Address, key: &[u8]) -> Result<bool, Self::Error>;
}
