// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interface definitions consumed by the protocol engine.
//!
//! One trait per store kind, so an engine can be generic over where its state lives while this
//! crate's mirrored stores remain one possible implementation. All operations are synchronous and
//! return copies of store-owned buffers.
mod identity;
mod prekey;
mod sender_key;
mod session;

pub use identity::IdentityKeyStore;
pub use prekey::{PreKeyStore, SignedPreKeyStore};
pub use sender_key::SenderKeyStore;
pub use session::SessionStore;
