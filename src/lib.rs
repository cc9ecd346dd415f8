// SPDX-License-Identifier: MIT OR Apache-2.0

#![cfg_attr(doctest, doc = include_str!("../README.md"))]

//! `ratchet-store` is a pluggable key and session store for end-to-end encrypted messaging
//! protocols: an in-memory index of ratchet session state, one-time pre-keys, signed pre-keys and
//! trusted identity keys, kept synchronised with a durable key-file mirror on every mutation.
//!
//! The store performs no cryptography itself. A protocol engine (the ratchet and key-agreement
//! logic) drives it through the typed traits in [`traits`], supplying and consuming opaque byte
//! records. The store's job is lifecycle, lookup and durability: sessions must not silently
//! disappear mid-conversation, and an unknown identity key must never be mistaken for a trusted
//! one.
//!
//! ## Stores
//!
//! - [`MirroredSessionStore`]: session records indexed by identity name and device id.
//! - [`MirroredPreKeyStore`] and [`MirroredSignedPreKeyStore`]: key-pair records indexed by a
//!   numeric id, in two strictly separate namespaces.
//! - [`MirroredIdentityStore`]: the local identity key pair and registration id, plus the
//!   trust-on-first-use record of remote identity keys.
//! - [`UnsupportedSenderKeyStore`]: the group sender-key capability, deliberately a no-op.
//!
//! [`ProtocolStore`] bundles all of them behind the complete callback surface an engine expects.
//!
//! ## Durability
//!
//! Every mutating operation encodes the record, writes it into an external [`KeyFile`] at its
//! section/key coordinate and flushes before the in-memory index is touched. A failed flush
//! leaves the store unchanged, so the index and the durable form never silently diverge. At
//! startup the indexes are rebuilt from the mirror via the `from_keyfile` constructors.
//!
//! Reads always return copies of store-owned buffers, callers can retain and mutate them freely.
//!
//! ## Concurrency
//!
//! Everything is synchronous and designed for one logical thread of protocol execution. Sharing a
//! store across threads requires one coarse lock around the whole [`ProtocolStore`].
mod address;
mod buffer;
mod identity;
mod keyfile;
mod prekey;
mod protocol;
mod sender_key;
mod session;
pub mod traits;

pub use address::{Address, DeviceId, PreKeyId, RegistrationId, SignedPreKeyId};
pub use buffer::KeyBuffer;
pub use identity::{IdentityKeyPair, MirroredIdentityStore};
pub use keyfile::{KeyFile, KeyFileError, MemoryKeyFile, decode_record, encode_record};
pub use prekey::{
    MirroredPreKeyStore, MirroredSignedPreKeyStore, PREKEYS_SECTION, PreKeyStoreError,
    SIGNED_PREKEYS_SECTION,
};
pub use protocol::{KeyFiles, ProtocolStore};
pub use sender_key::{SenderKeyName, UnsupportedSenderKeyStore};
pub use session::MirroredSessionStore;
