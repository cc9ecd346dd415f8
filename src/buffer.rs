// SPDX-License-Identifier: MIT OR Apache-2.0

#[cfg(not(test))]
use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::ZeroizeOnDrop;

/// Owned, immutable byte sequence holding opaque key material or session records.
///
/// Every record handed out by a store is a copy of this buffer, never a live reference, so callers
/// can retain and mutate what they receive without affecting store-owned state. In particular this
/// implementation provides:
///
/// 1. Zeroise memory on drop.
/// 2. Hide byte values when printing debug info.
/// 3. Constant-time comparison implementation to prevent timing attacks, since buffers are
///    compared during identity trust checks.
#[derive(Clone, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(Debug))]
pub struct KeyBuffer(#[serde(with = "serde_bytes")] Vec<u8>);

impl KeyBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short hex prefix identifying this buffer in log output without revealing its content.
    pub fn fingerprint(&self) -> String {
        let end = self.0.len().min(4);
        hex::encode(&self.0[..end])
    }
}

impl From<&[u8]> for KeyBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for KeyBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl PartialEq for KeyBuffer {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time comparison.
        bool::from(self.0.ct_eq(&other.0))
    }
}

#[cfg(not(test))]
impl fmt::Debug for KeyBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not reveal buffer contents when printing debug info.
        f.debug_struct("KeyBuffer")
            .field("len", &self.0.len())
            .field("value", &"***")
            .finish()
    }
}
