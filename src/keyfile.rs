// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam towards the external key-value persistence service backing every store.
//!
//! A [`KeyFile`] groups string values under `(section, key)` coordinates and makes them durable on
//! an explicit [`save`](KeyFile::save) call. Stores mirror each mutation into their key-file
//! _before_ touching the in-memory index: a failed flush leaves the index unchanged, so memory and
//! the durable form never silently diverge.
//!
//! Parsing and writing an actual on-disk key-file format is not part of this crate. Applications
//! inject their own implementation; [`MemoryKeyFile`] is provided for tests and for running
//! without durability.
use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use crate::buffer::KeyBuffer;

/// External section/key/value persistence service.
///
/// Values are text; binary records are encoded with [`encode_record`] before they are written.
/// All operations are synchronous, `save` blocks until the change is durable.
pub trait KeyFile {
    /// Returns the value stored under the given coordinate.
    fn get(&self, section: &str, key: &str) -> Option<&str>;

    /// Inserts or replaces the value under the given coordinate.
    fn set(&mut self, section: &str, key: &str, value: String);

    /// Removes a single entry.
    ///
    /// Returns `true` when the removal occurred and `false` when no entry existed.
    fn remove(&mut self, section: &str, key: &str) -> bool;

    /// Flushes all pending changes to durable storage.
    fn save(&mut self) -> Result<(), KeyFileError>;

    /// Returns every section name, used once at startup to rebuild in-memory indexes.
    fn sections(&self) -> Vec<String>;

    /// Returns every key within a section, empty when the section is unknown.
    fn keys(&self, section: &str) -> Vec<String>;
}

/// Encodes a binary record into the text-safe form stored in a key-file.
pub fn encode_record(record: &[u8]) -> String {
    BASE64.encode(record)
}

/// Decodes a key-file value back into the binary record it mirrors.
pub fn decode_record(section: &str, key: &str, value: &str) -> Result<KeyBuffer, KeyFileError> {
    let bytes = BASE64
        .decode(value)
        .map_err(|err| KeyFileError::Malformed {
            section: section.to_string(),
            key: key.to_string(),
            reason: err.to_string(),
        })?;
    Ok(KeyBuffer::new(bytes))
}

/// Parses a stringified numeric id used as a key-file key.
pub fn decode_id(section: &str, key: &str) -> Result<u32, KeyFileError> {
    key.parse().map_err(|_| KeyFileError::Malformed {
        section: section.to_string(),
        key: key.to_string(),
        reason: "key is not a numeric id".to_string(),
    })
}

#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("could not flush key-file: {0}")]
    Flush(String),

    #[error("malformed entry at [{section}] {key}: {reason}")]
    Malformed {
        section: String,
        key: String,
        reason: String,
    },
}

/// In-memory [`KeyFile`] without actual durability.
///
/// Useful for tests and for applications which accept losing state on restart. `save` is a no-op
/// unless a flush failure has been injected.
#[derive(Debug, Default)]
pub struct MemoryKeyFile {
    entries: HashMap<String, HashMap<String, String>>,
    save_count: usize,
    fail_next_save: bool,
}

impl MemoryKeyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed `save` calls, used to assert flush-per-mutation behaviour.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Makes the next `save` call fail, to exercise the durable-write failure path.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn fail_next_save(&mut self) {
        self.fail_next_save = true;
    }
}

impl KeyFile for MemoryKeyFile {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries
            .get(section)
            .and_then(|section| section.get(key))
            .map(String::as_str)
    }

    fn set(&mut self, section: &str, key: &str, value: String) {
        self.entries
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn remove(&mut self, section: &str, key: &str) -> bool {
        match self.entries.get_mut(section) {
            Some(entries) => entries.remove(key).is_some(),
            None => false,
        }
    }

    fn save(&mut self) -> Result<(), KeyFileError> {
        if self.fail_next_save {
            self.fail_next_save = false;
            return Err(KeyFileError::Flush("injected failure".to_string()));
        }
        self.save_count += 1;
        Ok(())
    }

    fn sections(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn keys(&self, section: &str) -> Vec<String> {
        match self.entries.get(section) {
            Some(entries) => entries.keys().cloned().collect(),
            None => Vec::new(),
        }
    }
}
