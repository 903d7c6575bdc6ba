//! Payloads from the last loaded file that no live entity claimed.
//!
//! Every load replaces the cache wholesale, and every save writes the
//! remaining entries back out unchanged. Together this lets data for an
//! absent entity ride through any number of save/load generations until an
//! entity with that identity shows up again.

use std::collections::HashMap;

use tracing::warn;

/// One unclaimed frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadFrame {
    pub identity: String,
    pub payload: Vec<u8>,
}

/// Unclaimed payloads keyed by identity, kept in file order.
#[derive(Debug, Default)]
pub struct DeadDataCache {
    frames: Vec<DeadFrame>,
    by_identity: HashMap<String, usize>,
}

impl DeadDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a copy of `payload` for `identity`.
    ///
    /// The first capture of an identity wins; later ones are ignored and
    /// `false` is returned.
    pub fn capture(&mut self, identity: &str, payload: &[u8]) -> bool {
        if self.by_identity.contains_key(identity) {
            warn!(
                target: "save_engine::dead_data",
                identity,
                "Duplicate unclaimed frame ignored"
            );
            return false;
        }

        self.by_identity.insert(identity.to_string(), self.frames.len());
        self.frames.push(DeadFrame {
            identity: identity.to_string(),
            payload: payload.to_vec(),
        });
        true
    }

    /// Removes and returns the payload for `identity`.
    pub fn take(&mut self, identity: &str) -> Option<Vec<u8>> {
        let index = self.by_identity.remove(identity)?;
        let frame = self.frames.remove(index);
        for slot in self.by_identity.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(frame.payload)
    }

    pub fn get(&self, identity: &str) -> Option<&[u8]> {
        self.by_identity
            .get(identity)
            .map(|&index| self.frames[index].payload.as_slice())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.by_identity.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.by_identity.clear();
    }

    /// Identities in file order.
    pub fn identities(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.identity.clone()).collect()
    }

    /// `(identity, payload)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.frames
            .iter()
            .map(|f| (f.identity.as_str(), f.payload.as_slice()))
    }

    /// Total payload bytes held.
    pub fn total_bytes(&self) -> usize {
        self.frames.iter().map(|f| f.payload.len()).sum()
    }
}
