//! Content addressing for conversation fragments.

use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::AgentxError;
use crate::types::{Fragment, Message};

/// SHA-256 identity of a fragment.
///
/// Each message's JSON is length-prefixed before hashing so message
/// boundaries are unambiguous and order matters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey([u8; 32]);

impl StateKey {
    pub fn of(fragment: &[Message]) -> Result<Self, AgentxError> {
        let mut hasher = Sha256::new();
        for message in fragment {
            let encoded = serde_json::to_vec(message)?;
            hasher.update((encoded.len() as u64).to_le_bytes());
            hasher.update(&encoded);
        }
        Ok(Self(hasher.finalize().into()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_string();
        write!(f, "StateKey({})", &hex[..12])
    }
}

/// Bidirectional map between state keys and the fragments they identify.
#[derive(Debug, Clone, Default)]
pub struct FragmentIndex {
    key_to_fragment: HashMap<StateKey, Fragment>,
    fragment_to_key: HashMap<Fragment, StateKey>,
}

impl FragmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both directions for `fragment`.
    pub fn insert(&mut self, key: StateKey, fragment: Fragment) {
        self.fragment_to_key.insert(fragment.clone(), key);
        self.key_to_fragment.insert(key, fragment);
    }

    pub fn fragment(&self, key: &StateKey) -> Option<&Fragment> {
        self.key_to_fragment.get(key)
    }

    pub fn key_of(&self, fragment: &[Message]) -> Option<StateKey> {
        self.fragment_to_key.get(fragment).copied()
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.key_to_fragment.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.key_to_fragment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_fragment.is_empty()
    }
}
