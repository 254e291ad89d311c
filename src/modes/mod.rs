// Mode discovery
//
// - filter: which file names in the modes folder are candidates
// - template: rewriting a mode template into a runnable pipeline
// - scanner: building a registry from the modes folder

pub mod filter;
pub mod scanner;
pub mod template;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

pub use filter::*;
pub use scanner::*;
pub use template::TemplateRewriter;

use crate::language::{pair_key, to_iso3};

/// One runnable translation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mode {
    /// Three letter source language code
    pub source: String,
    /// Three letter target language code
    pub target: String,
    pub pair_key: String,
    /// Fully rewritten shell pipeline
    pub command_line: String,
    /// Mode file the pipeline was read from
    pub file_name: String,
}

impl Mode {
    pub fn new(source: &str, target: &str, command_line: String, file_name: String) -> Self {
        Self {
            source: to_iso3(source),
            target: to_iso3(target),
            pair_key: pair_key(source, target),
            command_line,
            file_name,
        }
    }
}

/// Pair key to mode mapping, built in one go and never edited afterwards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeRegistry {
    modes: BTreeMap<String, Mode>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mode, replacing any earlier one with the same pair key
    pub fn insert(&mut self, mode: Mode) -> Option<Mode> {
        self.modes.insert(mode.pair_key.clone(), mode)
    }

    pub fn get(&self, pair_key: &str) -> Option<&Mode> {
        self.modes.get(pair_key)
    }

    /// Look up by language codes, normalizing them the same way registration does
    pub fn find(&self, source: &str, target: &str) -> Option<&Mode> {
        self.get(&pair_key(source, target))
    }

    pub fn contains(&self, pair_key: &str) -> bool {
        self.modes.contains_key(pair_key)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.values()
    }

    pub fn pair_keys(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }
}

/// Shared handle to the current registry snapshot.
///
/// Readers get an `Arc` to an immutable registry; [`LiveRegistry::replace`]
/// swaps in a new one so nobody sees a half-built mapping.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    current: RwLock<Arc<ModeRegistry>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<ModeRegistry> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    pub fn replace(&self, registry: ModeRegistry) {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(registry);
    }
}
