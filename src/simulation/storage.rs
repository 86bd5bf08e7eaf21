//! Durable key-value slot for the boost record
//!
//! Stores deal in raw text; encoding and validation live with the boost
//! resource itself.

use anyhow::{Context, Result};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

/// Default file name for the persisted boost record
pub const DEFAULT_BOOST_FILE: &str = "hw_boost.json";

/// A single durable slot holding the serialized boost record
pub trait BoostStore {
    /// Returns `Ok(None)` when nothing has been stored yet
    fn read(&self) -> Result<Option<String>>;
    fn write(&mut self, raw: &str) -> Result<()>;
}

/// Boost record kept in a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileBoostStore {
    path: PathBuf,
}

impl FileBoostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl BoostStore for FileBoostStore {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read boost record {}", self.path.display()))?;
        Ok(Some(raw))
    }

    fn write(&mut self, raw: &str) -> Result<()> {
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Cannot write boost record {}", self.path.display()))
    }
}

/// In-memory slot; clones share the same slot and write counter
#[derive(Debug, Clone, Default)]
pub struct MemoryBoostStore {
    slot: Rc<RefCell<Option<String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryBoostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with raw text, valid or not
    pub fn with_raw(raw: &str) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(raw.to_string());
        store
    }

    /// Current raw contents of the slot
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Number of writes performed so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl BoostStore for MemoryBoostStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.borrow().clone())
    }

    fn write(&mut self, raw: &str) -> Result<()> {
        *self.slot.borrow_mut() = Some(raw.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
