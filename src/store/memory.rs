use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;

use super::{SettingsStore, StoreHandle};
use crate::settings::RawValue;

/// In-process settings store.
///
/// Names are kept lowercase so lookups behave like the registry. It can be
/// switched to unavailable or read-only, or made to fail reading single
/// values, to reproduce store failures.
#[derive(Debug)]
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, RawValue>>,
    read_failures: BTreeMap<String, io::ErrorKind>,
    available: bool,
    read_only: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            values: RefCell::new(BTreeMap::new()),
            read_failures: BTreeMap::new(),
            available: true,
            read_only: false,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, value: RawValue) {
        self.values.borrow_mut().insert(name.to_ascii_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<RawValue> {
        self.values.borrow().get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Make every read of `name` fail with `kind`. `InvalidData` is what the
    /// registry store reports for a value of an unsupported type.
    pub fn fail_read(&mut self, name: &str, kind: io::ErrorKind) {
        self.read_failures.insert(name.to_ascii_lowercase(), kind);
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

impl SettingsStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn open(&self) -> io::Result<Box<dyn StoreHandle + '_>> {
        if !self.available {
            return Err(io::Error::new(io::ErrorKind::NotFound, "store is not available"));
        }
        Ok(Box::new(MemoryHandle { store: self }))
    }
}

struct MemoryHandle<'a> {
    store: &'a MemoryStore,
}

impl StoreHandle for MemoryHandle<'_> {
    fn read(&self, name: &str) -> io::Result<Option<RawValue>> {
        if let Some(kind) = self.store.read_failures.get(&name.to_ascii_lowercase()) {
            return Err(io::Error::new(*kind, format!("cannot read {}", name)));
        }
        Ok(self.store.get(name))
    }

    fn write(&mut self, name: &str, value: &RawValue) -> io::Result<()> {
        if self.store.read_only {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"));
        }
        self.store.insert(name, value.clone());
        Ok(())
    }
}
