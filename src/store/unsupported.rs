use std::io;

use super::{INTERNET_SETTINGS, SettingsStore, StoreHandle};

/// The registry only exists on Windows; opening it elsewhere always fails.
#[derive(Debug, Default)]
pub struct RegistryStore;

impl RegistryStore {
    pub fn new() -> Self {
        Self
    }
}

impl SettingsStore for RegistryStore {
    fn location(&self) -> String {
        format!("HKEY_CURRENT_USER\\{}", INTERNET_SETTINGS)
    }

    fn open(&self) -> io::Result<Box<dyn StoreHandle + '_>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "the Windows registry is not available on this platform",
        ))
    }
}
