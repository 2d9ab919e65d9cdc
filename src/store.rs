use std::io;

use crate::error::{ProxyError, Result};
use crate::settings::{ProxySettings, RawValue, Slot};

mod memory;
#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod windows;

pub use memory::MemoryStore;
#[cfg(not(windows))]
pub use unsupported::RegistryStore;
#[cfg(windows)]
pub use windows::RegistryStore;

pub const INTERNET_SETTINGS: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings";

/// Something that can hold the Internet Settings values.
pub trait SettingsStore {
    /// Where the values live, for messages.
    fn location(&self) -> String;

    /// Open the settings location for reading and writing. The handle is
    /// released when dropped.
    fn open(&self) -> io::Result<Box<dyn StoreHandle + '_>>;
}

pub trait StoreHandle {
    /// `Ok(None)` when the value does not exist.
    fn read(&self, name: &str) -> io::Result<Option<RawValue>>;

    fn write(&mut self, name: &str, value: &RawValue) -> io::Result<()>;
}

/// Read the proxy settings. Values missing from the store, or stored with a
/// registry type other than a DWORD or a string, keep their default.
pub fn load(store: &dyn SettingsStore) -> Result<ProxySettings> {
    let handle = store
        .open()
        .map_err(|e| ProxyError::unavailable(store.location(), e))?;

    let mut settings = ProxySettings::new();
    for slot in Slot::ALL {
        let value = match handle.read(slot.value_name()) {
            Ok(value) => value,
            // A value of a type the model cannot hold is treated as absent.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("ignoring {}: {}", slot, e);
                None
            }
            Err(e) => {
                return Err(ProxyError::unavailable(
                    format!("{}\\{}", store.location(), slot),
                    e,
                ));
            }
        };
        match value {
            Some(value) => {
                log::debug!("{} = {:?}", slot, value);
                settings.restore(slot, value);
            }
            None => log::debug!("{} not set, using {:?}", slot, settings.raw(slot)),
        }
    }
    log::info!("loaded {}", settings.summary());
    Ok(settings)
}

/// Write all four values with the kind each slot currently has.
pub fn save(store: &dyn SettingsStore, settings: &ProxySettings) -> Result<()> {
    let mut handle = store
        .open()
        .map_err(|e| ProxyError::on_write(store.location(), e))?;

    for slot in Slot::ALL {
        let value = settings.raw(slot);
        log::debug!("writing {} = {:?}", slot, value);
        handle
            .write(slot.value_name(), value)
            .map_err(|e| ProxyError::on_write(format!("{}\\{}", store.location(), slot), e))?;
    }
    log::info!("saved {}", settings.summary());
    Ok(())
}
