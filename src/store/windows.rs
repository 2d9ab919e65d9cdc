use std::io;

use winreg::RegKey;
use winreg::enums::*;
use winreg::types::FromRegValue;

use super::{INTERNET_SETTINGS, SettingsStore, StoreHandle};
use crate::settings::RawValue;

/// `HKEY_CURRENT_USER\Software\Microsoft\Windows\CurrentVersion\Internet Settings`.
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
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let key = hkcu.open_subkey_with_flags(INTERNET_SETTINGS, KEY_READ | KEY_WRITE)?;
        Ok(Box::new(RegistryHandle { key }))
    }
}

// RegKey closes the underlying HKEY on drop.
struct RegistryHandle {
    key: RegKey,
}

impl StoreHandle for RegistryHandle {
    fn read(&self, name: &str) -> io::Result<Option<RawValue>> {
        let value = match self.key.get_raw_value(name) {
            Ok(value) => value,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        match value.vtype {
            REG_DWORD => Ok(Some(RawValue::Dword(u32::from_reg_value(&value)?))),
            REG_SZ | REG_EXPAND_SZ => Ok(Some(RawValue::String(String::from_reg_value(&value)?))),
            // `load` treats this like a missing value.
            ref other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported registry type {:?}", other),
            )),
        }
    }

    fn write(&mut self, name: &str, value: &RawValue) -> io::Result<()> {
        match value {
            RawValue::Dword(n) => self.key.set_value(name, n),
            RawValue::String(s) => self.key.set_value(name, s),
        }
    }
}
