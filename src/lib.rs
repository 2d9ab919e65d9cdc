//! Read and write the Windows per-user proxy configuration.
//!
//! The four values live under
//! `HKEY_CURRENT_USER\Software\Microsoft\Windows\CurrentVersion\Internet Settings`:
//! `ProxyEnable`, `ProxyHttp1.1`, `ProxyServer` and `ProxyOverride`.
//! [`ProxySettings`] models them and [`store::load`] / [`store::save`] move
//! them between the model and a [`store::SettingsStore`].

pub mod cli;
pub mod error;
pub mod export;
pub mod settings;
pub mod store;

pub use error::{ProxyError, Result};
pub use settings::{ProxySettings, RawValue, Slot, ValueKind};
