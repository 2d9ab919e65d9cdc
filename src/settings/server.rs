use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ProxyError, Result};

/// Key used for a single proxy that serves every protocol.
pub const ALL_KEY: &str = "all";

/// Protocol name (or [`ALL_KEY`]) to `host:port`.
pub type ServerMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
    Ftp,
    Socks,
}

impl Protocol {
    /// Order used when writing a per-protocol server list.
    pub const ORDER: [Protocol; 4] = [Protocol::Http, Protocol::Https, Protocol::Ftp, Protocol::Socks];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Ftp => "ftp",
            Protocol::Socks => "socks",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value accepted by `ProxySettings::set_server`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSetting {
    /// `host:port` (or any literal), stored as given.
    Endpoint(String),
    Map(ServerMap),
}

impl ServerSetting {
    pub fn to_raw(&self) -> String {
        match self {
            ServerSetting::Endpoint(endpoint) => endpoint.clone(),
            ServerSetting::Map(map) => format(map),
        }
    }
}

impl From<&str> for ServerSetting {
    fn from(endpoint: &str) -> Self {
        ServerSetting::Endpoint(endpoint.to_string())
    }
}

impl From<String> for ServerSetting {
    fn from(endpoint: String) -> Self {
        ServerSetting::Endpoint(endpoint)
    }
}

impl From<ServerMap> for ServerSetting {
    fn from(map: ServerMap) -> Self {
        ServerSetting::Map(map)
    }
}

/// Parse a `ProxyServer` string.
///
/// Without `=` the whole string is the proxy for every protocol. Otherwise
/// it is a `;` separated list of `protocol=host:port`; blank entries are
/// skipped and an entry without `=` is rejected.
pub fn parse(raw: &str) -> Result<ServerMap> {
    let mut map = ServerMap::new();
    if !raw.contains('=') {
        map.insert(ALL_KEY.to_string(), raw.to_string());
        return Ok(map);
    }

    for token in raw.split(';') {
        if token.trim().is_empty() {
            continue;
        }
        let (protocol, endpoint) = token.split_once('=').ok_or_else(|| ProxyError::Format {
            name: "ProxyServer",
            value: raw.to_string(),
            reason: format!("entry {:?} is not protocol=host:port", token),
        })?;
        map.insert(protocol.to_string(), endpoint.to_string());
    }
    Ok(map)
}

/// Inverse of [`parse`]. `all` wins over every other key; otherwise only
/// known protocols with a non-empty endpoint are written, in [`Protocol::ORDER`].
pub fn format(map: &ServerMap) -> String {
    if let Some(endpoint) = map.get(ALL_KEY) {
        return endpoint.clone();
    }
    Protocol::ORDER
        .iter()
        .filter_map(|protocol| {
            map.get(protocol.as_str())
                .filter(|endpoint| !endpoint.is_empty())
                .map(|endpoint| format!("{}={}", protocol, endpoint))
        })
        .collect::<Vec<String>>()
        .join(";")
}
