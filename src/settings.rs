use std::fmt;
use std::ops::Index;

use crate::error::{ProxyError, Result};

pub mod overrides;
pub mod server;

pub use overrides::OverrideSeparators;
pub use server::{ALL_KEY, Protocol, ServerMap, ServerSetting};

/// Registry value type tag, using the numeric values of `REG_SZ` and `REG_DWORD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String = 1,
    Dword = 4,
}

impl ValueKind {
    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn reg_name(self) -> &'static str {
        match self {
            ValueKind::String => "REG_SZ",
            ValueKind::Dword => "REG_DWORD",
        }
    }
}

/// A value as stored under the Internet Settings key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Dword(u32),
    String(String),
}

impl RawValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            RawValue::Dword(_) => ValueKind::Dword,
            RawValue::String(_) => ValueKind::String,
        }
    }

    fn flag(on: bool) -> Self {
        RawValue::Dword(u32::from(on))
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RawValue::Dword(n) => write!(f, "{}", n),
            RawValue::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Enable,
    Http11,
    Server,
    Override,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Enable, Slot::Http11, Slot::Server, Slot::Override];

    /// Name of the registry value backing this slot.
    pub fn value_name(self) -> &'static str {
        match self {
            Slot::Enable => "ProxyEnable",
            Slot::Http11 => "ProxyHttp1.1",
            Slot::Server => "ProxyServer",
            Slot::Override => "ProxyOverride",
        }
    }

    /// Registry value names are case-insensitive.
    pub fn from_value_name(name: &str) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.value_name().eq_ignore_ascii_case(name))
    }

    pub fn expected_kind(self) -> ValueKind {
        match self {
            Slot::Enable | Slot::Http11 => ValueKind::Dword,
            Slot::Server | Slot::Override => ValueKind::String,
        }
    }

    pub fn default_value(self) -> RawValue {
        match self {
            Slot::Enable => RawValue::flag(false),
            Slot::Http11 => RawValue::flag(true),
            Slot::Server | Slot::Override => RawValue::String(String::new()),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.value_name())
    }
}

/// The per-user proxy configuration: the four Internet Settings values.
///
/// Each slot keeps the kind it was read with, so a value stored as a string
/// by some older tool is written back as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    values: [RawValue; 4],
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            values: Slot::ALL.map(Slot::default_value),
        }
    }
}

impl Index<Slot> for ProxySettings {
    type Output = RawValue;

    fn index(&self, slot: Slot) -> &RawValue {
        &self.values[slot.index()]
    }
}

impl ProxySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) -> bool {
        self.flag(Slot::Enable)
    }

    pub fn set_enable(&mut self, on: bool) {
        self.values[Slot::Enable.index()] = RawValue::flag(on);
    }

    pub fn http11(&self) -> bool {
        self.flag(Slot::Http11)
    }

    pub fn set_http11(&mut self, on: bool) {
        self.values[Slot::Http11.index()] = RawValue::flag(on);
    }

    // Only a numeric 1 counts as set; other numbers and strings read as off.
    fn flag(&self, slot: Slot) -> bool {
        matches!(self[slot], RawValue::Dword(1))
    }

    pub fn server_raw(&self) -> &str {
        self.string(Slot::Server)
    }

    /// Server view: protocol name (or `all`) to `host:port`.
    pub fn server(&self) -> Result<ServerMap> {
        server::parse(self.server_raw())
    }

    pub fn set_server(&mut self, value: impl Into<ServerSetting>) {
        let raw = value.into().to_raw();
        self.values[Slot::Server.index()] = RawValue::String(raw);
    }

    pub fn override_raw(&self) -> &str {
        self.string(Slot::Override)
    }

    /// Override view, split with the default separators.
    pub fn overrides(&self) -> Vec<String> {
        self.overrides_with(&OverrideSeparators::default())
    }

    pub fn overrides_with(&self, separators: &OverrideSeparators) -> Vec<String> {
        separators.split(self.override_raw())
    }

    /// Entries are joined with `;` as given, without trimming.
    pub fn set_overrides<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw = overrides::join(entries);
        self.values[Slot::Override.index()] = RawValue::String(raw);
    }

    // A string slot holding a number (never written by this crate) is shown empty.
    fn string(&self, slot: Slot) -> &str {
        match &self[slot] {
            RawValue::String(s) => s,
            RawValue::Dword(_) => "",
        }
    }

    pub fn raw(&self, slot: Slot) -> &RawValue {
        &self[slot]
    }

    /// Replace a slot with a caller-supplied value.
    ///
    /// Flag slots only take numeric 0 or 1, string slots only take strings.
    pub fn set_raw(&mut self, slot: Slot, value: RawValue) -> Result<()> {
        match (slot.expected_kind(), &value) {
            (ValueKind::Dword, RawValue::Dword(0 | 1)) | (ValueKind::String, RawValue::String(_)) => {}
            (ValueKind::Dword, other) => {
                return Err(ProxyError::invalid(format!(
                    "{} only accepts 0 or 1, got {:?}",
                    slot, other
                )));
            }
            (ValueKind::String, other) => {
                return Err(ProxyError::invalid(format!(
                    "{} only accepts a string, got {:?}",
                    slot, other
                )));
            }
        }
        self.values[slot.index()] = value;
        Ok(())
    }

    /// Store-side assignment: keeps whatever kind the store held.
    pub(crate) fn restore(&mut self, slot: Slot, value: RawValue) {
        self.values[slot.index()] = value;
    }

    pub fn summary(&self) -> String {
        if self.enable() {
            format!("<Proxy '{}'>", self.server_raw())
        } else {
            "<Proxy Disabled>".to_string()
        }
    }

    /// Human readable listing.
    ///
    /// `max_overrides` limits the override entries shown: `Some(0)` drops the
    /// section, a negative limit or `None` shows all of them.
    pub fn to_display_string(&self, max_overrides: Option<i64>) -> String {
        self.display_with(max_overrides, &OverrideSeparators::default())
    }

    pub fn display_with(&self, max_overrides: Option<i64>, separators: &OverrideSeparators) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_listing(&mut out, max_overrides, separators);
        out
    }

    fn write_listing(
        &self,
        out: &mut dyn fmt::Write,
        max_overrides: Option<i64>,
        separators: &OverrideSeparators,
    ) -> fmt::Result {
        writeln!(out, "{:<15}{}", "ProxyEnable:", self.enable())?;
        writeln!(out, "{:<15}{}", "ProxyHttp1.1:", self.http11())?;
        writeln!(out, "{:<15}{}", "ProxyServer:", self[Slot::Server])?;

        let limit = match max_overrides {
            Some(0) => return Ok(()),
            Some(n) if n > 0 => Some(n as usize),
            _ => None,
        };

        let entries = self.overrides_with(separators);
        writeln!(out, "ProxyOverride:")?;
        let shown = limit.unwrap_or(entries.len()).min(entries.len());
        for entry in &entries[..shown] {
            writeln!(out, "    {}", entry)?;
        }
        let hidden = entries.len() - shown;
        if hidden > 0 {
            writeln!(out, "    ... ({} more)", hidden)?;
        }
        Ok(())
    }
}

impl fmt::Display for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_listing(f, None, &OverrideSeparators::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn defaults() {
        let settings = ProxySettings::new();
        assert!(!settings.enable());
        assert!(settings.http11());
        assert_eq!(settings.server_raw(), "");
        assert_eq!(settings.override_raw(), "");
        assert_eq!(settings.raw(Slot::Enable).kind().tag(), 4);
        assert_eq!(settings.raw(Slot::Server).kind().tag(), 1);
    }

    #[test]
    fn flags_use_numeric_values() {
        let mut settings = ProxySettings::new();
        settings.set_enable(true);
        settings.set_http11(false);
        assert_eq!(settings.raw(Slot::Enable), &RawValue::Dword(1));
        assert_eq!(settings.raw(Slot::Http11), &RawValue::Dword(0));
        assert!(settings.enable());
        assert!(!settings.http11());
    }

    #[test]
    fn only_one_counts_as_enabled() {
        let mut settings = ProxySettings::new();
        settings.restore(Slot::Enable, RawValue::Dword(2));
        assert!(!settings.enable());
        settings.restore(Slot::Enable, RawValue::String("1".into()));
        assert!(!settings.enable());
    }

    #[test]
    fn slot_lookup_ignores_case() {
        assert_eq!(Slot::from_value_name("proxyhttp1.1"), Some(Slot::Http11));
        assert_eq!(Slot::from_value_name("ProxyServer"), Some(Slot::Server));
        assert_eq!(Slot::from_value_name("AutoConfigURL"), None);
    }

    #[test]
    fn set_raw_validates_kind() {
        let mut settings = ProxySettings::new();
        settings.set_raw(Slot::Enable, RawValue::Dword(1)).unwrap();
        assert!(settings.enable());

        let err = settings.set_raw(Slot::Enable, RawValue::Dword(7)).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidArgument(_)));
        let err = settings
            .set_raw(Slot::Http11, RawValue::String("1".into()))
            .unwrap_err();
        assert!(matches!(err, ProxyError::InvalidArgument(_)));
        let err = settings.set_raw(Slot::Server, RawValue::Dword(0)).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidArgument(_)));

        settings
            .set_raw(Slot::Override, RawValue::String("<local>".into()))
            .unwrap();
        assert_eq!(settings.overrides(), vec!["<local>"]);
    }

    #[test]
    fn server_accepts_endpoint_or_map() {
        let mut settings = ProxySettings::new();
        settings.set_server("10.0.0.1:3128");
        assert_eq!(settings.server_raw(), "10.0.0.1:3128");

        let map = BTreeMap::from([
            ("socks".to_string(), "s:1080".to_string()),
            ("http".to_string(), "h:80".to_string()),
        ]);
        settings.set_server(map);
        assert_eq!(settings.server_raw(), "http=h:80;socks=s:1080");

        settings.set_server(ServerMap::new());
        assert_eq!(settings.server_raw(), "");
    }

    #[test]
    fn server_round_trip() {
        let mut settings = ProxySettings::new();
        settings.set_server("http=a:1");
        let view = settings.server().unwrap();
        settings.set_server(view.clone());
        assert_eq!(settings.server().unwrap(), view);
        assert_eq!(view.get("http").map(String::as_str), Some("a:1"));
    }

    #[test]
    fn overrides_drop_blank_entries() {
        let mut settings = ProxySettings::new();
        settings.set_overrides(["a.com", "b.com", "", "c.com"]);
        assert_eq!(settings.override_raw(), "a.com;b.com;;c.com");
        assert_eq!(settings.overrides(), vec!["a.com", "b.com", "c.com"]);

        settings.set_overrides(["a.com", " b.com ", "", "c.com"]);
        assert_eq!(settings.override_raw(), "a.com; b.com ;;c.com");
        assert_eq!(settings.overrides(), vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn summary_names_server() {
        let mut settings = ProxySettings::new();
        assert_eq!(settings.summary(), "<Proxy Disabled>");
        settings.set_enable(true);
        settings.set_server("proxy:8080");
        assert_eq!(settings.summary(), "<Proxy 'proxy:8080'>");
    }

    fn with_overrides(n: usize) -> ProxySettings {
        let mut settings = ProxySettings::new();
        settings.set_overrides((1..=n).map(|i| format!("host{}.local", i)));
        settings
    }

    #[test]
    fn display_without_overrides() {
        let text = with_overrides(5).to_display_string(Some(0));
        assert!(!text.contains("ProxyOverride"));
        assert!(!text.contains("host1.local"));
        assert!(text.contains("ProxyEnable:"));
    }

    #[test]
    fn display_truncates_overrides() {
        let text = with_overrides(5).to_display_string(Some(2));
        assert!(text.contains("host1.local"));
        assert!(text.contains("host2.local"));
        assert!(!text.contains("host3.local"));
        assert!(text.ends_with("    ... (3 more)\n"));
    }

    #[test]
    fn display_shows_all_when_unlimited() {
        let settings = with_overrides(3);
        for limit in [None, Some(-1), Some(3), Some(10)] {
            let text = settings.to_display_string(limit);
            assert!(text.contains("host3.local"), "limit {:?}", limit);
            assert!(!text.contains("more)"), "limit {:?}", limit);
        }
        assert_eq!(settings.to_string(), settings.to_display_string(None));
    }
}
