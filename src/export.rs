use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;

use crate::error::Result;
use crate::settings::{OverrideSeparators, ProxySettings, RawValue, ServerMap, Slot};
use crate::store::INTERNET_SETTINGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Registry editor file that can be re-imported with regedit
    Reg,
    /// enable, http11, server and override as YAML
    Yaml,
    /// Raw values, one per line
    Plain,
}

#[derive(Debug, Serialize)]
struct ExportedSettings {
    enable: bool,
    http11: bool,
    server: ServerMap,
    #[serde(rename = "override")]
    overrides: Vec<String>,
}

pub fn render(
    settings: &ProxySettings,
    format: ExportFormat,
    separators: &OverrideSeparators,
    exported_at: DateTime<Local>,
) -> Result<String> {
    match format {
        ExportFormat::Reg => Ok(reg_file(settings, exported_at)),
        ExportFormat::Yaml => yaml(settings, separators),
        ExportFormat::Plain => Ok(plain(settings)),
    }
}

pub fn reg_file(settings: &ProxySettings, exported_at: DateTime<Local>) -> String {
    let mut out = String::from("Windows Registry Editor Version 5.00\r\n\r\n");
    out.push_str(&format!(
        "; winproxy export {}\r\n",
        exported_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("[HKEY_CURRENT_USER\\{}]\r\n", INTERNET_SETTINGS));
    for slot in Slot::ALL {
        out.push_str(&reg_line(slot, settings.raw(slot)));
        out.push_str("\r\n");
    }
    out
}

/// One `"Name"=value` line of a `.reg` file.
pub fn reg_line(slot: Slot, value: &RawValue) -> String {
    match value {
        RawValue::Dword(n) => format!("\"{}\"=dword:{:08x}", slot.value_name(), n),
        RawValue::String(s) => format!("\"{}\"=\"{}\"", slot.value_name(), reg_escape(s)),
    }
}

fn reg_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn yaml(settings: &ProxySettings, separators: &OverrideSeparators) -> Result<String> {
    let exported = ExportedSettings {
        enable: settings.enable(),
        http11: settings.http11(),
        server: settings.server()?,
        overrides: settings.overrides_with(separators),
    };
    Ok(serde_yaml_ng::to_string(&exported)?)
}

pub fn plain(settings: &ProxySettings) -> String {
    Slot::ALL
        .iter()
        .map(|slot| {
            let value = settings.raw(*slot);
            format!("{} = {} ({})\n", slot, value, value.kind().reg_name())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;
    use chrono::TimeZone;

    fn sample() -> ProxySettings {
        let mut settings = ProxySettings::new();
        settings.set_enable(true);
        settings.set_server("http=h:80;https=hs:443");
        settings.set_overrides(["<local>", "*.corp"]);
        settings
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn reg_file_contains_all_values() {
        let text = reg_file(&sample(), noon());
        assert!(text.starts_with("Windows Registry Editor Version 5.00\r\n"));
        assert!(text.contains("; winproxy export 2024-01-15 12:00:00\r\n"));
        assert!(text.contains(
            "[HKEY_CURRENT_USER\\Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings]\r\n"
        ));
        assert!(text.contains("\"ProxyEnable\"=dword:00000001\r\n"));
        assert!(text.contains("\"ProxyHttp1.1\"=dword:00000001\r\n"));
        assert!(text.contains("\"ProxyServer\"=\"http=h:80;https=hs:443\"\r\n"));
        assert!(text.contains("\"ProxyOverride\"=\"<local>;*.corp\"\r\n"));
    }

    #[test]
    fn reg_line_escapes_strings() {
        let line = reg_line(Slot::Override, &RawValue::String("a\\b\"c".into()));
        assert_eq!(line, "\"ProxyOverride\"=\"a\\\\b\\\"c\"");
        let line = reg_line(Slot::Enable, &RawValue::String("1".into()));
        assert_eq!(line, "\"ProxyEnable\"=\"1\"");
    }

    #[test]
    fn yaml_uses_derived_views() {
        let text = yaml(&sample(), &OverrideSeparators::default()).unwrap();
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&text).unwrap();
        assert_eq!(value["enable"], serde_yaml_ng::Value::Bool(true));
        assert_eq!(value["http11"], serde_yaml_ng::Value::Bool(true));
        assert_eq!(value["server"]["http"].as_str(), Some("h:80"));
        assert_eq!(value["server"]["https"].as_str(), Some("hs:443"));
        assert_eq!(value["override"][1].as_str(), Some("*.corp"));
    }

    #[test]
    fn yaml_reports_malformed_server() {
        let mut settings = sample();
        settings.set_server("http=h:80;oops");
        assert!(matches!(
            yaml(&settings, &OverrideSeparators::default()),
            Err(ProxyError::Format { .. })
        ));
    }

    #[test]
    fn plain_lists_raw_slots() {
        let text = plain(&sample());
        assert_eq!(
            text,
            "ProxyEnable = 1 (REG_DWORD)\n\
             ProxyHttp1.1 = 1 (REG_DWORD)\n\
             ProxyServer = http=h:80;https=hs:443 (REG_SZ)\n\
             ProxyOverride = <local>;*.corp (REG_SZ)\n"
        );
    }
}
