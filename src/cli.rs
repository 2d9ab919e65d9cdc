use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::error::{ProxyError, Result};
use crate::export::{self, ExportFormat};
use crate::settings::{ALL_KEY, OverrideSeparators, Protocol, ProxySettings, RawValue, Slot, ValueKind};
use crate::store::{self, SettingsStore};

/// Exit status when `reg` is given an unknown value name.
pub const EXIT_INVALID_SUBKEY: u8 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "winproxy",
    version,
    about = "Inspect and change the Windows per-user proxy settings"
)]
pub struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Characters separating ProxyOverride entries
    #[arg(
        long,
        env = "WINPROXY_OVERRIDE_SEPARATORS",
        default_value = ";,",
        global = true,
        value_name = "CHARS"
    )]
    pub override_separators: OverrideSeparators,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enable the proxy
    On,
    /// Disable the proxy
    Off,
    /// Change the current proxy settings
    Set(SetArgs),
    /// Display the current proxy settings
    View {
        /// Number of override entries to show (0 hides them, negative shows all)
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        max_overrides: Option<i64>,
    },
    /// Show or change a single raw registry value
    Reg {
        /// ProxyEnable, ProxyHttp1.1, ProxyServer or ProxyOverride
        subkey: String,
        /// New raw value
        value: Option<String>,
        /// Print the value as a .reg file line
        #[arg(long)]
        export: bool,
    },
    /// Export the current proxy settings
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Reg)]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Open the Internet Options connection settings
    Cpl,
    /// Add the current proxy settings to the database
    Add,
    /// Remove a proxy setting from the database
    Del,
    /// Edit a proxy setting in the database
    Edit,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,
    #[arg(long)]
    pub disable: bool,

    /// Use HTTP 1.1 through proxy connections
    #[arg(long, conflicts_with = "no_http11")]
    pub http11: bool,
    #[arg(long = "no-http11")]
    pub no_http11: bool,

    /// One proxy for every protocol
    #[arg(long, value_name = "ENDPOINT", conflicts_with_all = ["http", "https", "ftp", "socks"])]
    pub all: Option<String>,
    #[arg(long, value_name = "ENDPOINT")]
    pub http: Option<String>,
    #[arg(long, value_name = "ENDPOINT")]
    pub https: Option<String>,
    #[arg(long, value_name = "ENDPOINT")]
    pub ftp: Option<String>,
    #[arg(long, value_name = "ENDPOINT")]
    pub socks: Option<String>,

    /// Hosts that bypass the proxy, e.g. "localhost;*.corp;<local>"
    #[arg(long = "override", value_name = "LIST")]
    pub overrides: Option<String>,
}

impl SetArgs {
    fn protocol_endpoints(&self) -> Vec<(Protocol, &str)> {
        [
            (Protocol::Http, &self.http),
            (Protocol::Https, &self.https),
            (Protocol::Ftp, &self.ftp),
            (Protocol::Socks, &self.socks),
        ]
        .into_iter()
        .filter_map(|(protocol, endpoint)| endpoint.as_deref().map(|e| (protocol, e)))
        .collect()
    }

    /// Apply the requested changes. Returns whether anything was given.
    ///
    /// Per-protocol endpoints are merged into the current per-protocol
    /// servers; a single proxy for all protocols is replaced.
    pub fn apply(&self, settings: &mut ProxySettings, separators: &OverrideSeparators) -> Result<bool> {
        let mut changed = false;

        if self.enable || self.disable {
            settings.set_enable(self.enable);
            changed = true;
        }
        if self.http11 || self.no_http11 {
            settings.set_http11(self.http11);
            changed = true;
        }

        if let Some(all) = &self.all {
            settings.set_server(all.as_str());
            changed = true;
        }
        let endpoints = self.protocol_endpoints();
        if !endpoints.is_empty() {
            let mut servers = settings.server()?;
            servers.remove(ALL_KEY);
            for (protocol, endpoint) in endpoints {
                servers.insert(protocol.as_str().to_string(), endpoint.to_string());
            }
            settings.set_server(servers);
            changed = true;
        }

        if let Some(list) = &self.overrides {
            settings.set_overrides(separators.split(list));
            changed = true;
        }

        Ok(changed)
    }
}

/// Parse a command line value for `slot` according to its expected kind.
pub fn parse_raw(slot: Slot, value: &str) -> Result<RawValue> {
    let raw = match slot.expected_kind() {
        ValueKind::Dword => RawValue::Dword(
            value
                .trim()
                .parse::<u32>()
                .map_err(|e| ProxyError::invalid(format!("{} expects a number, got {:?}: {}", slot, value, e)))?,
        ),
        ValueKind::String => RawValue::String(value.to_string()),
    };
    Ok(raw)
}

/// Run one command. Returns the process exit status.
pub fn run(cli: &Cli, store: &dyn SettingsStore, out: &mut dyn Write) -> anyhow::Result<u8> {
    let separators = &cli.override_separators;

    match &cli.command {
        Command::On | Command::Off => {
            let on = matches!(cli.command, Command::On);
            let mut settings = store::load(store)?;
            settings.set_enable(on);
            store::save(store, &settings)?;
            writeln!(out, "{}", settings.summary())?;
        }
        Command::Set(args) => {
            let mut settings = store::load(store)?;
            if args.apply(&mut settings, separators)? {
                store::save(store, &settings)?;
                writeln!(out, "{}", settings.summary())?;
            } else {
                log::warn!("nothing to change, use `winproxy set --help` for the available options");
            }
        }
        Command::View { max_overrides } => {
            let settings = store::load(store)?;
            write!(out, "{}", settings.display_with(*max_overrides, separators))?;
        }
        Command::Reg {
            subkey,
            value,
            export: as_reg_line,
        } => {
            let Some(slot) = Slot::from_value_name(subkey) else {
                let names: Vec<&str> = Slot::ALL.iter().map(|s| s.value_name()).collect();
                eprintln!("unknown registry value {:?}, expected one of {}", subkey, names.join(", "));
                return Ok(EXIT_INVALID_SUBKEY);
            };

            let mut settings = store::load(store)?;
            if let Some(value) = value {
                settings.set_raw(slot, parse_raw(slot, value)?)?;
                store::save(store, &settings)?;
                log::info!("{} set to {:?}", slot, settings.raw(slot));
            }

            let raw = settings.raw(slot);
            if *as_reg_line {
                writeln!(out, "{}", export::reg_line(slot, raw))?;
            } else {
                writeln!(out, "{} = {} ({})", slot, raw, raw.kind().reg_name())?;
            }
        }
        Command::Export { format, output } => {
            let settings = store::load(store)?;
            let text = export::render(&settings, *format, separators, chrono::Local::now())?;
            match output {
                Some(path) => {
                    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
                    log::info!("exported to {}", path.display());
                }
                None => write!(out, "{}", text)?,
            }
        }
        Command::Cpl => open_control_panel()?,
        Command::Add => not_implemented("add", out)?,
        Command::Del => not_implemented("del", out)?,
        Command::Edit => not_implemented("edit", out)?,
    }

    Ok(0)
}

fn not_implemented(name: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    log::warn!("`{}` is a placeholder", name);
    writeln!(out, "{}: not implemented", name)?;
    Ok(())
}

#[cfg(windows)]
fn open_control_panel() -> anyhow::Result<()> {
    // Tab 4 of inetcpl.cpl is "Connections".
    std::process::Command::new("control.exe")
        .arg("inetcpl.cpl,,4")
        .spawn()
        .context("starting control.exe")?;
    Ok(())
}

#[cfg(not(windows))]
fn open_control_panel() -> anyhow::Result<()> {
    anyhow::bail!("the Internet Options control panel only exists on Windows")
}
