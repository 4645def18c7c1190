//! CLI configuration — resolves `softap_config::FileConfigStore` values
//! against `RunArgs`/`ConfigCommand` flag overrides.

use std::fmt::Write as _;

use softap_core::{ApConfiguration, Band, BandMask, MacAddress, SecurityMode};

use crate::cli::{BandArg, RunArgs, SecurityArg};
use crate::error::CliError;

impl From<BandArg> for Band {
    fn from(arg: BandArg) -> Self {
        match arg {
            BandArg::Ghz2_4 => Band::Ghz2_4,
            BandArg::Ghz5 => Band::Ghz5,
            BandArg::Ghz6 => Band::Ghz6,
        }
    }
}

impl From<SecurityArg> for SecurityMode {
    fn from(arg: SecurityArg) -> Self {
        match arg {
            SecurityArg::Open => SecurityMode::Open,
            SecurityArg::WpaPersonal => SecurityMode::WpaPersonal,
            SecurityArg::WpaEnterprise => SecurityMode::WpaEnterprise,
        }
    }
}

/// Overlay `RunArgs` flags onto the persisted base configuration.
///
/// CLI flags take priority; anything left unset keeps the stored value.
pub fn apply_run_overrides(mut base: ApConfiguration, args: &RunArgs) -> ApConfiguration {
    if let Some(ref ssid) = args.ssid {
        base.ssid = ssid.clone();
    }
    if !args.bands.is_empty() {
        base.bands = BandMask::from_bands(args.bands.iter().copied().map(Band::from));
    }
    if let Some(security) = args.security {
        base.security = security.into();
    }
    base.hidden = args.hidden || base.hidden;
    if let Some(max_clients) = args.max_clients {
        base.max_clients = max_clients;
    }
    if let Some(timeout) = args.shutdown_timeout {
        base.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }
    if args.no_auto_shutdown {
        base.auto_shutdown_enabled = false;
    }
    base
}

/// Plain-text detail view used by `softap config show`.
pub fn format_config_plain(cfg: &ApConfiguration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ssid = \"{}\"", cfg.ssid);
    let _ = writeln!(out, "bssid = {:?}", cfg.bssid);
    let _ = writeln!(out, "bands = [{}]", cfg.bands.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", "));
    let _ = writeln!(out, "security = {:?}", cfg.security);
    let _ = writeln!(out, "hidden = {}", cfg.hidden);
    let _ = writeln!(out, "client_control_enabled = {}", cfg.client_control_enabled);
    let _ = writeln!(out, "blocked_macs = [{}]", cfg.blocked_macs.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));
    let _ = writeln!(out, "allowed_macs = [{}]", cfg.allowed_macs.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));
    let _ = writeln!(out, "max_clients = {}", cfg.max_clients);
    let _ = writeln!(out, "shutdown_timeout_ms = {}", cfg.shutdown_timeout_ms);
    let _ = writeln!(out, "auto_shutdown_enabled = {}", cfg.auto_shutdown_enabled);
    let _ = writeln!(out, "bridged_opportunistic_shutdown_enabled = {}", cfg.bridged_opportunistic_shutdown_enabled);
    out
}

/// Apply a single `softap config set <key> <value>` edit.
pub fn set_field(cfg: &mut ApConfiguration, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "ssid" => cfg.ssid = value.to_string(),
        "bssid" => cfg.bssid = if value.is_empty() { None } else { Some(value.to_string()) },
        "hidden" => cfg.hidden = parse_bool(key, value)?,
        "client_control_enabled" => cfg.client_control_enabled = parse_bool(key, value)?,
        "max_clients" => cfg.max_clients = parse_u32(key, value)?,
        "shutdown_timeout_ms" => cfg.shutdown_timeout_ms = parse_u64(key, value)?,
        "auto_shutdown_enabled" => cfg.auto_shutdown_enabled = parse_bool(key, value)?,
        "bridged_opportunistic_shutdown_enabled" => {
            cfg.bridged_opportunistic_shutdown_enabled = parse_bool(key, value)?;
        }
        "blocked_macs" => cfg.blocked_macs = parse_mac_set(value),
        "allowed_macs" => cfg.allowed_macs = parse_mac_set(value),
        other => {
            return Err(CliError::UnknownConfigKey {
                key: other.to_string(),
                valid: "ssid, bssid, hidden, client_control_enabled, max_clients, \
                        shutdown_timeout_ms, auto_shutdown_enabled, \
                        bridged_opportunistic_shutdown_enabled, blocked_macs, allowed_macs"
                    .to_string(),
            });
        }
    }
    Ok(())
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.to_string(),
        reason: "must be 'true' or 'false'".to_string(),
    })
}

fn parse_u32(field: &str, value: &str) -> Result<u32, CliError> {
    value.parse().map_err(|_| CliError::Validation { field: field.to_string(), reason: "must be a non-negative integer".to_string() })
}

fn parse_u64(field: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation { field: field.to_string(), reason: "must be a non-negative integer".to_string() })
}

/// Comma-separated MAC list, as accepted by `blocked_macs`/`allowed_macs` keys.
fn parse_mac_set(value: &str) -> std::collections::BTreeSet<MacAddress> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(MacAddress::from).collect()
}
