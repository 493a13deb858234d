//! Readers for the kernel's power supply and ACPI lid switch state.
//!
//! - AC adapters live under `/sys/class/power_supply/<name>/` with
//!   `type == "Mains"` and an `online` flag.
//! - Lid switches live under `/proc/acpi/button/lid/<name>/state` and read
//!   like `state:      open`.
//!
//! Both roots are parameters so tests can point them at a temp tree.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";
pub const LID_ROOT: &str = "/proc/acpi/button/lid";

/// Whether any mains adapter reports `online == 1`.
///
/// Returns `Ok(None)` when the machine has no mains supply entry at all (or
/// the root does not exist), which callers treat as "unknown".
pub fn read_mains_online(root: &Path) -> std::io::Result<Option<bool>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut seen = false;
    for entry in entries {
        let dir = entry?.path();
        let Ok(kind) = fs::read_to_string(dir.join("type")) else {
            continue;
        };
        if kind.trim() != "Mains" {
            continue;
        }
        let Ok(online) = fs::read_to_string(dir.join("online")) else {
            continue;
        };
        seen = true;
        if online.trim() == "1" {
            return Ok(Some(true));
        }
    }

    Ok(seen.then_some(false))
}

/// Whether the lid is open. `Ok(None)` when no lid switch exists.
pub fn read_lid_open(root: &Path) -> std::io::Result<Option<bool>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let state_path = entry?.path().join("state");
        let Ok(content) = fs::read_to_string(&state_path) else {
            continue;
        };
        if let Some(open) = parse_lid_state(&content) {
            return Ok(Some(open));
        }
    }

    Ok(None)
}

/// Parse the content of an ACPI lid `state` file.
pub fn parse_lid_state(content: &str) -> Option<bool> {
    let value = content
        .trim()
        .strip_prefix("state:")
        .unwrap_or(content)
        .trim();
    match value {
        "open" => Some(true),
        "closed" => Some(false),
        _ => None,
    }
}
