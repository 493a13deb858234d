//! Invocation of `systemctl` and parsing of its machine-readable output.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// `systemctl` exit code for "no such unit" (LSB `status` convention).
pub const EXIT_NO_SUCH_UNIT: i32 = 4;

/// `systemctl` exit code when a start/stop job names a unit that is not loaded.
pub const EXIT_NOT_LOADED: i32 = 5;

/// Captured result of one `systemctl` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemctlOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SystemctlOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code suitable for error reporting (-1 when terminated by a signal)
    pub fn code_or_signal(&self) -> i32 {
        self.code.unwrap_or(-1)
    }

    /// First non-empty line of stderr, used in log messages
    pub fn error_line(&self) -> &str {
        self.stderr
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}

/// Handle on the `systemctl` binary.
///
/// Every call runs to completion: the child is always waited, so no zombie
/// outlives the call even when the output is discarded.
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: PathBuf,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new()
    }
}

impl Systemctl {
    /// Use `systemctl` from `PATH`
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("systemctl"),
        }
    }

    /// Use a specific binary instead of the one on `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `systemctl <args>` and capture its output.
    pub fn run<I, S>(&self, args: I) -> std::io::Result<SystemctlOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(SystemctlOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run `systemctl show` for a unit, restricted to the given properties.
    ///
    /// The properties map is empty when the call fails.
    pub fn show(
        &self,
        unit: &str,
        properties: &[&str],
    ) -> std::io::Result<(SystemctlOutput, HashMap<String, String>)> {
        let mut args: Vec<String> = vec!["show".to_string()];
        for property in properties {
            args.push(format!("--property={}", property));
        }
        args.push("--".to_string());
        args.push(unit.to_string());

        let output = self.run(&args)?;
        let properties = if output.success() {
            parse_show_output(&output.stdout)
        } else {
            HashMap::new()
        };
        Ok((output, properties))
    }
}

/// Parse `KEY=VALUE` lines as printed by `systemctl show`.
///
/// Values may contain `=`; only the first one separates key and value.
pub fn parse_show_output(stdout: &str) -> HashMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Split a space separated unit list property (`RequiredBy=a.service b.service`).
pub fn split_unit_list(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}

#[cfg(test)]
mod tests;
