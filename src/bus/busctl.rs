//! Production [`ControlBus`] backed by the `busctl` command-line client.
//!
//! Each query is one `busctl` child process. The per-query deadline is passed
//! to `busctl --timeout` and also enforced here by a watchdog on the child, so
//! a wedged client cannot stall a refresh round.

#![allow(missing_docs)]

use std::io;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::bus::{ControlBus, MANAGER_DESTINATION, MANAGER_INTERFACE, MANAGER_PATH, UnitObject};
use crate::core::config::BusConfig;
use crate::core::errors::{Result, SvcError};

/// Extra time granted to the child beyond its own `--timeout` before it is killed.
const WATCHDOG_GRACE: Duration = Duration::from_millis(250);
/// How often the watchdog checks whether the child has exited.
const WATCHDOG_POLL: Duration = Duration::from_millis(5);

// ──────────────────── bus driver ────────────────────

/// `busctl` driver for the system or user service manager.
#[derive(Debug, Clone)]
pub struct BusctlBus {
    program: PathBuf,
    user_scope: bool,
    timeout: Duration,
}

impl BusctlBus {
    #[must_use]
    pub const fn new(program: PathBuf, user_scope: bool, timeout: Duration) -> Self {
        Self {
            program,
            user_scope,
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(
            config.busctl_path.clone(),
            config.user_scope,
            Duration::from_millis(config.query_timeout_ms),
        )
    }

    /// Scope and timeout flags shared by every invocation.
    fn base_args(&self) -> Vec<String> {
        let scope = if self.user_scope { "--user" } else { "--system" };
        vec![
            scope.to_string(),
            format!("--timeout={}ms", self.timeout.as_millis()),
        ]
    }

    fn call_args(destination: &str, path: &str, interface: &str, method: &str) -> Vec<String> {
        vec![
            "call".to_string(),
            destination.to_string(),
            path.to_string(),
            interface.to_string(),
            method.to_string(),
        ]
    }

    /// `LoadUnit` returns the object path and loads the unit on demand, so
    /// units that are unknown or masked still report their `LoadState`.
    fn resolve_args(unit_name: &str) -> Vec<String> {
        let mut args =
            Self::call_args(MANAGER_DESTINATION, MANAGER_PATH, MANAGER_INTERFACE, "LoadUnit");
        args.push("s".to_string());
        args.push(unit_name.to_string());
        args
    }

    /// Run one `busctl` invocation and return the parsed string value of its reply.
    fn query(&self, target: &str, args: &[String]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.args(self.base_args()).args(args);

        let outcome = run_with_deadline(command, self.timeout + WATCHDOG_GRACE).map_err(|e| {
            SvcError::Bus {
                target: target.to_string(),
                details: format!("failed to run {}: {e}", self.program.display()),
            }
        })?;

        let output = match outcome {
            CommandOutcome::Finished(output) => output,
            CommandOutcome::TimedOut => return Err(self.timeout_error(target)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.contains("timed out") {
                return Err(self.timeout_error(target));
            }
            return Err(SvcError::Bus {
                target: target.to_string(),
                details: format!(
                    "busctl exited with {}: {stderr}",
                    output.status.code().unwrap_or(-1)
                ),
            });
        }

        parse_reply(target, &String::from_utf8_lossy(&output.stdout))
    }

    fn timeout_error(&self, target: &str) -> SvcError {
        SvcError::BusTimeout {
            target: target.to_string(),
            timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl ControlBus for BusctlBus {
    fn ping(&self) -> Result<()> {
        let args = Self::call_args(
            "org.freedesktop.DBus",
            "/org/freedesktop/DBus",
            "org.freedesktop.DBus",
            "GetId",
        );
        self.query("org.freedesktop.DBus", &args)
            .map(|_| ())
            .map_err(|e| SvcError::BusConnect {
                details: e.to_string(),
            })
    }

    fn resolve_unit(&self, unit_name: &str) -> Result<UnitObject> {
        self.query(unit_name, &Self::resolve_args(unit_name)).map(UnitObject::new)
    }

    fn get_property(
        &self,
        object: &UnitObject,
        interface: &str,
        property: &str,
    ) -> Result<String> {
        let args = vec![
            "get-property".to_string(),
            MANAGER_DESTINATION.to_string(),
            object.as_str().to_string(),
            interface.to_string(),
            property.to_string(),
        ];
        self.query(&format!("{object} {property}"), &args)
    }
}

// ──────────────────── child watchdog ────────────────────

#[derive(Debug)]
enum CommandOutcome {
    Finished(Output),
    TimedOut,
}

/// Spawn `command` and wait for it, killing the child once `deadline` passes.
fn run_with_deadline(mut command: Command, deadline: Duration) -> io::Result<CommandOutcome> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let started = Instant::now();
    loop {
        if child.try_wait()?.is_some() {
            return child.wait_with_output().map(CommandOutcome::Finished);
        }
        if started.elapsed() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(CommandOutcome::TimedOut);
        }
        thread::sleep(WATCHDOG_POLL);
    }
}

// ──────────────────── reply parsing ────────────────────

/// Parse a single-value `busctl` reply such as `s "active"` or `o "/org/..."`.
///
/// Only string-like signatures are accepted; anything else is malformed for
/// the four status properties and `LoadUnit`.
pub fn parse_reply(target: &str, stdout: &str) -> Result<String> {
    let malformed = |details: String| SvcError::BusMalformed {
        target: target.to_string(),
        details,
    };

    let line = stdout.trim();
    let (signature, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| malformed(format!("unexpected reply {line:?}")))?;

    if !matches!(signature, "s" | "o" | "g") {
        return Err(malformed(format!("unsupported signature {signature:?}")));
    }

    let quoted = rest.trim();
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| malformed(format!("value is not quoted: {quoted:?}")))?;

    Ok(unescape(inner))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ──────────────────── tests ────────────────────
