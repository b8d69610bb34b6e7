//! Ephemeral (dynamic) port range detection
//!
//! The kernel hands ports from this range to sockets that never asked for a
//! specific one, so a port taken from it can be grabbed by an unrelated
//! connection at any moment.

use log::{debug, warn};

use super::range::PortRange;

/// Range used when the host exposes no configuration.
///
/// Covers both the Linux default (32768-60999) and the IANA dynamic range
/// (49152-65535).
pub const DEFAULT_EPHEMERAL_RANGE: PortRange = PortRange {
    start: 32768,
    end: 65535,
};

/// Query the host for its ephemeral port range, falling back to the default
pub fn ephemeral_range() -> PortRange {
    match platform::detect() {
        Some(range) => {
            debug!("Detected ephemeral port range {}", range);
            range
        }
        None => {
            warn!(
                "Could not detect ephemeral port range, assuming {}",
                DEFAULT_EPHEMERAL_RANGE
            );
            DEFAULT_EPHEMERAL_RANGE
        }
    }
}

/// Parse `low<whitespace>high` as found in `ip_local_port_range`
pub fn parse_port_range(contents: &str) -> Option<PortRange> {
    let mut parts = contents.split_whitespace();
    let (first, last) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    parse_port_bounds(first, last)
}

/// Build a range from two decimal bounds, e.g. two `sysctl -n` outputs
pub fn parse_port_bounds(first: &str, last: &str) -> Option<PortRange> {
    let start: u16 = first.trim().parse().ok()?;
    let end: u16 = last.trim().parse().ok()?;
    PortRange::new(start, end).ok()
}

#[cfg(target_os = "linux")]
mod platform {
    use std::fs;

    use super::{parse_port_range, PortRange};

    const PROC_PATH: &str = "/proc/sys/net/ipv4/ip_local_port_range";

    pub fn detect() -> Option<PortRange> {
        let contents = fs::read_to_string(PROC_PATH).ok()?;
        parse_port_range(&contents)
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
))]
mod platform {
    use std::process::Command;

    use super::{parse_port_bounds, PortRange};

    pub fn detect() -> Option<PortRange> {
        let first = sysctl("net.inet.ip.portrange.first")?;
        let last = sysctl("net.inet.ip.portrange.last")?;
        parse_port_bounds(&first, &last)
    }

    fn sysctl(key: &str) -> Option<String> {
        let output = Command::new("sysctl").arg("-n").arg(key).output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
mod platform {
    use super::PortRange;

    pub fn detect() -> Option<PortRange> {
        None
    }
}
