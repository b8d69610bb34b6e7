//! Table of assigned and well-known ports
//!
//! The table is read once from a line-oriented data file and never changes
//! afterwards. A default table is compiled into the binary.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::debug;

use super::range::PortRange;
use crate::error::{Error, Result};

/// Ports below this value are reserved no matter what the table says
pub const SYSTEM_PORT_LIMIT: u16 = 1024;

const DEFAULT_TABLE: &str = include_str!("data/well_known_ports.txt");

/// Immutable set of ports registered to known services
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentTable {
    ports: BTreeSet<u16>,
}

impl AssignmentTable {
    /// Table built from an explicit list of ports
    pub fn from_ports<I: IntoIterator<Item = u16>>(ports: I) -> Self {
        Self {
            ports: ports.into_iter().collect(),
        }
    }

    /// The table compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_TABLE)
    }

    /// Load a table from a data file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read port assignments from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let table = Self::parse(&content)?;
        debug!(
            "Loaded {} assigned ports from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Parse the data format: one port or `low-high` range per line, `#` comments
    pub fn parse(content: &str) -> Result<Self> {
        let mut ports = BTreeSet::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let range: PortRange = line.parse().map_err(|e| {
                Error::Configuration(format!("Port assignments line {}: {}", idx + 1, e))
            })?;
            ports.extend(range.ports());
        }
        Ok(Self { ports })
    }

    pub fn is_assigned(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    /// True for assigned ports and for every port in the system range
    pub fn is_assigned_or_reserved(&self, port: u16) -> bool {
        port < SYSTEM_PORT_LIMIT || self.is_assigned(port)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
