//! Port knowledge and probing
//!
//! Static knowledge (assigned ports), host state (the ephemeral range) and
//! live probing (is a port free right now) live here. `PortContext` bundles
//! the immutable parts so they can be computed once and passed around.

use std::path::Path;

pub mod assignments;
pub mod ephemeral;
pub mod pool;
pub mod port;
pub mod range;

use crate::error::Result;

pub use assignments::AssignmentTable;
pub use pool::{CandidatePool, PoolOptions};
pub use port::{PortProbe, SocketProbe};
pub use range::{Blacklist, PortRange};

/// Immutable host port knowledge computed once per process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortContext {
    assignments: AssignmentTable,
    ephemeral: PortRange,
}

impl PortContext {
    pub fn new(assignments: AssignmentTable, ephemeral: PortRange) -> Self {
        Self {
            assignments,
            ephemeral,
        }
    }

    /// Built-in assignment table plus the host's ephemeral range
    pub fn detect() -> Result<Self> {
        Ok(Self::new(
            AssignmentTable::builtin()?,
            ephemeral::ephemeral_range(),
        ))
    }

    /// Like `detect`, but reads the assignment table from `path` when given
    pub fn load(assignments_path: Option<&Path>) -> Result<Self> {
        let assignments = match assignments_path {
            Some(path) => AssignmentTable::from_file(path)?,
            None => AssignmentTable::builtin()?,
        };
        Ok(Self::new(assignments, ephemeral::ephemeral_range()))
    }

    pub fn assignments(&self) -> &AssignmentTable {
        &self.assignments
    }

    /// Reserved, assigned or ephemeral
    pub fn is_excluded(&self, port: u16) -> bool {
        self.assignments.is_assigned_or_reserved(port) || self.ephemeral.contains(port)
    }
}
