//! Persistent name to port associations
//!
//! A store maps names to ports, at most one port per name and at most one
//! name per port. Names are case-insensitive and kept in lowercase. Backends
//! implement `AssociationStore`; the selector only talks to the trait.

use serde::Serialize;

use crate::error::{Error, Result};

pub mod codec;
pub mod file;
pub mod lock;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// One name bound to one port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub name: String,
    pub port: u16,
}

impl Association {
    pub fn new(name: &str, port: u16) -> Self {
        Self {
            name: name.to_string(),
            port,
        }
    }
}

/// Outcome of an insert-if-absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The name was free and now maps to the requested port
    Committed(u16),
    /// The name was already bound; the existing port wins
    Existing(u16),
}

impl Claim {
    pub fn port(&self) -> u16 {
        match self {
            Claim::Committed(port) | Claim::Existing(port) => *port,
        }
    }
}

/// Durable name to port table
pub trait AssociationStore {
    /// Get the port bound to a name
    fn lookup(&self, name: &str) -> Result<Option<u16>>;

    /// Bind a name to a port, replacing any previous port for that name
    fn bind(&self, name: &str, port: u16) -> Result<()>;

    /// Bind a name to a port unless the name is already bound
    fn claim(&self, name: &str, port: u16) -> Result<Claim>;

    /// Remove a name. Returns whether it was bound
    fn unbind(&self, name: &str) -> Result<bool>;

    /// All associations in store order
    fn list(&self) -> Result<Vec<Association>>;
}

/// Ordered association table. One port per name, one name per port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Associations {
    entries: Vec<Association>,
}

impl Associations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        let name = fold_name(name);
        self.entries.iter().find(|a| a.name == name).map(|a| a.port)
    }

    /// Name currently holding `port`
    pub fn owner_of(&self, port: u16) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.port == port)
            .map(|a| a.name.as_str())
    }

    /// Upsert. Fails if another name holds the port
    pub fn bind(&mut self, name: &str, port: u16) -> Result<()> {
        let name = fold_name(name);
        if let Some(owner) = self.owner_of(port) {
            if owner != name {
                return Err(Error::PortTaken {
                    port,
                    owner: owner.to_string(),
                });
            }
        }
        match self.entries.iter_mut().find(|a| a.name == name) {
            Some(entry) => entry.port = port,
            None => self.entries.push(Association::new(&name, port)),
        }
        Ok(())
    }

    /// Insert-if-absent
    pub fn claim(&mut self, name: &str, port: u16) -> Result<Claim> {
        if let Some(existing) = self.get(name) {
            return Ok(Claim::Existing(existing));
        }
        self.bind(name, port)?;
        Ok(Claim::Committed(port))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let name = fold_name(name);
        let before = self.entries.len();
        self.entries.retain(|a| a.name != name);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Association> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Association> {
        self.entries
    }
}

/// Form a name is stored and compared in
fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Reject names the store file could not represent
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.trim() != name
        || name.contains(['=', ':', '[', ']', '\n', '\r'])
        || name.starts_with(['#', ';']);
    if invalid {
        return Err(Error::InvalidArgument(format!("Invalid name: {:?}", name)));
    }
    Ok(())
}
