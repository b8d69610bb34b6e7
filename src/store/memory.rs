use std::sync::Mutex;

use super::{validate_name, Association, AssociationStore, Associations, Claim};
use crate::error::Result;

/// In-process store. Nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Associations>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<T>(&self, f: impl FnOnce(&mut Associations) -> T) -> T {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut table)
    }
}

impl AssociationStore for MemoryStore {
    fn lookup(&self, name: &str) -> Result<Option<u16>> {
        Ok(self.with_table(|table| table.get(name)))
    }

    fn bind(&self, name: &str, port: u16) -> Result<()> {
        validate_name(name)?;
        self.with_table(|table| table.bind(name, port))
    }

    fn claim(&self, name: &str, port: u16) -> Result<Claim> {
        validate_name(name)?;
        self.with_table(|table| table.claim(name, port))
    }

    fn unbind(&self, name: &str) -> Result<bool> {
        Ok(self.with_table(|table| table.remove(name)))
    }

    fn list(&self) -> Result<Vec<Association>> {
        Ok(self.with_table(|table| table.clone().into_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_semantics() {
        let store = MemoryStore::new();

        store.bind("foo", 40001).unwrap();
        assert_eq!(store.lookup("foo").unwrap(), Some(40001));
        assert_eq!(store.claim("foo", 40002).unwrap(), Claim::Existing(40001));

        assert!(store.unbind("foo").unwrap());
        assert_eq!(store.lookup("foo").unwrap(), None);
        assert_eq!(store.list().unwrap(), vec![]);
    }
}
