//! Store file format
//!
//! ```ini
//! [DEFAULT]
//! foo = 37987
//! bar: 41234
//! ```
//!
//! Blank lines, `#`/`;` comments and section headers are accepted when
//! reading. Entries from every section land in one table. Names are read
//! case-insensitively and written back in lowercase, so `Foo` and `foo` in
//! one file are duplicates.

use std::path::Path;

use super::{validate_name, Associations};
use crate::error::{Error, Result};

const SECTION: &str = "[DEFAULT]";

/// Parse store file content
pub fn parse(content: &str, path: &Path) -> Result<Associations> {
    let corrupt = |line: usize, reason: String| Error::StoreCorruption {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut table = Associations::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(['#', ';']) {
            continue;
        }
        if line.starts_with('[') {
            if !line.ends_with(']') {
                return Err(corrupt(line_no, format!("unterminated section header {:?}", line)));
            }
            continue;
        }

        let split = line
            .find(['=', ':'])
            .ok_or_else(|| corrupt(line_no, format!("expected `name = port`, got {:?}", line)))?;
        let name = line[..split].trim();
        let value = line[split + 1..].trim();

        validate_name(name).map_err(|_| corrupt(line_no, format!("invalid name {:?}", name)))?;
        let port: u16 = value
            .parse()
            .map_err(|_| corrupt(line_no, format!("invalid port {:?} for {}", value, name)))?;
        if table.get(name).is_some() {
            return Err(corrupt(line_no, format!("duplicate name {:?}", name)));
        }
        table.bind(name, port).map_err(|e| corrupt(line_no, e.to_string()))?;
    }
    Ok(table)
}

/// Render a table in store file format
pub fn render(table: &Associations) -> String {
    let mut out = String::from(SECTION);
    out.push('\n');
    for association in table.iter() {
        out.push_str(&format!("{} = {}\n", association.name, association.port));
    }
    out
}
