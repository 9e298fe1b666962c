//! Tab-separated host inventory.
//!
//! Each line holds `hostname`, `domain`, `environment` and `run list`,
//! separated by tabs. Blank lines are skipped and extra trailing columns
//! are ignored. The whole file is validated before any host is returned,
//! so a bad row means nothing gets queued.

use std::fs;
use std::path::Path;

use crate::error::InventoryError;
use crate::types::Host;

const COLUMNS: usize = 4;

/// Load and validate an inventory file.
pub fn load(path: &Path) -> Result<Vec<Host>, InventoryError> {
    let content = fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let hosts = parse(&content)?;
    log::debug!("Loaded {} hosts from {}", hosts.len(), path.display());
    Ok(hosts)
}

/// Parse and validate inventory text.
pub fn parse(content: &str) -> Result<Vec<Host>, InventoryError> {
    let mut hosts = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        // A row of empty fields still has its separators.
        if line.trim().is_empty() && !line.contains('\t') {
            continue;
        }
        hosts.push(parse_row(idx + 1, line)?);
    }

    Ok(hosts)
}

fn parse_row(line_no: usize, line: &str) -> Result<Host, InventoryError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < COLUMNS {
        return Err(InventoryError::MissingColumns {
            line: line_no,
            found: fields.len(),
        });
    }

    let host = Host::new(fields[0], fields[1], fields[2], fields[3]);
    match host.missing_field() {
        Some(field) => Err(InventoryError::EmptyField {
            line: line_no,
            field,
            row: line.to_string(),
        }),
        None => Ok(host),
    }
}
