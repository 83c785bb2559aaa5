//! Results ledger: one `<system_id> <energy>` or `<system_id> ERROR` line per
//! evaluated system, appended as runs complete.

use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

const ERROR_MARKER: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub system_id: String,
    /// `None` records a failed evaluation
    pub energy: Option<f64>,
}

impl LedgerEntry {
    pub fn success(system_id: impl Into<String>, energy: f64) -> Self {
        Self {
            system_id: system_id.into(),
            energy: Some(energy),
        }
    }

    pub fn failure(system_id: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            energy: None,
        }
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.energy {
            Some(energy) => write!(f, "{} {}", self.system_id, energy),
            None => write!(f, "{} {}", self.system_id, ERROR_MARKER),
        }
    }
}

/// Append entries in order, creating the ledger if needed.
pub fn append_entries(path: &Path, entries: &[LedgerEntry]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Unable to open ledger: {}", path.display()))?;
    for entry in entries {
        writeln!(file, "{}", entry)?;
    }
    Ok(())
}

pub fn parse_ledger(content: &str) -> Result<Vec<LedgerEntry>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| -> Result<LedgerEntry> {
            let mut fields = line.split_whitespace();
            let (id, value) = match (fields.next(), fields.next(), fields.next()) {
                (Some(id), Some(value), None) => (id, value),
                _ => return Err(eyre!("Malformed ledger line {}: {:?}", idx + 1, line)),
            };
            if value == ERROR_MARKER {
                return Ok(LedgerEntry::failure(id));
            }
            let energy = value
                .parse::<f64>()
                .map_err(|e| eyre!("Malformed energy on ledger line {}: {}", idx + 1, e))?;
            Ok(LedgerEntry::success(id, energy))
        })
        .collect()
}

pub fn read_ledger(path: &Path) -> Result<Vec<LedgerEntry>> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read ledger: {}", path.display()))?;
    parse_ledger(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_format() {
        assert_eq!(LedgerEntry::success("h2o", -8.25).to_string(), "h2o -8.25");
        assert_eq!(LedgerEntry::failure("ch4").to_string(), "ch4 ERROR");
    }

    #[test]
    fn test_append_keeps_existing_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.txt");
        append_entries(&path, &[LedgerEntry::success("a", -1.5)]).unwrap();
        append_entries(
            &path,
            &[LedgerEntry::failure("b"), LedgerEntry::success("c", -0.123456789012345)],
        )
        .unwrap();

        let entries = read_ledger(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                LedgerEntry::success("a", -1.5),
                LedgerEntry::failure("b"),
                LedgerEntry::success("c", -0.123456789012345),
            ]
        );
    }

    #[test]
    fn test_malformed_lines_rejected() {
        assert!(parse_ledger("h2o\n").is_err());
        assert!(parse_ledger("h2o -1.0 extra\n").is_err());
        let err = parse_ledger("a -1.0\nb minus-one\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let entries = parse_ledger("\na -1.0\n\n").unwrap();
        assert_eq!(entries, vec![LedgerEntry::success("a", -1.0)]);
    }
}
