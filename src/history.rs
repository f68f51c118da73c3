// Query history per role, behind a storage-agnostic interface

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn key(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Ordered query history, oldest first, kept separately per role.
pub trait HistoryStore {
    fn load(&self, role: Role) -> Result<Vec<String>>;

    /// Store the trimmed query. Blank queries are ignored and return `false`.
    fn append(&mut self, role: Role, query: &str) -> Result<bool>;

    /// Drop the entry at `index`. Out of range is a no-op returning `false`.
    fn remove(&mut self, role: Role, index: usize) -> Result<bool>;
}

type Entries = IndexMap<Role, Vec<String>>;

fn append_entry(entries: &mut Entries, role: Role, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return false;
    }
    entries.entry(role).or_default().push(query.to_string());
    true
}

fn remove_entry(entries: &mut Entries, role: Role, index: usize) -> bool {
    match entries.get_mut(&role) {
        Some(list) if index < list.len() => {
            list.remove(index);
            true
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Entries,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn load(&self, role: Role) -> Result<Vec<String>> {
        Ok(self.entries.get(&role).cloned().unwrap_or_default())
    }

    fn append(&mut self, role: Role, query: &str) -> Result<bool> {
        Ok(append_entry(&mut self.entries, role, query))
    }

    fn remove(&mut self, role: Role, index: usize) -> Result<bool> {
        Ok(remove_entry(&mut self.entries, role, index))
    }
}

/// History persisted as a JSON object of `role -> [queries]`. The file is
/// read on every call so concurrent CLI runs see each other's writes.
#[derive(Debug, Clone)]
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file {}", self.path.display()))?;
        if text.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&text)
            .with_context(|| format!("History file {} is not valid JSON", self.path.display()))
    }

    fn write(&self, entries: &Entries) -> Result<()> {
        let text = serde_json::to_string_pretty(entries).context("Failed to serialize history")?;
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write history file {}", self.path.display()))
    }
}

impl HistoryStore for JsonFileHistory {
    fn load(&self, role: Role) -> Result<Vec<String>> {
        Ok(self.read()?.shift_remove(&role).unwrap_or_default())
    }

    fn append(&mut self, role: Role, query: &str) -> Result<bool> {
        let mut entries = self.read()?;
        let changed = append_entry(&mut entries, role, query);
        if changed {
            self.write(&entries)?;
            tracing::debug!(%role, "History entry appended");
        }
        Ok(changed)
    }

    fn remove(&mut self, role: Role, index: usize) -> Result<bool> {
        let mut entries = self.read()?;
        let changed = remove_entry(&mut entries, role, index);
        if changed {
            self.write(&entries)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_history_per_role() {
        let mut h = MemoryHistory::new();
        assert!(h.append(Role::User, "  total gdp by year ").unwrap());
        assert!(!h.append(Role::User, "   ").unwrap());
        assert!(h.append(Role::Admin, "list tables").unwrap());

        assert_eq!(h.load(Role::User).unwrap(), vec!["total gdp by year"]);
        assert_eq!(h.load(Role::Admin).unwrap(), vec!["list tables"]);
    }

    #[test]
    fn test_memory_history_remove() {
        let mut h = MemoryHistory::new();
        h.append(Role::User, "a").unwrap();
        h.append(Role::User, "b").unwrap();
        assert!(!h.remove(Role::User, 5).unwrap());
        assert!(!h.remove(Role::Admin, 0).unwrap());
        assert!(h.remove(Role::User, 0).unwrap());
        assert_eq!(h.load(Role::User).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("guest".parse::<Role>().is_err());
    }
}
