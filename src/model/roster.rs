use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trim, collapse runs of whitespace and upper-case a name.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_excluded: bool,
}

impl RosterEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            is_admin: false,
            is_excluded: false,
        }
    }

    pub fn admin(name: &str) -> Self {
        Self {
            is_admin: true,
            is_excluded: true,
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster is empty")]
    Empty,
    #[error("roster lists {0} more than once")]
    Duplicate(String),
}

/// The fixed list of expected participants. Never mutated once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Result<Self, RosterError> {
        if entries.is_empty() {
            return Err(RosterError::Empty);
        }
        let entries: Vec<RosterEntry> = entries
            .into_iter()
            .map(|e| RosterEntry {
                name: normalize_name(&e.name),
                ..e
            })
            .collect();
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.name == entry.name) {
                return Err(RosterError::Duplicate(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let entries: Vec<RosterEntry> = serde_json::from_str(text)?;
        Ok(Self::new(entries)?)
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&RosterEntry> {
        let name = normalize_name(name);
        self.entries.iter().find(|e| e.name == name)
    }

    /// True when the name belongs to an admin entry; such submissions are
    /// stored with the admin flag set.
    pub fn is_admin_name(&self, name: &str) -> bool {
        self.find(name).is_some_and(|e| e.is_admin)
    }

    /// True when the name must never appear in rankings.
    pub fn is_ranking_excluded(&self, name: &str) -> bool {
        self.find(name).is_some_and(|e| e.is_excluded || e.is_admin)
    }
}
