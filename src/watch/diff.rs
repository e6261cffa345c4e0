use std::collections::HashMap;

use serde::Serialize;

use crate::discovery::KeyValuePair;

/// Last observed key → value mapping of one watch path
pub type Snapshot = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeUnit {
    #[serde(rename = "path_on_change")]
    pub path: String,
    pub value: String,
}

impl ChangeUnit {
    pub fn new(
        path: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Categorized difference between two snapshots of `root`.
///
/// Serializes to the notification body; all three lists are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ChangeSet {
    pub root: String,
    #[serde(rename = "addition")]
    pub additions: Vec<ChangeUnit>,
    #[serde(rename = "modification")]
    pub modifications: Vec<ChangeUnit>,
    /// Values are always empty
    #[serde(rename = "deletion")]
    pub deletions: Vec<ChangeUnit>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.modifications.is_empty() && self.deletions.is_empty()
    }
}

/// Compares `fetched` against `old` and returns the change set together
/// with the snapshot that replaces `old`.
///
/// Additions and modifications keep the order of `fetched`; deletions are
/// sorted by key.
pub fn diff(
    root: &str,
    old: &Snapshot,
    fetched: Vec<KeyValuePair>,
) -> (ChangeSet, Snapshot) {
    let mut changes = ChangeSet {
        root: root.to_string(),
        ..Default::default()
    };
    let mut remaining = old.clone();
    let mut current = Snapshot::with_capacity(fetched.len());

    for KeyValuePair { key, value } in fetched {
        // Matched keys leave `remaining` immediately; whatever is left at
        // the end was deleted upstream.
        match remaining.remove(&key) {
            None => changes.additions.push(ChangeUnit::new(key.clone(), value.clone())),
            Some(previous) if previous != value => {
                changes.modifications.push(ChangeUnit::new(key.clone(), value.clone()))
            }
            Some(_) => {}
        }
        current.insert(key, value);
    }

    let mut deleted: Vec<String> = remaining.into_keys().collect();
    deleted.sort();
    changes.deletions = deleted.into_iter().map(|key| ChangeUnit::new(key, "")).collect();

    (changes, current)
}
