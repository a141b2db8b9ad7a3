//! Redaction policy and filter-mode resolution.
//!
//! A [`Policy`] maps field keys to operations. [`resolve`] expands it against
//! a concrete record into the list of `(key, operation)` pairs to apply.

use crate::{FieldKey, Operation, Record, RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether unlisted fields pass through or are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Only fields named in the policy are inspected; everything else passes through.
    #[default]
    Blacklist,
    /// Every field is inspected; fields without a keep/digest/encrypt entry are removed.
    Whitelist,
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().trim_start_matches(':') {
            "blacklist" | "denylist" => Ok(FilterMode::Blacklist),
            "whitelist" | "allowlist" => Ok(FilterMode::Whitelist),
            _ => Err(format!("unknown filter mode: {}", s)),
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Blacklist => write!(f, "blacklist"),
            FilterMode::Whitelist => write!(f, "whitelist"),
        }
    }
}

/// Field → operation map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, String>"
)]
pub struct Policy {
    rules: BTreeMap<FieldKey, Operation>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from raw operation names.
    ///
    /// `None` means remove. Fails on the first operation name that is not
    /// keep/remove/digest/encrypt.
    pub fn parse<K, S, I>(pairs: I) -> Result<Self>
    where
        K: Into<FieldKey>,
        S: AsRef<str>,
        I: IntoIterator<Item = (K, Option<S>)>,
    {
        let mut policy = Policy::new();
        for (key, raw) in pairs {
            let key = key.into();
            let op = Operation::parse_for(&key, raw.as_ref().map(|s| s.as_ref()))?;
            policy.insert(key, op);
        }
        Ok(policy)
    }

    /// Set the operation for a field, returning the previous one.
    pub fn insert(&mut self, key: impl Into<FieldKey>, op: Operation) -> Option<Operation> {
        let key = key.into();
        let previous = self.rules.remove(&key);
        self.rules.insert(key, op);
        previous
    }

    /// Builder form of [`Policy::insert`].
    pub fn with(mut self, key: impl Into<FieldKey>, op: Operation) -> Self {
        self.insert(key, op);
        self
    }

    pub fn get(&self, key: &str) -> Option<Operation> {
        self.rules.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, Operation)> {
        self.rules.iter().map(|(k, op)| (k, *op))
    }

    /// Keys whose operation `decrypt` can reverse.
    pub fn encrypted_keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.iter()
            .filter(|(_, op)| op.is_reversible())
            .map(|(k, _)| k)
    }

    /// Keep only the named entries.
    pub fn subset(&self, names: &[&str]) -> Policy {
        self.iter()
            .filter(|(k, _)| names.contains(&k.name()))
            .map(|(k, op)| (k.clone(), op))
            .collect()
    }

    /// Policy used to filter in whitelist mode.
    ///
    /// Every digested field also keeps its `<key>_digest` companion, so a
    /// record that was already digested survives a second redaction pass.
    /// Explicit entries win over these synthesized ones.
    pub fn whitelist_expanded(&self) -> Policy {
        let mut expanded = Policy::new();
        for (key, op) in self.iter() {
            if op == Operation::Digest {
                expanded.insert(key.digest_key(), Operation::Keep);
            }
        }
        for (key, op) in self.iter() {
            expanded.insert(key.clone(), op);
        }
        expanded
    }
}

impl<K: Into<FieldKey>> FromIterator<(K, Operation)> for Policy {
    fn from_iter<I: IntoIterator<Item = (K, Operation)>>(iter: I) -> Self {
        let mut policy = Policy::new();
        for (k, op) in iter {
            policy.insert(k, op);
        }
        policy
    }
}

impl TryFrom<BTreeMap<String, Option<String>>> for Policy {
    type Error = RedactionError;

    fn try_from(raw: BTreeMap<String, Option<String>>) -> Result<Self> {
        Policy::parse(raw)
    }
}

impl From<Policy> for BTreeMap<String, String> {
    fn from(policy: Policy) -> Self {
        policy
            .rules
            .into_iter()
            .map(|(k, op)| (k.name().to_string(), op.to_string()))
            .collect()
    }
}

/// Compute the ordered `(key, operation)` pairs to apply to `record`.
///
/// Blacklist mode yields every policy entry; entries whose field is absent
/// from the record are skipped by the caller. Whitelist mode yields every
/// record field, with [`Operation::Remove`] for fields the expanded policy
/// does not mention. Keys present in the record keep the record's
/// representation.
pub fn resolve(record: &Record, policy: &Policy, mode: FilterMode) -> Vec<(FieldKey, Operation)> {
    match mode {
        FilterMode::Blacklist => policy
            .iter()
            .map(|(key, op)| {
                let key = record.key(key.name()).unwrap_or(key).clone();
                (key, op)
            })
            .collect(),
        FilterMode::Whitelist => {
            let expanded = policy.whitelist_expanded();
            let mut pairs: Vec<(FieldKey, Operation)> = record
                .keys()
                .map(|key| {
                    let op = expanded.get(key.name()).unwrap_or(Operation::Remove);
                    (key.clone(), op)
                })
                .collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            pairs
        }
    }
}
