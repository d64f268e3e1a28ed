//! Interest filter: which (kind, action) pairs the operator wants reported.
//!
//! The interest set is parsed once at startup from `RELAY_EVENTS` and is
//! read-only afterwards. Anything not explicitly listed is dropped.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::event::ISSUES;

/// Event kinds and actions that have a report template.
pub const DEFAULT_EVENTS: &[(&str, &[&str])] = &[
    ("issues", &["opened", "reopened", "closed"]),
    ("merge_request", &["opened", "reopened", "closed"]),
];

/// Mapping from event kind to the set of actions the operator opted into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestConfig {
    events: BTreeMap<String, BTreeSet<String>>,
}

impl InterestConfig {
    /// Interest set covering every pair the renderer knows how to report.
    pub fn all_renderable() -> Self {
        let mut config = Self::default();
        for (kind, actions) in DEFAULT_EVENTS {
            for action in *actions {
                config.insert(kind, action);
            }
        }
        config
    }

    /// Parse the `kind:action,action;kind:action` format.
    ///
    /// Malformed entries (no `:` or an empty kind) are skipped with a warning.
    /// A kind listed with no actions is kept but matches nothing.
    pub fn parse(raw: &str) -> Self {
        let mut config = Self::default();

        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((kind, actions)) = entry.split_once(':') else {
                warn!(entry = %entry, "interest_entry_missing_separator");
                continue;
            };

            let kind = match kind.trim() {
                "" => {
                    warn!(entry = %entry, "interest_entry_missing_kind");
                    continue;
                }
                // GitLab's object_kind spelling for issue hooks
                "issue" => ISSUES,
                kind => kind,
            };

            let set = config.events.entry(kind.to_string()).or_default();
            set.extend(
                actions
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
            );
        }

        config
    }

    pub fn insert(&mut self, kind: &str, action: &str) {
        self.events
            .entry(kind.to_string())
            .or_default()
            .insert(action.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.events.values().all(BTreeSet::is_empty)
    }

    /// Number of (kind, action) pairs in the set.
    pub fn len(&self) -> usize {
        self.events.values().map(BTreeSet::len).sum()
    }

    /// Render back to the `RELAY_EVENTS` format, for startup logging.
    pub fn describe(&self) -> String {
        self.events
            .iter()
            .map(|(kind, actions)| {
                let actions: Vec<&str> = actions.iter().map(String::as_str).collect();
                format!("{}:{}", kind, actions.join(","))
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// True iff `kind` is configured and `action` is one of its allowed actions.
pub fn is_interesting(kind: &str, action: &str, config: &InterestConfig) -> bool {
    config
        .events
        .get(kind)
        .map(|actions| actions.contains(action))
        .unwrap_or(false)
}
