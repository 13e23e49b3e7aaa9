//! Source-to-channel lookup.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Immutable mapping from `source_id` to redistribution channel.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<String, String>,
}

impl RoutingTable {
    /// Build a table from configured routes.
    pub fn from_config(routes: &BTreeMap<String, String>) -> Self {
        Self::new(routes.iter().map(|(s, c)| (s.clone(), c.clone())))
    }

    /// Build a table from `(source_id, channel)` pairs.
    pub fn new<I, S, C>(routes: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(s, c)| (s.into(), c.into()))
                .collect(),
        }
    }

    /// Channel for a source, or `None` when the source is not routed.
    pub fn channel_for(&self, source_id: &str) -> Option<&str> {
        self.routes.get(source_id).map(String::as_str)
    }

    /// Distinct channels for the given sources, or for every source when empty.
    pub fn channels(&self, sources: &[String]) -> Vec<String> {
        let selected: BTreeSet<&str> = if sources.is_empty() {
            self.routes.values().map(String::as_str).collect()
        } else {
            sources
                .iter()
                .filter_map(|s| self.channel_for(s))
                .collect()
        };
        selected.into_iter().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
