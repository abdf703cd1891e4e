use std::collections::BTreeSet;

/// Identities whose listening events are persisted.
///
/// Fixed at startup. An empty set watches everyone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchedSet {
    ids: BTreeSet<String>,
}

impl WatchedSet {
    /// Parse a comma-separated id list. Blank entries are dropped, so `""`
    /// yields the watch-everyone set.
    pub fn parse(list: &str) -> Self {
        list.split(',').collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether records should be built for `id`.
    pub fn allows(&self, id: &str) -> bool {
        self.ids.is_empty() || self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for WatchedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let ids = iter
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { ids }
    }
}
