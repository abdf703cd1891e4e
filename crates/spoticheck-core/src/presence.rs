use std::collections::HashSet;

/// Identities currently believed to be playing music.
///
/// Advisory state owned by a single dispatcher; only used to decide when a
/// "stopped listening" transition is worth logging.
#[derive(Debug, Default)]
pub struct ListenerPresence {
    listening: HashSet<String>,
}

impl ListenerPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as listening. Returns `true` if it was not already.
    pub fn insert(&mut self, id: &str) -> bool {
        self.listening.insert(id.to_string())
    }

    /// Clear `id`. Returns `true` if it was listening.
    pub fn remove(&mut self, id: &str) -> bool {
        self.listening.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.listening.contains(id)
    }

    pub fn len(&self) -> usize {
        self.listening.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listening.is_empty()
    }
}
