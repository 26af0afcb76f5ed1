use dashmap::DashMap;

/// In-memory count of inbound realtime messages per player name.
///
/// Shared by every connection. Sharded, so increments for different names
/// do not contend and increments for the same name are never lost. Entries
/// live for the life of the process.
#[derive(Debug, Default)]
pub struct ConnectionTally {
    counts: DashMap<String, u64>,
}

impl ConnectionTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the counter for `player` and returns the new value.
    pub fn increment(&self, player: &str) -> u64 {
        let mut count = self.counts.entry(player.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, player: &str) -> u64 {
        self.counts.get(player).map(|count| *count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
