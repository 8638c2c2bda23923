//! Named queues shown on the board.

use std::fmt;
use std::sync::Arc;

use crate::adapter::QueueAdapter;

/// Queues shown on the board, in registration order.
///
/// Names are unique; registering a name twice replaces the earlier adapter
/// and keeps its position.
#[derive(Clone, Default)]
pub struct QueueRegistry {
    queues: Vec<(String, Arc<dyn QueueAdapter>)>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, adapter: Arc<dyn QueueAdapter>) {
        let name = name.into();
        match self.queues.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = adapter,
            None => self.queues.push((name, adapter)),
        }
    }

    /// Builder-style [`add`](Self::add).
    pub fn with_queue(mut self, name: impl Into<String>, adapter: Arc<dyn QueueAdapter>) -> Self {
        self.add(name, adapter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn QueueAdapter>> {
        self.queues
            .iter()
            .find(|(queue_name, _)| queue_name == name)
            .map(|(_, adapter)| adapter)
    }

    /// First registered queue, the one whose backend reports server metrics.
    pub fn first(&self) -> Option<(&str, &Arc<dyn QueueAdapter>)> {
        self.queues
            .first()
            .map(|(name, adapter)| (name.as_str(), adapter))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn QueueAdapter>)> {
        self.queues
            .iter()
            .map(|(name, adapter)| (name.as_str(), adapter))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queues.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
