//! Push-based snapshot store.
//!
//! The external state owner publishes a new immutable [`StageSnapshot`] on
//! every state transition; subscribers are notified synchronously, in
//! subscription order, with the same shared snapshot.

use std::sync::Arc;

use crate::{StageCommand, StageResult, StageSnapshot};

/// Token returned by [`SnapshotStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Arc<StageSnapshot>) -> StageResult<()>>;

/// Observer registry holding the current snapshot.
pub struct SnapshotStore {
    current: Arc<StageSnapshot>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl SnapshotStore {
    /// Create a store holding `initial`.
    #[must_use]
    pub fn new(initial: StageSnapshot) -> Self {
        Self {
            current: Arc::new(initial),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<StageSnapshot> {
        Arc::clone(&self.current)
    }

    /// Register a subscriber. It is not called until the next publish.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Arc<StageSnapshot>) -> StageResult<()> + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Replace the current snapshot and notify every subscriber.
    ///
    /// All subscribers run even if one fails.
    ///
    /// # Errors
    ///
    /// Returns the first subscriber error.
    pub fn publish(&mut self, snapshot: StageSnapshot) -> StageResult<()> {
        self.current = Arc::new(snapshot);
        let mut first_error = None;
        for (_, subscriber) in &mut self.subscribers {
            if let Err(e) = subscriber(&self.current) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Reduce `commands` into the current snapshot with
    /// [`StageSnapshot::apply`] and publish the result once.
    ///
    /// # Errors
    ///
    /// Returns the first subscriber error.
    pub fn dispatch_all(&mut self, commands: &[StageCommand]) -> StageResult<()> {
        if commands.is_empty() {
            return Ok(());
        }
        let next = commands
            .iter()
            .fold((*self.current).clone(), |snapshot, command| snapshot.apply(command));
        self.publish(next)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
