//! Prefix subscriptions for SUB sockets.
//!
//! A message is accepted when its first frame starts with any registered
//! prefix. The empty prefix matches everything. With no subscriptions at all
//! nothing is accepted.

use bytes::Bytes;

/// A subscription entry with topic prefix
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Topic prefix (empty = subscribe to all)
    pub prefix: Bytes,
    /// Number of times this prefix was subscribed
    refs: usize,
}

impl Subscription {
    /// Create a new subscription for a topic prefix
    #[must_use]
    pub const fn new(prefix: Bytes) -> Self {
        Self { prefix, refs: 1 }
    }

    /// Check if this subscription matches a given topic
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        topic.starts_with(&self.prefix)
    }
}

/// Set of prefix subscriptions, reference counted per prefix.
///
/// Subscribing the same prefix twice needs two unsubscribes to remove it.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Add a subscription
    pub fn subscribe(&mut self, prefix: Bytes) {
        match self.subscriptions.iter_mut().find(|s| s.prefix == prefix) {
            Some(existing) => existing.refs += 1,
            None => self.subscriptions.push(Subscription::new(prefix)),
        }
    }

    /// Remove one reference to a subscription.
    ///
    /// Returns `false` if the prefix was not subscribed.
    pub fn unsubscribe(&mut self, prefix: &[u8]) -> bool {
        let Some(pos) = self.subscriptions.iter().position(|s| s.prefix == prefix) else {
            return false;
        };
        self.subscriptions[pos].refs -= 1;
        if self.subscriptions[pos].refs == 0 {
            self.subscriptions.swap_remove(pos);
        }
        true
    }

    /// Check if a topic matches any subscription
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        self.subscriptions.iter().any(|s| s.matches(topic))
    }

    /// Get all subscriptions
    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Check if there are no subscriptions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Get the number of distinct prefixes
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Clear all subscriptions
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
