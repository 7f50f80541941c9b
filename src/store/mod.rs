//! Record store boundary.
//!
//! The engine only needs five operations from persistence: list raw records
//! for an organization, insert, update, delete, and subscribe to change
//! notifications. [`RiskStore`] captures that contract; [`memory`] and
//! [`json_file`] are the two implementations shipped with the crate.

pub mod json_file;
pub mod memory;

use crate::errors::Result;
use crate::risk::{RawRisk, Risk};
use std::future::Future;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// Buffered notifications per subscriber before it starts lagging.
const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A mutation happened somewhere in an organization's risks.
///
/// An empty `organization_id` marks a record that belongs to no organization;
/// such records are listed for every organization, so their events are too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub organization_id: String,
    pub risk_id: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn concerns(&self, organization_id: &str) -> bool {
        visible_to(&self.organization_id, organization_id)
    }
}

/// Whether a record owned by `owner` is listed for `organization_id`.
pub fn visible_to(owner: &str, organization_id: &str) -> bool {
    owner.trim().is_empty() || owner == organization_id
}

/// Persistence collaborator for the risk pipeline.
pub trait RiskStore: Send + Sync + 'static {
    /// Raw, unvalidated records for an organization, optionally for one project.
    fn list_risks(
        &self,
        organization_id: &str,
        project_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<RawRisk>>> + Send;

    fn insert_risk(&self, payload: RawRisk) -> impl Future<Output = Result<Risk>> + Send;

    fn update_risk(&self, id: &str, payload: RawRisk)
        -> impl Future<Output = Result<Risk>> + Send;

    fn delete_risk(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Change notifications scoped to one organization. Dropping the
    /// subscription unsubscribes.
    fn subscribe(&self, organization_id: &str) -> ChangeSubscription;
}

/// In-process fan-out of change events, shared by the bundled stores.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { sender }
    }

    /// Publish an event; returns the number of subscribers reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, organization_id: &str) -> ChangeSubscription {
        ChangeSubscription {
            organization_id: organization_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of an organization-scoped change feed.
#[derive(Debug)]
pub struct ChangeSubscription {
    organization_id: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Wait for the next relevant change. Returns `false` once the feed is gone.
    ///
    /// A lagged receiver has missed events and therefore counts as a change.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.concerns(&self.organization_id) => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    log::debug!("Change subscription lagged by {} events", missed);
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }

    /// Consume already-queued notifications without waiting; returns how many were relevant.
    pub fn drain(&mut self) -> usize {
        let mut relevant = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.concerns(&self.organization_id) => relevant += 1,
                Ok(_) => {}
                Err(TryRecvError::Lagged(_)) => relevant += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return relevant,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(org: &str) -> ChangeEvent {
        ChangeEvent {
            organization_id: org.to_string(),
            risk_id: "r1".to_string(),
            kind: ChangeKind::Updated,
        }
    }

    #[tokio::test]
    async fn test_subscription_ignores_other_organizations() {
        let feed = ChangeFeed::new();
        let mut subscription = feed.subscribe("org-a");
        feed.publish(event("org-b"));
        feed.publish(event("org-a"));
        assert!(subscription.changed().await);
        assert_eq!(subscription.drain(), 0);
    }

    #[test]
    fn test_drain_counts_relevant_events() {
        let feed = ChangeFeed::new();
        let mut subscription = feed.subscribe("org-a");
        for _ in 0..5 {
            feed.publish(event("org-a"));
        }
        feed.publish(event("org-b"));
        assert_eq!(subscription.drain(), 5);
        assert_eq!(subscription.drain(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.publish(event("org-a")), 0);
        let subscription = feed.subscribe("org-a");
        assert_eq!(feed.subscriber_count(), 1);
        subscription.unsubscribe();
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_unowned_events_reach_every_organization() {
        let feed = ChangeFeed::new();
        let mut first = feed.subscribe("org-a");
        let mut second = feed.subscribe("org-b");
        feed.publish(event(""));
        assert_eq!(first.drain(), 1);
        assert_eq!(second.drain(), 1);
    }

    #[tokio::test]
    async fn test_lagged_subscription_reports_change() {
        let feed = ChangeFeed::new();
        let mut subscription = feed.subscribe("org-a");
        for _ in 0..(CHANGE_FEED_CAPACITY + 10) {
            feed.publish(event("org-b"));
        }
        assert!(subscription.changed().await);
    }
}
