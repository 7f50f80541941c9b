use super::{visible_to, ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription, RiskStore};
use crate::errors::{Result, RiskmapError};
use crate::risk::{normalize_risk, RawRisk, Risk};
use chrono::Utc;
use parking_lot::RwLock;
use std::future::{ready, Future};
use uuid::Uuid;

/// Thread-safe in-process store, kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    risks: RwLock<Vec<Risk>>,
    feed: ChangeFeed,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without publishing change events.
    pub fn with_risks(risks: Vec<Risk>) -> Self {
        Self {
            risks: RwLock::new(risks),
            feed: ChangeFeed::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.risks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.read().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Risk> {
        self.risks.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn list_now(&self, organization_id: &str, project_id: Option<&str>) -> Vec<RawRisk> {
        self.risks
            .read()
            .iter()
            .filter(|risk| visible_to(&risk.organization_id, organization_id))
            .filter(|risk| match project_id {
                Some(project) => risk.project.as_ref().is_some_and(|p| p.id == project),
                None => true,
            })
            .map(RawRisk::from)
            .collect()
    }

    fn insert_now(&self, mut payload: RawRisk) -> Result<Risk> {
        let id = payload
            .id
            .take()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        payload.id = Some(id.clone());

        let risk = normalize_risk(&payload, None, Utc::now())?;
        {
            let mut risks = self.risks.write();
            if risks.iter().any(|r| r.id == id) {
                return Err(RiskmapError::store(format!("risk {id} already exists")));
            }
            risks.push(risk.clone());
        }
        self.notify(&risk.organization_id, &risk.id, ChangeKind::Inserted);
        Ok(risk)
    }

    fn update_now(&self, id: &str, payload: RawRisk) -> Result<Risk> {
        let (previous_org, updated) = {
            let mut risks = self.risks.write();
            let slot = risks
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| RiskmapError::NotFound(id.to_string()))?;
            let mut updated = normalize_risk(&payload, Some(slot), Utc::now())?;
            // the id is the store's key, payloads cannot rename a record
            updated.id = slot.id.clone();
            let previous = std::mem::replace(slot, updated.clone());
            (previous.organization_id, updated)
        };
        // a risk moved to another organization leaves the old one's view too
        if previous_org != updated.organization_id {
            self.notify(&previous_org, &updated.id, ChangeKind::Updated);
        }
        self.notify(&updated.organization_id, &updated.id, ChangeKind::Updated);
        Ok(updated)
    }

    fn delete_now(&self, id: &str) -> Result<()> {
        let removed = {
            let mut risks = self.risks.write();
            let index = risks
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| RiskmapError::NotFound(id.to_string()))?;
            risks.remove(index)
        };
        self.notify(&removed.organization_id, &removed.id, ChangeKind::Deleted);
        Ok(())
    }

    fn notify(&self, organization_id: &str, risk_id: &str, kind: ChangeKind) {
        let reached = self.feed.publish(ChangeEvent {
            organization_id: organization_id.to_string(),
            risk_id: risk_id.to_string(),
            kind,
        });
        log::debug!("{:?} risk {} ({} subscribers)", kind, risk_id, reached);
    }
}

impl RiskStore for InMemoryStore {
    fn list_risks(
        &self,
        organization_id: &str,
        project_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<RawRisk>>> + Send {
        ready(Ok(self.list_now(organization_id, project_id)))
    }

    fn insert_risk(&self, payload: RawRisk) -> impl Future<Output = Result<Risk>> + Send {
        ready(self.insert_now(payload))
    }

    fn update_risk(
        &self,
        id: &str,
        payload: RawRisk,
    ) -> impl Future<Output = Result<Risk>> + Send {
        ready(self.update_now(id, payload))
    }

    fn delete_risk(&self, id: &str) -> impl Future<Output = Result<()>> + Send {
        ready(self.delete_now(id))
    }

    fn subscribe(&self, organization_id: &str) -> ChangeSubscription {
        self.feed.subscribe(organization_id)
    }
}
