//! Store backed by a single JSON document holding an array of raw records.
//!
//! Reads tolerate whatever is in the file; records are only validated when
//! the pipeline normalizes them. Missing creation timestamps are filled in and
//! saved the first time a record is read. Mutations rewrite the whole document
//! and notify subscribers within this process. Records without an
//! `organization_id` are shared by every organization.

use super::{visible_to, ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription, RiskStore};
use crate::errors::{Result, RiskmapError};
use crate::risk::{normalize_risk, stamp_creation_defaults, RawRisk, Risk};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    feed: ChangeFeed,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            feed: ChangeFeed::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store.
    async fn read_records(&self) -> Result<Vec<RawRisk>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RiskmapError::fetch(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            RiskmapError::fetch(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    /// Read, filling in missing creation timestamps and saving them so later
    /// reads report the same dates.
    async fn read_stamped(&self) -> Result<Vec<RawRisk>> {
        let mut records = self.read_records().await?;
        if stamp_all(&mut records, Utc::now()) == 0 {
            return Ok(records);
        }

        let _guard = self.write_lock.lock().await;
        // a writer may have finished between the first read and the lock
        let mut records = self.read_records().await?;
        let stamped = stamp_all(&mut records, Utc::now());
        if stamped > 0 {
            match self.write_records(&records).await {
                Ok(()) => log::debug!(
                    "Saved default timestamps for {} records in {}",
                    stamped,
                    self.path.display()
                ),
                Err(e) => log::warn!("Default timestamps were not saved: {}", e),
            }
        }
        Ok(records)
    }

    async fn write_records(&self, records: &[RawRisk]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            RiskmapError::store(format!("cannot write {}: {}", self.path.display(), e))
        })
    }

    fn notify(&self, organization_id: &str, risk_id: &str, kind: ChangeKind) {
        self.feed.publish(ChangeEvent {
            organization_id: organization_id.to_string(),
            risk_id: risk_id.to_string(),
            kind,
        });
    }
}

fn stamp_all(records: &mut [RawRisk], now: DateTime<Utc>) -> usize {
    records
        .iter_mut()
        .map(|raw| stamp_creation_defaults(raw, now))
        .filter(|stamped| *stamped)
        .count()
}

fn position_of(records: &[RawRisk], id: &str) -> Option<usize> {
    records.iter().position(|r| r.id.as_deref() == Some(id))
}

impl RiskStore for JsonFileStore {
    async fn list_risks(
        &self,
        organization_id: &str,
        project_id: Option<&str>,
    ) -> Result<Vec<RawRisk>> {
        let records = self.read_stamped().await?;
        Ok(records
            .into_iter()
            .filter(|raw| {
                visible_to(raw.organization_id.as_deref().unwrap_or(""), organization_id)
            })
            .filter(|raw| match project_id {
                Some(project) => raw.project_id.as_deref() == Some(project),
                None => true,
            })
            .collect())
    }

    async fn insert_risk(&self, mut payload: RawRisk) -> Result<Risk> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await?;

        let id = payload
            .id
            .take()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if position_of(&records, &id).is_some() {
            return Err(RiskmapError::store(format!("risk {id} already exists")));
        }
        payload.id = Some(id);

        let risk = normalize_risk(&payload, None, Utc::now())?;
        records.push(RawRisk::from(&risk));
        self.write_records(&records).await?;
        self.notify(&risk.organization_id, &risk.id, ChangeKind::Inserted);
        Ok(risk)
    }

    async fn update_risk(&self, id: &str, payload: RawRisk) -> Result<Risk> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let mut records = self.read_records().await?;
        stamp_all(&mut records, now);
        let index =
            position_of(&records, id).ok_or_else(|| RiskmapError::NotFound(id.to_string()))?;

        let previous = normalize_risk(&records[index], None, now)?;
        let mut updated = normalize_risk(&payload, Some(&previous), now)?;
        updated.id = previous.id.clone();

        records[index] = RawRisk::from(&updated);
        self.write_records(&records).await?;
        if previous.organization_id != updated.organization_id {
            self.notify(&previous.organization_id, id, ChangeKind::Updated);
        }
        self.notify(&updated.organization_id, id, ChangeKind::Updated);
        Ok(updated)
    }

    async fn delete_risk(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await?;
        let index =
            position_of(&records, id).ok_or_else(|| RiskmapError::NotFound(id.to_string()))?;
        let removed = records.remove(index);
        self.write_records(&records).await?;

        let owner = removed.organization_id.unwrap_or_default();
        self.notify(&owner, id, ChangeKind::Deleted);
        Ok(())
    }

    fn subscribe(&self, organization_id: &str) -> ChangeSubscription {
        self.feed.subscribe(organization_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{Level, RiskStatus};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("risks.json"))
    }

    fn payload(title: &str) -> RawRisk {
        RawRisk {
            organization_id: Some("org".into()),
            ..RawRisk::titled(title)
        }
    }

    #[tokio::test]
    async fn test_missing_file_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.list_risks("org", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_fetch_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();
        let err = store.list_risks("org", None).await.unwrap_err();
        assert!(matches!(err, RiskmapError::Fetch(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_mutations_persist_to_disk() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let risk = store
            .insert_risk(RawRisk {
                probability: Some("high".into()),
                impact: Some("high".into()),
                ..payload("Supplier bankruptcy")
            })
            .await
            .unwrap();
        assert_eq!(risk.risk_score(), 16);

        let reopened = store_in(&dir);
        let records = reopened.list_risks("org", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Supplier bankruptcy"));

        let updated = reopened
            .update_risk(
                &risk.id,
                RawRisk {
                    status: Some("mitigated".into()),
                    impact: Some("low".into()),
                    ..RawRisk::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RiskStatus::Mitigated);
        assert_eq!(updated.impact(), Level::Low);
        assert_eq!(updated.risk_score(), 8);

        reopened.delete_risk(&risk.id).await.unwrap();
        assert!(store.list_risks("org", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disallowed_transition_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let risk = store
            .insert_risk(RawRisk {
                status: Some("mitigated".into()),
                ..payload("Outage")
            })
            .await
            .unwrap();
        let err = store
            .update_risk(
                &risk.id,
                RawRisk {
                    status: Some("identified".into()),
                    ..RawRisk::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("status"));
        let records = store.list_risks("org", None).await.unwrap();
        assert_eq!(records[0].status.as_deref(), Some("mitigated"));
    }

    #[tokio::test]
    async fn test_hand_written_records_are_listed_raw() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"[
                {"id": "x", "title": "Legacy", "probability": 4, "tags": "a, b"},
                {"id": "y", "organization_id": "other", "title": "Elsewhere"}
            ]"#,
        )
        .unwrap();
        let records = store.list_risks("org", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].probability.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_unowned_record_stays_shared_after_update() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"[{"id": "x", "title": "Legacy"}]"#).unwrap();
        assert_eq!(store.list_risks("default", None).await.unwrap().len(), 1);
        let mut subscription = store.subscribe("default");

        store
            .update_risk(
                "x",
                RawRisk {
                    status: Some("assessed".into()),
                    ..RawRisk::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(subscription.drain(), 1);
        let records = store.list_risks("default", None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].organization_id, None);
        assert_eq!(records[0].status.as_deref(), Some("assessed"));
    }

    #[tokio::test]
    async fn test_moving_organizations_notifies_both() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let risk = store.insert_risk(payload("Relocated")).await.unwrap();
        let mut old_org = store.subscribe("org");
        let mut new_org = store.subscribe("other");

        store
            .update_risk(
                &risk.id,
                RawRisk {
                    organization_id: Some("other".into()),
                    ..RawRisk::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(old_org.drain(), 1);
        assert_eq!(new_org.drain(), 1);
        assert!(store.list_risks("org", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_defaulted_timestamps_are_saved_once() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"[{"id": "x", "organization_id": "org", "title": "Legacy", "status": "closed"}]"#,
        )
        .unwrap();

        let first = store.list_risks("org", None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let second = store.list_risks("org", None).await.unwrap();
        assert_eq!(first, second);
        assert!(first[0].created_at.is_some());
        assert_eq!(first[0].identified_date, first[0].created_at);
        assert!(first[0].closed_date.is_some());

        let on_disk: Vec<RawRisk> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, first);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let first = RawRisk {
            id: Some("fixed".into()),
            ..payload("One")
        };
        store.insert_risk(first.clone()).await.unwrap();
        assert!(matches!(
            store.insert_risk(first).await,
            Err(RiskmapError::Store(_))
        ));
    }
}
