use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::ApiClient;
use crate::models::user::UserProfile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileFeedError {
    #[error("Profile fetch failed: {0}")]
    Fetch(String),

    #[error("Profile feed error: {0}")]
    Feed(String),
}

/// One profile document state. `Ok(None)` means the document does not exist yet.
pub type ProfileSnapshot = Result<Option<UserProfile>, ProfileFeedError>;

/// Live stream of profile snapshots for one user.
/// Dropping it unsubscribes.
pub struct ProfileSubscription {
    rx: mpsc::Receiver<ProfileSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl ProfileSubscription {
    pub fn new(rx: mpsc::Receiver<ProfileSnapshot>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Next snapshot, or `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<ProfileSnapshot> {
        self.rx.recv().await
    }
}

impl Drop for ProfileSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Anything that can push profile changes: polling, websockets, a
/// document-store listener.
pub trait ProfileSource: Send + Sync {
    fn subscribe(&self, uid: &str) -> ProfileSubscription;
}

/// Polls `GET /users/me` and emits a snapshot whenever the answer changes.
pub struct PollingProfileSource {
    api: ApiClient,
    interval: Duration,
}

impl PollingProfileSource {
    pub fn new(api: ApiClient, interval: Duration) -> Self {
        Self { api, interval }
    }
}

impl ProfileSource for PollingProfileSource {
    fn subscribe(&self, uid: &str) -> ProfileSubscription {
        let api = self.api.clone();
        let interval = self.interval;
        let uid = uid.to_string();
        let (tx, rx) = mpsc::channel(4);

        let task = tokio::spawn(async move {
            let mut last: Option<ProfileSnapshot> = None;
            loop {
                let snapshot = fetch_profile(&api).await;
                if last.as_ref() != Some(&snapshot) {
                    debug!("Profile for {uid} changed");
                    if tx.send(snapshot.clone()).await.is_err() {
                        return;
                    }
                    last = Some(snapshot);
                }
                tokio::time::sleep(interval).await;
            }
        });

        ProfileSubscription::new(rx, Some(task))
    }
}

async fn fetch_profile(api: &ApiClient) -> ProfileSnapshot {
    match api.users().profile().await {
        Ok(profile) => Ok(Some(profile)),
        Err(e) if e.status() == Some(404) => Ok(None),
        Err(e) => Err(ProfileFeedError::Fetch(e.to_string())),
    }
}

/// In-process feed: whoever owns the source publishes documents, and
/// subscribers get the latest one immediately plus every later change.
#[derive(Default)]
pub struct PushProfileSource {
    documents: Mutex<HashMap<String, watch::Sender<Option<ProfileSnapshot>>>>,
}

impl PushProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, uid: &str, snapshot: ProfileSnapshot) {
        let mut docs = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        docs.entry(uid.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(snapshot));
    }

    pub fn publish_profile(&self, profile: UserProfile) {
        let uid = profile.uid.clone();
        self.publish(&uid, Ok(Some(profile)));
    }

    fn document(&self, uid: &str) -> watch::Receiver<Option<ProfileSnapshot>> {
        let mut docs = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        docs.entry(uid.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }
}

impl ProfileSource for PushProfileSource {
    fn subscribe(&self, uid: &str) -> ProfileSubscription {
        let mut doc = self.document(uid);
        let (tx, rx) = mpsc::channel(16);

        let task = tokio::spawn(async move {
            loop {
                let current = doc.borrow_and_update().clone();
                if let Some(snapshot) = current {
                    if tx.send(snapshot).await.is_err() {
                        return;
                    }
                }
                if doc.changed().await.is_err() {
                    return;
                }
            }
        });

        ProfileSubscription::new(rx, Some(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Plan;

    fn profile(uid: &str, uses: u32) -> UserProfile {
        UserProfile {
            uid: uid.to_string(),
            email: None,
            display_name: None,
            photo_url: None,
            plan: Plan::Free,
            free_uses_remaining: uses,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_current_document() {
        let source = PushProfileSource::new();
        source.publish_profile(profile("u1", 2));

        let mut sub = source.subscribe("u1");
        let snap = sub.next().await.unwrap().unwrap().unwrap();
        assert_eq!(snap.free_uses_remaining, 2);
    }

    #[tokio::test]
    async fn test_subscriber_sees_later_changes_only_for_its_uid() {
        let source = PushProfileSource::new();
        let mut sub = source.subscribe("u1");

        source.publish_profile(profile("u2", 9));
        source.publish_profile(profile("u1", 1));

        let snap = sub.next().await.unwrap().unwrap().unwrap();
        assert_eq!(snap.uid, "u1");
        assert_eq!(snap.free_uses_remaining, 1);
    }

    #[tokio::test]
    async fn test_missing_document_and_errors_pass_through() {
        let source = PushProfileSource::new();
        let mut sub = source.subscribe("u1");

        source.publish("u1", Ok(None));
        assert_eq!(sub.next().await.unwrap(), Ok(None));

        source.publish("u1", Err(ProfileFeedError::Feed("permission denied".into())));
        assert!(sub.next().await.unwrap().is_err());
    }
}
