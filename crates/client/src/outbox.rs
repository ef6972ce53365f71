//! Pending-profile outbox.
//!
//! Holds profile drafts whose insert failed after the owning identity could
//! not be rolled back. Entries leave the outbox once delivered.

use std::sync::Mutex;

use auditdesk_auth::NewProfile;
use auditdesk_core::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingProfile {
    pub draft: NewProfile,
    pub attempts: u32,
    pub last_error: String,
    pub recorded_at: DateTime<Utc>,
}

/// In-process outbox; cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct ProfileOutbox {
    entries: Mutex<Vec<PendingProfile>>,
}

impl ProfileOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or re-record) the draft for its identity.
    pub fn record(&self, draft: NewProfile, error: impl Into<String>) {
        let error = error.into();
        let Ok(mut entries) = self.entries.lock() else {
            tracing::error!(identity = %draft.id, "outbox lock poisoned; profile draft lost");
            return;
        };
        match entries.iter_mut().find(|e| e.draft.id == draft.id) {
            Some(entry) => {
                entry.draft = draft;
                entry.attempts += 1;
                entry.last_error = error;
            }
            None => entries.push(PendingProfile {
                draft,
                attempts: 1,
                last_error: error,
                recorded_at: Utc::now(),
            }),
        }
    }

    /// Drafts in recording order.
    pub fn pending(&self) -> Vec<PendingProfile> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn for_identity(&self, id: UserId) -> Option<PendingProfile> {
        self.entries
            .lock()
            .ok()
            .and_then(|e| e.iter().find(|p| p.draft.id == id).cloned())
    }

    pub fn mark_delivered(&self, id: UserId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|p| p.draft.id != id);
        }
    }

    pub fn mark_failed(&self, id: UserId, error: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entry) = entries.iter_mut().find(|p| p.draft.id == id) {
                entry.attempts += 1;
                entry.last_error = error.into();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditdesk_auth::Role;

    fn draft(id: UserId) -> NewProfile {
        NewProfile {
            id,
            email: "a@b.co".into(),
            full_name: "A".into(),
            role: Role::Team,
        }
    }

    #[test]
    fn re_recording_bumps_attempts_instead_of_duplicating() {
        let outbox = ProfileOutbox::new();
        let id = UserId::new();
        outbox.record(draft(id), "first");
        outbox.record(draft(id), "second");
        assert_eq!(outbox.len(), 1);
        let entry = outbox.for_identity(id).unwrap();
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error, "second");
    }

    #[test]
    fn delivered_entries_leave() {
        let outbox = ProfileOutbox::new();
        let (a, b) = (UserId::new(), UserId::new());
        outbox.record(draft(a), "x");
        outbox.record(draft(b), "y");
        outbox.mark_failed(a, "again");
        outbox.mark_delivered(b);
        let pending = outbox.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].draft.id, a);
        assert_eq!(pending[0].attempts, 2);
    }
}
