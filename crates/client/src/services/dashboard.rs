use std::sync::Arc;

use auditdesk_auth::{Action, Profile};
use auditdesk_core::{ActivityLog, Audit, AuditStatus, Client, Task, TaskStatus};
use auditdesk_infra::{DataStore, Repository};
use serde::Serialize;

use crate::error::AppResult;
use crate::session::SessionManager;

pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Per-status head-count of tasks or audits. For audits `pending` counts
/// drafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusTally {
    pub fn of_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut t, task| {
            t.total += 1;
            match task.status {
                TaskStatus::Pending => t.pending += 1,
                TaskStatus::InProgress => t.in_progress += 1,
                TaskStatus::Completed => t.completed += 1,
            }
            t
        })
    }

    pub fn of_audits(audits: &[Audit]) -> Self {
        audits.iter().fold(Self::default(), |mut t, audit| {
            t.total += 1;
            match audit.status {
                AuditStatus::Draft => t.pending += 1,
                AuditStatus::InProgress => t.in_progress += 1,
                AuditStatus::Completed => t.completed += 1,
            }
            t
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub clients: u64,
    pub tasks: StatusTally,
    pub audits: StatusTally,
    pub users: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    clients: Repository<Client>,
    tasks: Repository<Task>,
    audits: Repository<Audit>,
    profiles: Repository<Profile>,
    activity: Repository<ActivityLog>,
    session: Arc<SessionManager>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DataStore>, session: Arc<SessionManager>) -> Self {
        Self {
            clients: Repository::new(store.clone()),
            tasks: Repository::new(store.clone()),
            audits: Repository::new(store.clone()),
            profiles: Repository::new(store.clone()),
            activity: Repository::new(store),
            session,
        }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        self.session.require(Action::ViewDashboard)?;
        let (clients, tasks, audits, users) = tokio::try_join!(
            self.clients.count(self.clients.query()),
            self.tasks.list(self.tasks.query()),
            self.audits.list(self.audits.query()),
            self.profiles.count(self.profiles.query()),
        )?;
        Ok(DashboardStats {
            clients,
            tasks: StatusTally::of_tasks(&tasks),
            audits: StatusTally::of_audits(&audits),
            users,
        })
    }

    pub async fn recent_activity(&self) -> AppResult<Vec<ActivityLog>> {
        self.session.require(Action::ViewDashboard)?;
        let query = self.activity.query().newest_first().limit(RECENT_ACTIVITY_LIMIT);
        Ok(self.activity.list(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditdesk_core::TaskId;
    use chrono::Utc;
    use proptest::prelude::*;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: TaskId::new(),
            title: "t".into(),
            description: None,
            client_id: None,
            status,
            assigned_to: None,
            created_by: None,
            due_date: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn tally_counts_each_status() {
        let tasks = [TaskStatus::Pending, TaskStatus::Completed, TaskStatus::Completed].map(task);
        assert_eq!(
            StatusTally::of_tasks(&tasks),
            StatusTally {
                total: 3,
                pending: 1,
                in_progress: 0,
                completed: 2
            }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn tally_parts_sum_to_total(statuses in proptest::collection::vec(proptest::sample::select(TaskStatus::ALL.to_vec()), 0..40)) {
            let tasks: Vec<Task> = statuses.into_iter().map(task).collect();
            let t = StatusTally::of_tasks(&tasks);
            prop_assert_eq!(t.total, tasks.len());
            prop_assert_eq!(t.pending + t.in_progress + t.completed, t.total);
        }
    }
}
