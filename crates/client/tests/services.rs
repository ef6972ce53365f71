//! Page services against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use auditdesk_auth::{AuthError, Role, SignUpRequest};
use auditdesk_client::services::ChecklistService;
use auditdesk_client::{App, AppError, ViewScope};
use auditdesk_core::{ClientForm, FolderType, Table, TaskForm, TaskStatus};
use auditdesk_infra::{InMemoryIdentityProvider, InMemoryStore, MemorySessionStorage};

async fn signed_in(role: Role) -> (App, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let storage = Arc::new(MemorySessionStorage::new());
    let app = App::from_parts(store.clone(), identity, storage, None);
    app.session.initialize().await;
    let req = SignUpRequest::new("me@firm.co", "secret1", "Me", Some(role)).unwrap();
    app.session.sign_up(req).await.unwrap();
    (app, store)
}

fn client_form(name: &str) -> ClientForm {
    ClientForm {
        name: name.into(),
        contact_person: String::new(),
        email: String::new(),
        phone: String::new(),
        address: String::new(),
    }
}

fn task_form(title: &str, client: Option<auditdesk_core::ClientId>) -> TaskForm {
    TaskForm {
        title: title.into(),
        description: String::new(),
        client_id: client,
        due_date: String::new(),
        assigned_to: Vec::new(),
    }
}

#[tokio::test]
async fn team_member_cannot_create_clients() {
    let (app, store) = signed_in(Role::Team).await;
    let err = app.services.clients.create(client_form("Acme")).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(store.len(Table::Clients), 0);
    assert!(app.services.clients.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_client_keeps_its_tasks() {
    let (app, store) = signed_in(Role::Admin).await;
    let client = app.services.clients.create(client_form("Acme")).await.unwrap();
    let task = app
        .services
        .tasks
        .create(task_form("Close books", Some(client.id)))
        .await
        .unwrap();

    let prompt = app.services.clients.delete(&client).unwrap();
    assert_eq!(prompt.message(), "Are you sure you want to delete this client?");
    prompt.confirm().await.unwrap();

    assert_eq!(store.len(Table::Clients), 0);
    let tasks = app.services.tasks.list(None).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task.id, task.id);
    assert_eq!(tasks[0].task.client_id, Some(client.id));
    assert!(tasks[0].clients.is_none());
}

#[tokio::test]
async fn concurrent_status_changes_resolve_to_the_last_write() {
    let (app, _store) = signed_in(Role::Team).await;
    let task = app.services.tasks.create(task_form("Review", None)).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);

    let (a, b) = tokio::join!(
        app.services.tasks.change_status(&task, TaskStatus::InProgress),
        app.services.tasks.change_status(&task, TaskStatus::Completed),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let stored = app.services.tasks.list(None).await.unwrap().remove(0).task;
    assert!(stored.status == a.status || stored.status == b.status);
    assert!(stored.updated_at.is_some());
}

#[tokio::test]
async fn status_filter_and_invalid_transition() {
    let (app, _store) = signed_in(Role::Team).await;
    let done = app.services.tasks.create(task_form("Done", None)).await.unwrap();
    app.services.tasks.create(task_form("Open", None)).await.unwrap();
    let done = app
        .services
        .tasks
        .change_status(&done, TaskStatus::Completed)
        .await
        .unwrap();

    let completed = app.services.tasks.list(Some(TaskStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].task.title, "Done");

    let err = app
        .services
        .tasks
        .change_status(&done, TaskStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));
}

#[tokio::test]
async fn checklist_progress_follows_toggles() {
    let (app, _store) = signed_in(Role::Team).await;
    let svc = &app.services.checklists;
    svc.create(None, "Year end").await.unwrap();

    for desc in ["Bank", "Payroll", "VAT", "Fixed assets"] {
        let list = svc.list().await.unwrap().remove(0);
        svc.add_item(&list, desc).await.unwrap();
    }
    let list = svc.list().await.unwrap().remove(0);
    let order: Vec<i32> = list.checklist_items.iter().map(|i| i.order_index).collect();
    assert_eq!(order, [1, 2, 3, 4]);

    let me = app.session.current().session().unwrap().user_id();
    let checked = svc.toggle_item(&list.checklist_items[0]).await.unwrap();
    assert!(checked.is_checked);
    assert_eq!(checked.checked_by, Some(me));
    svc.toggle_item(&list.checklist_items[2]).await.unwrap();

    let list = svc.list().await.unwrap().remove(0);
    assert_eq!(ChecklistService::progress(&list).percent(), 50);

    let unchecked = svc.toggle_item(&list.checklist_items[0]).await.unwrap();
    assert!(!unchecked.is_checked);
    assert!(unchecked.checked_by.is_none());
    assert!(unchecked.checked_at.is_none());
}

#[tokio::test]
async fn user_management_guards_the_current_admin() {
    let (app, _store) = signed_in(Role::Admin).await;
    let users = &app.services.users;

    let colleague = users
        .create(SignUpRequest::new("colleague@firm.co", "secret1", "Col", None).unwrap())
        .await
        .unwrap();
    assert_eq!(colleague.role, Role::Team);
    assert_eq!(users.list().await.unwrap().len(), 2);

    let dup = users
        .create(SignUpRequest::new("colleague@firm.co", "secret1", "Col", None).unwrap())
        .await
        .unwrap_err();
    assert_eq!(dup, AppError::Auth(AuthError::DuplicateEmail));

    let me = app.session.profile().unwrap();
    assert!(users.delete(&me).is_err());
    assert!(users.set_role(me.id, Role::Team).await.is_err());

    let promoted = users.set_role(colleague.id, Role::Admin).await.unwrap();
    assert_eq!(promoted.role, Role::Admin);
    users.delete(&colleague).unwrap().confirm().await.unwrap();
    assert_eq!(users.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn only_root_folders_are_listed() {
    let (app, _store) = signed_in(Role::Admin).await;
    let client = app.services.clients.create(client_form("Acme")).await.unwrap();
    let docs = &app.services.documents;
    let root = docs
        .create_folder(client.id, "2025", FolderType::WorkingPapers, None)
        .await
        .unwrap();
    docs.create_folder(client.id, "Q1", FolderType::WorkingPapers, Some(root.id))
        .await
        .unwrap();

    let roots = docs.root_folders(client.id).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].folder.name, "2025");
    assert_eq!(roots[0].clients.as_ref().map(|c| c.name.as_str()), Some("Acme"));
    assert!(docs.documents(root.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_counts_every_table() {
    let (app, _store) = signed_in(Role::Admin).await;
    app.services.clients.create(client_form("Acme")).await.unwrap();
    let t = app.services.tasks.create(task_form("One", None)).await.unwrap();
    app.services.tasks.create(task_form("Two", None)).await.unwrap();
    app.services
        .tasks
        .change_status(&t, TaskStatus::InProgress)
        .await
        .unwrap();

    let stats = app.services.dashboard.stats().await.unwrap();
    assert_eq!(stats.clients, 1);
    assert_eq!(stats.users, 1);
    assert_eq!(stats.tasks.total, 2);
    assert_eq!(stats.tasks.pending, 1);
    assert_eq!(stats.tasks.in_progress, 1);
    assert_eq!(stats.audits.total, 0);
    assert!(app.services.dashboard.recent_activity().await.unwrap().is_empty());
}

#[tokio::test]
async fn renaming_republishes_the_profile() {
    let (app, _store) = signed_in(Role::Team).await;
    let mut rx = app.session.subscribe();
    rx.borrow_and_update();

    app.services.profile.update_name("  New Name ").await.unwrap();
    assert!(rx.has_changed().unwrap());
    let name = app.session.profile().and_then(|p| p.full_name);
    assert_eq!(name.as_deref(), Some("New Name"));

    assert!(app.services.profile.update_name("   ").await.is_err());
}

#[tokio::test]
async fn leaving_a_view_cancels_its_loads() {
    let (app, _store) = signed_in(Role::Team).await;
    let mut scope: ViewScope<()> = ViewScope::new("tasks");
    let tasks = app.services.tasks.clone();
    let handle = scope.spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        let _ = tasks.list(None).await;
    });
    assert_eq!(scope.in_flight(), 1);
    drop(scope);
    for _ in 0..100 {
        if handle.is_finished() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(handle.is_finished());
}

#[tokio::test]
async fn team_members_can_pick_assignees() {
    let (app, _store) = signed_in(Role::Team).await;
    let options = app.services.tasks.assignee_options().await.unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].full_name.as_deref(), Some("Me"));

    let me = app.session.current().session().unwrap().user_id();
    let mut form = task_form("Assigned", None);
    form.assigned_to = options.iter().map(|p| p.id).collect();
    let task = app.services.tasks.create(form).await.unwrap();
    assert_eq!(task.assigned_to, Some(vec![me]));

    app.session.sign_out().await;
    assert!(app.services.tasks.assignee_options().await.is_err());
}
