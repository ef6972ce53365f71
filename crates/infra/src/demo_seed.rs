//! Fixed demo dataset and the idempotent seeding routine behind the
//! demo-seed function.
//!
//! Every row carries a hard-coded id and is upserted on `id`, so running the
//! seed any number of times leaves exactly one row per id.

use auditdesk_auth::{AuthError, Credentials, Role};
use auditdesk_core::{
    AuditId, ChecklistId, ChecklistItemId, ClientId, FolderId, FormTemplateId, Table, TaskId, UserId,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use thiserror::Error;

use crate::functions::DemoUser;
use crate::identity::IdentityProvider;
use crate::store::{DataAccessError, DataStore, Row, to_row};

pub const DEMO_EMAIL: &str = "yunus@demo.com";
pub const DEMO_PASSWORD: &str = "123";
pub const DEMO_FULL_NAME: &str = "Yunus";

/// Owner recorded on seeded rows when the demo identity cannot be resolved.
pub const FALLBACK_USER_ID: UserId = UserId::from_u128(0x00000000_0000_0000_0000_000000000001);

pub const DEMO_CLIENT_IDS: [ClientId; 2] = [
    ClientId::from_u128(0x10000000_0000_0000_0000_000000000001),
    ClientId::from_u128(0x10000000_0000_0000_0000_000000000002),
];
pub const DEMO_TEMPLATE_IDS: [FormTemplateId; 3] = [
    FormTemplateId::from_u128(0x20000000_0000_0000_0000_000000000001),
    FormTemplateId::from_u128(0x20000000_0000_0000_0000_000000000002),
    FormTemplateId::from_u128(0x20000000_0000_0000_0000_000000000003),
];
pub const DEMO_TASK_ID: TaskId = TaskId::from_u128(0x30000000_0000_0000_0000_000000000001);
pub const DEMO_AUDIT_ID: AuditId = AuditId::from_u128(0x40000000_0000_0000_0000_000000000001);
pub const DEMO_CHECKLIST_ID: ChecklistId = ChecklistId::from_u128(0x50000000_0000_0000_0000_000000000001);
pub const DEMO_CHECKLIST_ITEM_IDS: [ChecklistItemId; 4] = [
    ChecklistItemId::from_u128(0x51000000_0000_0000_0000_000000000001),
    ChecklistItemId::from_u128(0x51000000_0000_0000_0000_000000000002),
    ChecklistItemId::from_u128(0x51000000_0000_0000_0000_000000000003),
    ChecklistItemId::from_u128(0x51000000_0000_0000_0000_000000000004),
];
pub const DEMO_FOLDER_IDS: [FolderId; 4] = [
    FolderId::from_u128(0x60000000_0000_0000_0000_000000000001),
    FolderId::from_u128(0x60000000_0000_0000_0000_000000000002),
    FolderId::from_u128(0x60000000_0000_0000_0000_000000000003),
    FolderId::from_u128(0x60000000_0000_0000_0000_000000000004),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Data(#[from] DataAccessError),
}

/// Rows of the demo dataset, grouped per table in foreign-key order.
pub fn demo_dataset(owner: UserId, now: DateTime<Utc>) -> Result<Vec<(Table, Vec<Row>)>, DataAccessError> {
    let client = DEMO_CLIENT_IDS[0];
    let template = DEMO_TEMPLATE_IDS[0];
    let checklist = DEMO_CHECKLIST_ID;

    let groups: Vec<(Table, Vec<Value>)> = vec![
        (
            Table::Clients,
            vec![
                json!({
                    "id": client,
                    "name": "ABC Şirketi",
                    "contact_person": "Ahmet Yılmaz",
                    "email": "ahmet@abc.com",
                    "phone": "+90 212 555 0001",
                    "address": "İstanbul, Türkiye",
                    "created_by": owner,
                }),
                json!({
                    "id": DEMO_CLIENT_IDS[1],
                    "name": "XYZ Işletmesi",
                    "contact_person": "Fatima Kaya",
                    "email": "fatima@xyz.com",
                    "phone": "+90 216 555 0002",
                    "address": "Ankara, Türkiye",
                    "created_by": owner,
                }),
            ],
        ),
        (
            Table::FormTemplates,
            vec![
                json!({
                    "id": template,
                    "name": "Mali Denetim Şablonu",
                    "template_type": "financial_audit",
                    "content": {
                        "sections": [
                            {"title": "Genel Bilgiler", "fields": ["company_name", "audit_date", "auditor_name"]}
                        ]
                    },
                    "created_by": owner,
                }),
                json!({
                    "id": DEMO_TEMPLATE_IDS[1],
                    "name": "Uyum Denetimi Şablonu",
                    "template_type": "compliance_audit",
                    "content": {"sections": []},
                    "created_by": owner,
                }),
                json!({
                    "id": DEMO_TEMPLATE_IDS[2],
                    "name": "Bilgi Sistemleri Şablonu",
                    "template_type": "information_systems_audit",
                    "content": {
                        "sections": [
                            {"title": "Sistem Yönetimi", "fields": ["system_inventory", "access_controls", "backup_procedures"]},
                            {"title": "Güvenlik", "fields": ["security_policies", "vulnerability_assessment", "incident_response"]}
                        ]
                    },
                    "created_by": owner,
                }),
            ],
        ),
        (
            Table::Tasks,
            vec![json!({
                "id": DEMO_TASK_ID,
                "title": "2024 Mali Denetimi",
                "description": "ABC Şirketi için yıllık mali denetim",
                "client_id": client,
                "status": "in_progress",
                "assigned_to": [owner],
                "created_by": owner,
                "due_date": (now + Duration::days(30)).to_rfc3339(),
            })],
        ),
        (
            Table::Audits,
            vec![json!({
                "id": DEMO_AUDIT_ID,
                "client_id": client,
                "task_id": DEMO_TASK_ID,
                "form_template_id": template,
                "status": "in_progress",
                "form_data": {},
                "created_by": owner,
            })],
        ),
        (
            Table::Checklists,
            vec![json!({
                "id": checklist,
                "client_id": client,
                "title": "ABC Şirketi Denetim Kontrol Listesi",
                "created_by": owner,
            })],
        ),
        (
            Table::ChecklistItems,
            [
                "Mali tablolar gözden geçirildi",
                "Kaynaklar doğrulandı",
                "İç kontroller değerlendirildi",
                "Rapor hazırlandı",
            ]
            .iter()
            .enumerate()
            .map(|(i, description)| {
                json!({
                    "id": DEMO_CHECKLIST_ITEM_IDS[i],
                    "checklist_id": checklist,
                    "description": description,
                    "is_checked": i < 2,
                    "order_index": i + 1,
                })
            })
            .collect(),
        ),
        (
            Table::Folders,
            [
                ("Toplantı Notları 2024", "meeting_notes"),
                ("Çalışma Kağıtları", "working_papers"),
                ("Sözleşmeler", "contracts"),
                ("Şirketten Gelen Kanıtlar", "evidence"),
            ]
            .iter()
            .enumerate()
            .map(|(i, (name, folder_type))| {
                json!({
                    "id": DEMO_FOLDER_IDS[i],
                    "client_id": client,
                    "name": name,
                    "folder_type": folder_type,
                    "created_by": owner,
                })
            })
            .collect(),
        ),
    ];

    groups
        .into_iter()
        .map(|(table, values)| {
            let rows = values.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
            Ok((table, rows))
        })
        .collect()
}

/// Create (or find) the demo admin identity. Provider failures are logged
/// and yield `None`; seeding continues with [`FALLBACK_USER_ID`].
async fn ensure_demo_identity(identity: &dyn IdentityProvider) -> Option<UserId> {
    let credentials = Credentials::new(DEMO_EMAIL, DEMO_PASSWORD);
    match identity.admin_create_user(&credentials).await {
        Ok(created) => Some(created.id),
        Err(AuthError::DuplicateEmail) => match identity.admin_find_user(DEMO_EMAIL).await {
            Ok(found) => found.map(|i| i.id),
            Err(e) => {
                tracing::warn!(error = %e, "demo identity exists but could not be looked up");
                None
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "demo identity creation failed");
            None
        }
    }
}

/// Seed the demo account, its admin profile, and the fixed dataset.
/// A failed profile write is logged and does not stop the dataset.
pub async fn seed_demo_data(
    store: &dyn DataStore,
    identity: &dyn IdentityProvider,
    now: DateTime<Utc>,
) -> Result<DemoUser, SeedError> {
    let user_id = ensure_demo_identity(identity).await;

    if let Some(id) = user_id {
        let profile = to_row(&json!({
            "id": id,
            "email": DEMO_EMAIL,
            "full_name": DEMO_FULL_NAME,
            "role": Role::Admin,
        }))?;
        if let Err(e) = store.upsert(Table::Profiles, vec![profile], "id").await {
            tracing::warn!(error = %e, identity = %id, "demo profile not written; seeding the dataset anyway");
        }
    }

    let owner = user_id.unwrap_or(FALLBACK_USER_ID);
    for (table, rows) in demo_dataset(owner, now)? {
        let n = rows.len();
        store.upsert(table, rows, "id").await?;
        tracing::debug!(%table, rows = n, "demo rows upserted");
    }

    tracing::info!(owner = %owner, "demo dataset seeded");
    Ok(DemoUser {
        email: DEMO_EMAIL.to_string(),
        password: DEMO_PASSWORD.to_string(),
    })
}
