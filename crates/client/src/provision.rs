//! Identity + profile provisioning.
//!
//! The identity provider and the profile table are two separate systems with
//! no shared transaction. A failed profile insert is compensated by deleting
//! the new identity; when that fails too the draft goes to the outbox.

use auditdesk_auth::{NewProfile, Profile};
use auditdesk_infra::{IdentityProvider, Repository};

use crate::error::{AppError, AppResult};
use crate::outbox::ProfileOutbox;

pub(crate) async fn insert_profile_or_compensate(
    identity: &dyn IdentityProvider,
    profiles: &Repository<Profile>,
    outbox: &ProfileOutbox,
    draft: NewProfile,
) -> AppResult<Profile> {
    let insert_err = match profiles.insert(&draft).await {
        Ok(profile) => return Ok(profile),
        Err(e) => e,
    };
    tracing::warn!(identity = %draft.id, error = %insert_err, "profile insert failed; removing identity");

    match identity.admin_delete_user(draft.id).await {
        Ok(()) => {
            tracing::info!(identity = %draft.id, "identity rolled back");
            Err(AppError::DataAccess(insert_err))
        }
        Err(rollback_err) => {
            tracing::error!(
                identity = %draft.id,
                error = %rollback_err,
                "identity rollback failed; profile draft queued"
            );
            let identity_id = draft.id;
            outbox.record(draft, insert_err.to_string());
            Err(AppError::ConsistencyGap { identity_id })
        }
    }
}

/// Deliver one queued draft. Returns `true` once the profile row exists.
pub(crate) async fn deliver(profiles: &Repository<Profile>, outbox: &ProfileOutbox, draft: NewProfile) -> bool {
    let id = draft.id;
    let exists = matches!(profiles.get(id).await, Ok(Some(_)));
    let result = if exists {
        Ok(())
    } else {
        profiles.insert(&draft).await.map(|_| ())
    };
    match result {
        Ok(()) => {
            outbox.mark_delivered(id);
            tracing::info!(identity = %id, "pending profile delivered");
            true
        }
        Err(e) => {
            tracing::warn!(identity = %id, error = %e, "pending profile still undeliverable");
            outbox.mark_failed(id, e.to_string());
            false
        }
    }
}
