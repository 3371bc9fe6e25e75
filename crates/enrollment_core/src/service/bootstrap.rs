//! Idempotent process setup.
//!
//! Seeds the administrator identity when it is missing. Invoked once by
//! the process entry point; the engine itself never calls it.
//!
//! The configured username identifies the administrator. Changing the
//! configured email after the first run does not create a second admin.

use crate::auth::credential::CredentialHasher;
use crate::config::AdminBootstrapConfig;
use crate::model::user::{Role, User};
use crate::repo::EntityStore;
use crate::service::error::{EnrollmentError, ServiceResult};
use crate::service::identity_service::{IdentityService, RegistrationRequest};
use log::{info, warn};

/// Result of `ensure_admin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(User),
    AlreadyPresent,
}

/// Registers the configured admin unless an ADMIN with its username exists.
///
/// # Errors
/// - `ValidationFailed` when the username belongs to a non-admin user, or
///   the email is held by another user.
pub fn ensure_admin<S: EntityStore, H: CredentialHasher>(
    identity: &IdentityService<S, H>,
    admin: &AdminBootstrapConfig,
) -> ServiceResult<BootstrapOutcome> {
    if admin_present(identity, admin)? {
        return Ok(BootstrapOutcome::AlreadyPresent);
    }
    ensure_username_free(identity, admin)?;

    let request = RegistrationRequest {
        name: admin.name.clone(),
        email: admin.email.clone(),
        username: admin.username.clone(),
        password: admin.password.clone(),
        role: Role::Admin,
    };

    match identity.register_identity(&request) {
        Ok(user) => {
            info!(
                "event=admin_bootstrap module=bootstrap status=ok outcome=created user_id={}",
                user.id
            );
            Ok(BootstrapOutcome::Created(user))
        }
        // Another process seeded the same admin between the probe and the
        // insert.
        Err(EnrollmentError::ValidationFailed(_)) if admin_present(identity, admin)? => {
            Ok(BootstrapOutcome::AlreadyPresent)
        }
        Err(err) => Err(err),
    }
}

fn admin_present<S: EntityStore, H: CredentialHasher>(
    identity: &IdentityService<S, H>,
    admin: &AdminBootstrapConfig,
) -> ServiceResult<bool> {
    let present = identity
        .find_user_with_role(&admin.username, Role::Admin)?
        .is_some();
    if present {
        info!("event=admin_bootstrap module=bootstrap status=ok outcome=already_present");
    }
    Ok(present)
}

fn ensure_username_free<S: EntityStore, H: CredentialHasher>(
    identity: &IdentityService<S, H>,
    admin: &AdminBootstrapConfig,
) -> ServiceResult<()> {
    match identity.get_user_by_username(&admin.username) {
        Ok(holder) => {
            warn!(
                "event=admin_bootstrap module=bootstrap status=error error_code=username_conflict holder_role={}",
                holder.role
            );
            Err(EnrollmentError::ValidationFailed(format!(
                "admin username `{}` belongs to a {} user",
                admin.username, holder.role
            )))
        }
        Err(EnrollmentError::UserNotFound(_)) => Ok(()),
        Err(err) => Err(err),
    }
}
