//! Identity registration and authentication.
//!
//! # Responsibility
//! - Register a User together with its role-specific profile.
//! - Authenticate (username, password, role) triples.
//!
//! # Invariants
//! - Registration is all-or-nothing: a rejected or failed registration
//!   leaves neither a User nor an orphaned Student/Teacher profile.
//! - Authentication failures are indistinguishable to the caller.
//! - Raw passwords and hashes are never logged.

use crate::auth::credential::CredentialHasher;
use crate::auth::gate::Caller;
use crate::model::profile::ProfileInput;
use crate::model::user::{normalize_email, NewUser, Role, User};
use crate::repo::EntityStore;
use crate::service::error::{EnrollmentError, ServiceResult};
use log::{info, warn};
use once_cell::sync::OnceCell;

/// Verified against when the username is unknown, so a miss costs the same
/// hashing work as a hit.
const MISSING_USER_PASSWORD: &str = "missing-user-placeholder";

/// Input for `register_identity`.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Identity service facade.
pub struct IdentityService<S: EntityStore, H: CredentialHasher> {
    store: S,
    hasher: H,
    missing_user_hash: OnceCell<String>,
}

impl<S: EntityStore, H: CredentialHasher> IdentityService<S, H> {
    pub fn new(store: S, hasher: H) -> Self {
        Self {
            store,
            hasher,
            missing_user_hash: OnceCell::new(),
        }
    }

    /// Registers a user and, for TEACHER/STUDENT, its matching profile.
    pub fn register_identity(&self, request: &RegistrationRequest) -> ServiceResult<User> {
        let email = normalize_email(&request.email);
        let credential_hash = self.hasher.hash(&request.password)?;

        let result = self.store.atomic(|store| -> ServiceResult<User> {
            if store.exists_by_email(&email)? {
                return Err(EnrollmentError::validation("email is already in use"));
            }
            if store.exists_by_username(&request.username)? {
                return Err(EnrollmentError::validation("username is already taken"));
            }

            let profile = ProfileInput {
                name: request.name.clone(),
                email: Some(email.clone()),
            };
            let role_specific_id = match request.role {
                Role::Student => Some(store.create_student(&profile)?.id),
                Role::Teacher => Some(store.create_teacher(&profile)?.id),
                Role::Admin => None,
            };

            let user = store.create_user(&NewUser {
                username: request.username.clone(),
                email: email.clone(),
                name: request.name.clone(),
                credential_hash,
                role: request.role,
                role_specific_id,
            })?;
            Ok(user)
        });

        match &result {
            Ok(user) => info!(
                "event=identity_register module=identity status=ok user_id={} role={} role_specific_id={:?}",
                user.id, user.role, user.role_specific_id
            ),
            Err(err) => warn!(
                "event=identity_register module=identity status=error role={} error_code={}",
                request.role,
                err.code()
            ),
        }
        result
    }

    /// Verifies credentials for a user of the expected role.
    ///
    /// Unknown username, role mismatch and wrong password all yield
    /// `Unauthenticated`.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        expected_role: Role,
    ) -> ServiceResult<User> {
        let Some(user) = self
            .store
            .find_user_by_username_and_role(username, expected_role)?
        else {
            self.verify_missing_user(password);
            warn!(
                "event=identity_login module=identity status=error role={expected_role} error_code=unauthenticated"
            );
            return Err(EnrollmentError::Unauthenticated);
        };

        match self.hasher.verify(password, &user.credential_hash) {
            Ok(true) => {
                info!(
                    "event=identity_login module=identity status=ok user_id={} role={}",
                    user.id, user.role
                );
                Ok(user)
            }
            Ok(false) => {
                warn!(
                    "event=identity_login module=identity status=error role={expected_role} error_code=unauthenticated"
                );
                Err(EnrollmentError::Unauthenticated)
            }
            Err(err) => {
                warn!(
                    "event=identity_login module=identity status=error user_id={} error_code=credential_unusable error={err}",
                    user.id
                );
                Err(EnrollmentError::Unauthenticated)
            }
        }
    }

    fn verify_missing_user(&self, password: &str) {
        let hash = self
            .missing_user_hash
            .get_or_try_init(|| self.hasher.hash(MISSING_USER_PASSWORD));
        if let Ok(hash) = hash {
            let _ = self.hasher.verify(password, hash);
        }
    }

    pub fn get_user_by_username(&self, username: &str) -> ServiceResult<User> {
        self.store
            .find_user_by_username(username)?
            .ok_or_else(|| EnrollmentError::UserNotFound(username.to_string()))
    }

    /// Looks up a user by username, restricted to `role`.
    pub fn find_user_with_role(&self, username: &str, role: Role) -> ServiceResult<Option<User>> {
        Ok(self.store.find_user_by_username_and_role(username, role)?)
    }

    /// Whether any user already holds the email (case-insensitive).
    pub fn email_in_use(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.store.exists_by_email(email)?)
    }

    /// Role-scoped caller identity for an authenticated user.
    ///
    /// A TEACHER/STUDENT whose profile was deleted has no caller identity.
    pub fn caller_for(&self, user: &User) -> ServiceResult<Caller> {
        Caller::from_user(user).ok_or(EnrollmentError::Unauthenticated)
    }
}
