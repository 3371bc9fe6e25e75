use enrollment_core::config::AdminBootstrapConfig;
use enrollment_core::db::open_db_in_memory;
use enrollment_core::{
    ensure_admin, Argon2CredentialHasher, BootstrapOutcome, Caller, CredentialConfig,
    EnrollmentError, EnrollmentService, IdentityService, RegistrationRequest, Role, SqliteStore,
    UserRepository,
};
use rusqlite::Connection;

type Identity<'conn> = IdentityService<SqliteStore<'conn>, Argon2CredentialHasher>;

fn identity(conn: &Connection) -> Identity<'_> {
    IdentityService::new(
        SqliteStore::try_new(conn).unwrap(),
        Argon2CredentialHasher::new(&CredentialConfig::testing()).unwrap(),
    )
}

fn request(username: &str, email: &str, role: Role) -> RegistrationRequest {
    RegistrationRequest {
        name: format!("{username} name"),
        email: email.to_string(),
        username: username.to_string(),
        password: "correct horse".to_string(),
        role,
    }
}

#[test]
fn registering_student_creates_linked_profile() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);

    let user = identity
        .register_identity(&request("ada", "Ada@School.test", Role::Student))
        .unwrap();

    assert_eq!(user.role, Role::Student);
    assert_eq!(user.email, "ada@school.test");
    assert_ne!(user.credential_hash, "correct horse");
    let student_id = user.role_specific_id.expect("student link");

    let enrollment = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    let student = enrollment.get_student(student_id).unwrap().student;
    assert_eq!(student.name, "ada name");
    assert_eq!(student.email.as_deref(), Some("ada@school.test"));
    assert_eq!(
        identity.caller_for(&user).unwrap(),
        Caller::student(student_id)
    );
}

#[test]
fn registering_teacher_and_admin() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);

    let teacher = identity
        .register_identity(&request("ken", "ken@school.test", Role::Teacher))
        .unwrap();
    let admin = identity
        .register_identity(&request("root", "root@school.test", Role::Admin))
        .unwrap();

    let teacher_id = teacher.role_specific_id.expect("teacher link");
    let enrollment = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    assert!(enrollment.get_teacher(teacher_id).is_ok());
    assert!(enrollment.list_students().unwrap().is_empty());

    assert_eq!(admin.role_specific_id, None);
    assert_eq!(identity.caller_for(&admin).unwrap(), Caller::admin(admin.id));
}

#[test]
fn duplicate_email_is_rejected_without_orphan_profile() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    identity
        .register_identity(&request("first", "shared@school.test", Role::Student))
        .unwrap();

    let err = identity
        .register_identity(&request("second", "SHARED@school.test", Role::Student))
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::ValidationFailed(_)));

    let store = SqliteStore::try_new(&conn).unwrap();
    assert_eq!(store.list_users().unwrap().len(), 1);
    let enrollment = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    assert_eq!(enrollment.list_students().unwrap().len(), 1);
}

#[test]
fn duplicate_username_is_rejected_without_orphan_profile() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    identity
        .register_identity(&request("taken", "one@school.test", Role::Teacher))
        .unwrap();

    let err = identity
        .register_identity(&request("taken", "two@school.test", Role::Teacher))
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::ValidationFailed(_)));

    let enrollment = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    assert_eq!(enrollment.list_teachers().unwrap().len(), 1);
    assert!(identity.email_in_use("one@school.test").unwrap());
    assert!(!identity.email_in_use("two@school.test").unwrap());
}

#[test]
fn authenticate_accepts_matching_triple() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    let registered = identity
        .register_identity(&request("grace", "grace@school.test", Role::Teacher))
        .unwrap();

    let user = identity
        .authenticate("grace", "correct horse", Role::Teacher)
        .unwrap();
    assert_eq!(user.id, registered.id);
}

#[test]
fn authenticate_failures_are_indistinguishable() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    identity
        .register_identity(&request("linus", "linus@school.test", Role::Student))
        .unwrap();

    let attempts = [
        identity.authenticate("linus", "wrong password", Role::Student),
        identity.authenticate("linus", "correct horse", Role::Teacher),
        identity.authenticate("nobody", "correct horse", Role::Student),
    ];
    for attempt in attempts {
        let err = attempt.unwrap_err();
        assert!(matches!(err, EnrollmentError::Unauthenticated));
        assert_eq!(err.to_string(), "invalid username, password, or role");
    }
}

#[test]
fn unknown_username_lookup_is_user_not_found() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);

    assert!(matches!(
        identity.get_user_by_username("ghost"),
        Err(EnrollmentError::UserNotFound(name)) if name == "ghost"
    ));
}

#[test]
fn user_json_never_contains_credential_hash() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    let user = identity
        .register_identity(&request("hidden", "hidden@school.test", Role::Student))
        .unwrap();

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("credentialHash").is_none());
    assert_eq!(json["role"], "STUDENT");
    assert_eq!(json["username"], "hidden");
}

#[test]
fn admin_bootstrap_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    let config = AdminBootstrapConfig::default();

    let first = ensure_admin(&identity, &config).unwrap();
    let BootstrapOutcome::Created(admin) = first else {
        panic!("first bootstrap must create the admin");
    };
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.username, "admin");

    assert_eq!(
        ensure_admin(&identity, &config).unwrap(),
        BootstrapOutcome::AlreadyPresent
    );
    let store = SqliteStore::try_new(&conn).unwrap();
    assert_eq!(store.list_users().unwrap().len(), 1);
    assert!(identity
        .authenticate("admin", &config.password, Role::Admin)
        .is_ok());
}

#[test]
fn admin_bootstrap_survives_email_change() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    let first_run = AdminBootstrapConfig::default();
    ensure_admin(&identity, &first_run).unwrap();

    let changed = AdminBootstrapConfig {
        email: "ops@school.test".to_string(),
        ..AdminBootstrapConfig::default()
    };
    assert_eq!(
        ensure_admin(&identity, &changed).unwrap(),
        BootstrapOutcome::AlreadyPresent
    );
    assert_eq!(
        ensure_admin(&identity, &changed).unwrap(),
        BootstrapOutcome::AlreadyPresent
    );
    let store = SqliteStore::try_new(&conn).unwrap();
    assert_eq!(store.list_users().unwrap().len(), 1);
}

#[test]
fn admin_bootstrap_rejects_username_held_by_non_admin() {
    let conn = open_db_in_memory().unwrap();
    let identity = identity(&conn);
    identity
        .register_identity(&request("admin", "m@x.test", Role::Student))
        .unwrap();

    let err = ensure_admin(&identity, &AdminBootstrapConfig::default()).unwrap_err();
    match err {
        EnrollmentError::ValidationFailed(message) => {
            assert!(message.contains("admin"));
            assert!(message.contains("STUDENT"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(identity
        .find_user_with_role("admin", Role::Admin)
        .unwrap()
        .is_none());
}

#[test]
fn failed_user_insert_rolls_back_new_profile() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_user_insert BEFORE INSERT ON users
         BEGIN
             SELECT RAISE(ABORT, 'users are read-only');
         END;",
    )
    .unwrap();
    let identity = identity(&conn);

    for (username, role) in [("pat", Role::Student), ("sam", Role::Teacher)] {
        let err = identity
            .register_identity(&request(username, &format!("{username}@school.test"), role))
            .unwrap_err();
        assert!(matches!(err, EnrollmentError::Repo(_)), "unexpected error: {err}");
    }

    let enrollment = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    assert!(enrollment.list_students().unwrap().is_empty());
    assert!(enrollment.list_teachers().unwrap().is_empty());
    let store = SqliteStore::try_new(&conn).unwrap();
    assert!(store.list_users().unwrap().is_empty());
}
