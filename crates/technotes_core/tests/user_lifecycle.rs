use rusqlite::Connection;
use technotes_core::db::open_db_in_memory;
use technotes_core::{
    ConflictReason, CreateNoteRequest, CreateUserRequest, CredentialHasher, DeleteUserRequest,
    ErrorKind, InputError, LifecycleError, MissingEntity, NoteService, Role, SqliteNoteRepository,
    SqliteUserRepository, UpdateUserRequest, UserRepository, UserService,
};
use uuid::Uuid;

type Users<'c> = UserService<SqliteUserRepository<'c>, SqliteNoteRepository<'c>>;

fn hasher() -> CredentialHasher {
    CredentialHasher::new(4).unwrap()
}

fn user_service(conn: &Connection) -> Users<'_> {
    UserService::new(
        SqliteUserRepository::try_new(conn).unwrap(),
        SqliteNoteRepository::try_new(conn).unwrap(),
        hasher(),
    )
}

fn new_user(username: &str, password: &str, roles: Option<&[&str]>) -> CreateUserRequest {
    CreateUserRequest {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        roles: roles.map(|tags| tags.iter().map(|tag| tag.to_string()).collect()),
    }
}

fn update(id: Uuid, username: &str, roles: &[&str], active: bool) -> UpdateUserRequest {
    UpdateUserRequest {
        id: Some(id.to_string()),
        username: Some(username.to_string()),
        roles: Some(roles.iter().map(|tag| tag.to_string()).collect()),
        active: Some(active),
        password: None,
    }
}

#[test]
fn create_requires_username_and_password() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);

    let err = service
        .create_user(&CreateUserRequest {
            username: None,
            password: Some("pw".to_string()),
            roles: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::Missing("username"))
    ));

    let err = service.create_user(&new_user("alice", "", None)).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::Missing("password"))
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn create_stores_hash_that_verifies_and_supplied_roles() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);

    let created = service
        .create_user(&new_user("  Bob ", "s3cret", Some(&["Manager", "admin", "Manager"])))
        .unwrap();
    assert_eq!(created.username, "Bob");

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let stored = repo.get_user(created.id).unwrap().unwrap();
    assert_ne!(stored.password_hash, "s3cret");
    assert!(hasher().verify("s3cret", &stored.password_hash).unwrap());
    assert_eq!(stored.roles, vec![Role::Manager, Role::Admin]);
    assert!(stored.active);
}

#[test]
fn create_with_empty_roles_assigns_default() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);

    let created = service.create_user(&new_user("carol", "pw", Some(&[]))).unwrap();
    let profile = service.get_user(created.id).unwrap().unwrap();
    assert_eq!(profile.roles, vec![Role::Employee]);
}

#[test]
fn create_rejects_unknown_role() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);

    let err = service
        .create_user(&new_user("dave", "pw", Some(&["Employee", "Janitor"])))
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::UnknownRole(ref role)) if role == "Janitor"
    ));
    assert!(matches!(
        service.list_users().unwrap_err(),
        LifecycleError::Empty(_)
    ));
}

#[test]
fn list_users_is_sorted_and_never_exposes_hashes() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    service.create_user(&new_user("zed", "pw", None)).unwrap();
    service.create_user(&new_user("Amy", "pw", None)).unwrap();

    let users = service.list_users().unwrap();
    let names: Vec<_> = users.iter().map(|user| user.username.as_str()).collect();
    assert_eq!(names, vec!["Amy", "zed"]);

    let json = serde_json::to_string(&users).unwrap();
    assert!(!json.contains("password"));
    assert!(!json.contains("$2"));
}

#[test]
fn serialized_user_record_omits_password_hash() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let created = service.create_user(&new_user("erin", "pw", None)).unwrap();

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let stored = repo.get_user(created.id).unwrap().unwrap();
    let json = serde_json::to_value(&stored).unwrap();
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["username"], "erin");
    assert_eq!(json["roles"][0], "Employee");
}

#[test]
fn update_overwrites_fields_and_keeps_hash_without_password() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let created = service.create_user(&new_user("frank", "pw1", None)).unwrap();
    let before = repo.get_user(created.id).unwrap().unwrap();

    service
        .update_user(&update(created.id, "Franklin", &["Manager"], false))
        .unwrap();

    let after = repo.get_user(created.id).unwrap().unwrap();
    assert_eq!(after.username, "Franklin");
    assert_eq!(after.roles, vec![Role::Manager]);
    assert!(!after.active);
    assert_eq!(after.password_hash, before.password_hash);
    assert!(after.updated_at >= before.updated_at);
}

#[test]
fn update_with_password_rotates_hash() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let created = service.create_user(&new_user("gina", "old", None)).unwrap();

    let mut request = update(created.id, "gina", &["Employee"], true);
    request.password = Some("new".to_string());
    service.update_user(&request).unwrap();

    let stored = repo.get_user(created.id).unwrap().unwrap();
    assert!(hasher().verify("new", &stored.password_hash).unwrap());
    assert!(!hasher().verify("old", &stored.password_hash).unwrap());
}

#[test]
fn update_allows_case_only_rename_of_self() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let created = service.create_user(&new_user("hank", "pw", None)).unwrap();

    service
        .update_user(&update(created.id, "HANK", &["Employee"], true))
        .unwrap();
    let profile = service.get_user(created.id).unwrap().unwrap();
    assert_eq!(profile.username, "HANK");
}

#[test]
fn update_conflicts_with_another_users_name() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    service.create_user(&new_user("ivy", "pw", None)).unwrap();
    let jack = service.create_user(&new_user("jack", "pw", None)).unwrap();

    let err = service
        .update_user(&update(jack.id, "IVY", &["Employee"], true))
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Conflict(ConflictReason::DuplicateUsername(_))
    ));
    assert_eq!(
        service.get_user(jack.id).unwrap().unwrap().username,
        "jack"
    );
}

#[test]
fn update_validates_required_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let id = Uuid::new_v4();

    let err = service.update_user(&update(id, "kim", &[], true)).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::Missing("roles"))
    ));

    let mut request = update(id, "kim", &["Employee"], true);
    request.active = None;
    let err = service.update_user(&request).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::Missing("active"))
    ));

    let mut request = update(id, "kim", &["Employee"], true);
    request.id = Some("not-a-uuid".to_string());
    let err = service.update_user(&request).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::MalformedId { field: "id", .. })
    ));
}

#[test]
fn update_missing_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let id = Uuid::new_v4();

    let err = service
        .update_user(&update(id, "lou", &["Employee"], true))
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::NotFound(MissingEntity::User(missing)) if missing == id
    ));
}

#[test]
fn delete_validates_id_and_existence() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);

    let err = service
        .delete_user(&DeleteUserRequest { id: None })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = service
        .delete_user(&DeleteUserRequest {
            id: Some(Uuid::new_v4().to_string()),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_succeeds_iff_no_note_references_user() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap(), service.clone());
    let owner = service.create_user(&new_user("mia", "pw", None)).unwrap();
    let bystander = service.create_user(&new_user("ned", "pw", None)).unwrap();
    notes
        .create_note(&CreateNoteRequest {
            user: Some(owner.id.to_string()),
            title: Some("Inventory".to_string()),
            text: Some("count boxes".to_string()),
        })
        .unwrap();

    let err = service
        .delete_user(&DeleteUserRequest {
            id: Some(owner.id.to_string()),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let deleted = service
        .delete_user(&DeleteUserRequest {
            id: Some(bystander.id.to_string()),
        })
        .unwrap();
    assert_eq!(deleted.username, "ned");
}

#[test]
fn requests_decode_from_partial_json_with_id_alias() {
    let conn = open_db_in_memory().unwrap();
    let service = user_service(&conn);
    let created = service.create_user(&new_user("olga", "pw", None)).unwrap();

    let request: DeleteUserRequest =
        serde_json::from_value(serde_json::json!({ "_id": created.id.to_string() })).unwrap();
    assert_eq!(request.id, Some(created.id.to_string()));

    let request: CreateUserRequest =
        serde_json::from_value(serde_json::json!({ "username": "pat" })).unwrap();
    let err = service.create_user(&request).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidInput(InputError::Missing("password"))
    ));
}
