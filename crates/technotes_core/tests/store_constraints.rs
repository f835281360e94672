//! Store-level backstops for the check-then-write races.

use technotes_core::db::open_db_in_memory;
use technotes_core::{
    ConflictReason, CreateUserRequest, CredentialHasher, DeleteUserRequest, LifecycleError, Note,
    NoteId, NoteMatch, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
    SqliteUserRepository, User, UserId, UserMatch, UserProfile, UserRepository, UserService,
};

fn stored_user(username: &str) -> User {
    User::new(
        username,
        "$2b$04$placeholderplaceholderplaceholderplaceholder".to_string(),
        Vec::new(),
    )
}

#[test]
fn unique_index_rejects_folded_duplicate_username() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.insert_user(&stored_user("Renée")).unwrap();

    let err = repo.insert_user(&stored_user("RENEE")).unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(_)));
}

#[test]
fn username_lookup_is_folded_and_returns_identity_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = stored_user("Zoë");
    repo.insert_user(&user).unwrap();

    assert_eq!(
        repo.find_user_by_username("zoe").unwrap(),
        Some(UserMatch { id: user.id })
    );
    assert_eq!(repo.find_user_by_username("zoey").unwrap(), None);
}

#[test]
fn unique_index_rejects_folded_duplicate_title_per_owner_only() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let alice = stored_user("alice");
    let bob = stored_user("bob");
    users.insert_user(&alice).unwrap();
    users.insert_user(&bob).unwrap();

    notes.insert_note(&Note::new(alice.id, "Plan", "a")).unwrap();
    notes.insert_note(&Note::new(bob.id, "plan", "b")).unwrap();
    let err = notes
        .insert_note(&Note::new(alice.id, "PLAN", "c"))
        .unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(_)));
}

#[test]
fn foreign_key_rejects_orphan_note_and_owner_delete() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let alice = stored_user("alice");
    users.insert_user(&alice).unwrap();

    let orphan = Note::new(uuid::Uuid::new_v4(), "Orphan", "x");
    assert!(matches!(
        notes.insert_note(&orphan).unwrap_err(),
        RepoError::ForeignKeyViolation(_)
    ));

    let note = Note::new(alice.id, "Owned", "x");
    notes.insert_note(&note).unwrap();
    assert_eq!(notes.find_notes_by_user(alice.id).unwrap().len(), 1);
    assert!(matches!(
        users.delete_user(alice.id).unwrap_err(),
        RepoError::ForeignKeyViolation(_)
    ));
}

#[test]
fn stale_writes_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let ghost = stored_user("ghost");

    assert!(matches!(
        users.save_user(&ghost).unwrap_err(),
        RepoError::NotFound(id) if id == ghost.id
    ));
    let note = Note::new(ghost.id, "Ghost", "x");
    assert!(matches!(
        notes.save_note(&note).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        notes.delete_note(note.id).unwrap_err(),
        RepoError::NotFound(_)
    ));
}

/// Users store whose username lookup always misses, as if a concurrent
/// writer inserted between the check and the write.
struct RacingLookup<'c>(SqliteUserRepository<'c>);

impl UserRepository for RacingLookup<'_> {
    fn list_users(&self) -> RepoResult<Vec<UserProfile>> {
        self.0.list_users()
    }
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.0.get_user(id)
    }
    fn find_user_by_username(&self, _username: &str) -> RepoResult<Option<UserMatch>> {
        Ok(None)
    }
    fn insert_user(&self, user: &User) -> RepoResult<UserId> {
        self.0.insert_user(user)
    }
    fn save_user(&self, user: &User) -> RepoResult<()> {
        self.0.save_user(user)
    }
    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        self.0.delete_user(id)
    }
}

#[test]
fn lost_race_on_username_still_surfaces_as_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(
        RacingLookup(SqliteUserRepository::try_new(&conn).unwrap()),
        SqliteNoteRepository::try_new(&conn).unwrap(),
        CredentialHasher::new(4).unwrap(),
    );
    let request = |username: &str| CreateUserRequest {
        username: Some(username.to_string()),
        password: Some("pw".to_string()),
        roles: None,
    };

    service.create_user(&request("Alice")).unwrap();
    let err = service.create_user(&request("alice")).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Conflict(ConflictReason::DuplicateUsername(_))
    ));
}

/// Notes store whose by-owner lookup always misses, as if a note was
/// written between the dependent-notes check and the user delete.
struct LateNotes<'c>(SqliteNoteRepository<'c>);

impl NoteRepository for LateNotes<'_> {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.0.list_notes()
    }
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.0.get_note(id)
    }
    fn find_note_by_title(&self, owner: UserId, title: &str) -> RepoResult<Option<NoteMatch>> {
        self.0.find_note_by_title(owner, title)
    }
    fn find_notes_by_user(&self, _owner: UserId) -> RepoResult<Vec<NoteMatch>> {
        Ok(Vec::new())
    }
    fn insert_note(&self, note: &Note) -> RepoResult<NoteId> {
        self.0.insert_note(note)
    }
    fn save_note(&self, note: &Note) -> RepoResult<()> {
        self.0.save_note(note)
    }
    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        self.0.delete_note(id)
    }
}

#[test]
fn lost_race_on_owner_delete_still_surfaces_as_user_has_notes() {
    let conn = open_db_in_memory().unwrap();
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let service = UserService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        LateNotes(notes),
        CredentialHasher::new(4).unwrap(),
    );
    let alice = service
        .create_user(&CreateUserRequest {
            username: Some("alice".to_string()),
            password: Some("pw".to_string()),
            roles: None,
        })
        .unwrap();
    notes
        .insert_note(&Note::new(alice.id, "Late", "x"))
        .unwrap();

    let err = service
        .delete_user(&DeleteUserRequest {
            id: Some(alice.id.to_string()),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Conflict(ConflictReason::UserHasNotes(id)) if id == alice.id
    ));
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteUserRepository::try_new(&conn).unwrap_err(),
        RepoError::MissingRequiredTable("users")
    ));
    assert!(matches!(
        SqliteNoteRepository::try_new(&conn).unwrap_err(),
        RepoError::MissingRequiredTable("notes")
    ));
}
