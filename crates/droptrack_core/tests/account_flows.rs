use chrono::{TimeZone, Utc};
use droptrack_core::db::open_db_in_memory;
use droptrack_core::{
    AccountError, AccountService, DisplayZone, DropoffRepository, DropoffService,
    SqliteDropoffRepository, SqliteUserRepository, User, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

// Low bcrypt cost keeps the suite fast; production cost comes from config.
const TEST_COST: u32 = 4;

fn account_service(conn: &Connection) -> AccountService<SqliteUserRepository<'_>> {
    AccountService::with_cost(SqliteUserRepository::new(conn), TEST_COST)
}

fn make_admin(conn: &Connection, service: &AccountService<SqliteUserRepository<'_>>) -> User {
    let admin = service.register("7145550000", "admin-pass").unwrap();
    SqliteUserRepository::new(conn)
        .set_admin(admin.id, true)
        .unwrap();
    service.get_user(admin.id).unwrap().unwrap()
}

#[test]
fn register_normalizes_phone_and_hashes_password() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service.register("(714) 555-0134", "hunter2-secret").unwrap();

    assert_eq!(user.phone_number, "7145550134");
    assert!(!user.is_admin);
    assert_ne!(user.password_hash, "hunter2-secret");
    assert!(user.password_hash.starts_with("$2"));

    let verified = service
        .verify_credentials("714-555-0134", "hunter2-secret")
        .unwrap();
    assert_eq!(verified.id, user.id);
}

#[test]
fn duplicate_phone_number_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    service.register("7145550134", "first-pass").unwrap();
    let err = service.register("714 555 0134", "second-pass").unwrap_err();
    assert!(matches!(err, AccountError::PhoneAlreadyRegistered(_)));
}

#[test]
fn malformed_phone_and_empty_password_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    assert!(matches!(
        service.register("not-a-phone", "some-pass"),
        Err(AccountError::Validation(_))
    ));
    assert!(matches!(
        service.register("7145550134", "   "),
        Err(AccountError::EmptyPassword)
    ));
}

#[test]
fn wrong_password_and_unknown_phone_are_indistinguishable() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);
    service.register("7145550134", "right-pass").unwrap();

    let wrong_password = service
        .verify_credentials("7145550134", "wrong-pass")
        .unwrap_err();
    let unknown_phone = service
        .verify_credentials("7145559999", "right-pass")
        .unwrap_err();

    assert!(matches!(wrong_password, AccountError::InvalidCredentials));
    assert!(matches!(unknown_phone, AccountError::InvalidCredentials));
}

#[test]
fn password_reset_is_admin_only_and_replaces_the_hash() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let admin = make_admin(&conn, &service);
    let user = service.register("7145550134", "old-pass").unwrap();

    let err = service
        .reset_password(&user, admin.id, "sneaky-pass")
        .unwrap_err();
    assert!(matches!(err, AccountError::NotAuthorized));

    let err = service.reset_password(&admin, user.id, "  ").unwrap_err();
    assert!(matches!(err, AccountError::EmptyPassword));

    service.reset_password(&admin, user.id, "new-pass").unwrap();
    assert!(matches!(
        service.verify_credentials("7145550134", "old-pass"),
        Err(AccountError::InvalidCredentials)
    ));
    service.verify_credentials("7145550134", "new-pass").unwrap();
}

#[test]
fn reset_for_unknown_user_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let admin = make_admin(&conn, &service);

    let missing = Uuid::new_v4();
    let err = service
        .reset_password(&admin, missing, "new-pass")
        .unwrap_err();
    assert!(matches!(err, AccountError::UserNotFound(id) if id == missing));
}

#[test]
fn toggle_admin_flips_the_flag_but_never_on_self() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let admin = make_admin(&conn, &service);
    let user = service.register("7145550134", "user-pass").unwrap();

    let err = service.toggle_admin(&user, admin.id).unwrap_err();
    assert!(matches!(err, AccountError::NotAuthorized));

    let err = service.toggle_admin(&admin, admin.id).unwrap_err();
    assert!(matches!(err, AccountError::SelfTarget(_)));

    let promoted = service.toggle_admin(&admin, user.id).unwrap();
    assert!(promoted.is_admin);
    let demoted = service.toggle_admin(&admin, user.id).unwrap();
    assert!(!demoted.is_admin);
}

#[test]
fn delete_user_cascades_to_their_dropoffs_but_never_on_self() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let admin = make_admin(&conn, &service);
    let user = service.register("7145550134", "user-pass").unwrap();

    let zone = DisplayZone::new("America/Los_Angeles").unwrap();
    let dropoffs = DropoffService::new(SqliteDropoffRepository::new(&conn), zone);
    dropoffs.add_dropoff(user.id, "1Z999AA10123456784").unwrap();
    dropoffs.add_dropoff(user.id, "9400100000000000000000").unwrap();

    let err = service.delete_user(&admin, admin.id).unwrap_err();
    assert!(matches!(err, AccountError::SelfTarget(_)));

    service.delete_user(&admin, user.id).unwrap();

    assert!(service.get_user(user.id).unwrap().is_none());
    let remaining = SqliteDropoffRepository::new(&conn)
        .list_for_user(user.id)
        .unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn list_users_is_admin_gated_and_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let admin = make_admin(&conn, &service);

    // Deterministic registration instants, oldest first.
    let repo = SqliteUserRepository::new(&conn);
    for (offset, phone) in [(1, "7145550101"), (2, "7145550102"), (3, "7145550103")] {
        let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, offset, 0).unwrap();
        let user = User::with_id(Uuid::new_v4(), phone, "stored-hash", created_at).unwrap();
        repo.create_user(&user).unwrap();
    }

    let regular = service.register("7145550134", "user-pass").unwrap();
    let err = service.list_users(&regular).unwrap_err();
    assert!(matches!(err, AccountError::NotAuthorized));

    let listed = service.list_users(&admin).unwrap();
    let phones: Vec<_> = listed
        .iter()
        .map(|user| user.phone_number.as_str())
        .collect();

    let older_three: Vec<_> = phones
        .iter()
        .filter(|phone| phone.starts_with("714555010"))
        .copied()
        .collect();
    assert_eq!(older_three, vec!["7145550103", "7145550102", "7145550101"]);
}
