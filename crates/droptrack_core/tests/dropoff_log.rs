use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use droptrack_core::db::open_db_in_memory;
use droptrack_core::{
    DateRange, DisplayZone, Dropoff, DropoffError, DropoffRepository, DropoffService, RepoError,
    SqliteDropoffRepository, SqliteUserRepository, User, UserId, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn la() -> DisplayZone {
    DisplayZone::new("America/Los_Angeles").unwrap()
}

fn seed_user(conn: &Connection, phone: &str) -> UserId {
    let user = User::with_id(Uuid::new_v4(), phone, "stored-hash", Utc::now()).unwrap();
    SqliteUserRepository::new(conn).create_user(&user).unwrap()
}

fn seed_admin(conn: &Connection, phone: &str) -> User {
    let repo = SqliteUserRepository::new(conn);
    let mut user = User::with_id(Uuid::new_v4(), phone, "stored-hash", Utc::now()).unwrap();
    user.is_admin = true;
    repo.create_user(&user).unwrap();
    user
}

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
}

#[test]
fn add_and_read_back_preserves_microsecond_instant() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    let dropped_at = at(2024, 6, 1, 18, 30, 12) + Duration::microseconds(654_321);
    let created = service
        .add_dropoff_at(owner, "1Z999AA10123456784", dropped_at)
        .unwrap();

    assert_eq!(created.user_id, owner);
    assert_eq!(created.tracking_number, "1Z999AA10123456784");
    assert_eq!(created.dropped_at, dropped_at);
}

#[test]
fn duplicate_tracking_number_for_same_user_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    service.add_dropoff(owner, "1Z999AA10123456784").unwrap();
    let err = service.add_dropoff(owner, "1Z999AA10123456784").unwrap_err();
    assert!(matches!(err, DropoffError::DuplicateTrackingNumber(_)));
}

#[test]
fn same_tracking_number_is_allowed_across_users() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_user(&conn, "7145550134");
    let second = seed_user(&conn, "7145550199");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    service.add_dropoff(first, "1Z999AA10123456784").unwrap();
    service.add_dropoff(second, "1Z999AA10123456784").unwrap();
}

#[test]
fn delete_requires_ownership() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let intruder = seed_user(&conn, "7145550199");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    let record = service.add_dropoff(owner, "1Z999AA10123456784").unwrap();

    let err = service.delete_dropoff(intruder, record.id).unwrap_err();
    assert!(matches!(err, DropoffError::RecordNotFound(id) if id == record.id));

    // Still present for the real owner, then deletable.
    let repo = SqliteDropoffRepository::new(&conn);
    assert!(repo.get_dropoff_for_user(record.id, owner).unwrap().is_some());
    service.delete_dropoff(owner, record.id).unwrap();
    assert!(repo.get_dropoff_for_user(record.id, owner).unwrap().is_none());
}

#[test]
fn edit_is_admin_only_and_rejects_numbers_in_use_elsewhere() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let regular = SqliteUserRepository::new(&conn)
        .get_user(owner)
        .unwrap()
        .unwrap();
    let admin = seed_admin(&conn, "7145550000");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    let first = service.add_dropoff(owner, "1Z999AA10123456784").unwrap();
    let second = service.add_dropoff(owner, "9400100000000000000000").unwrap();

    let err = service
        .edit_tracking_number(&regular, first.id, "NEWNUMBER1")
        .unwrap_err();
    assert!(matches!(err, DropoffError::NotAuthorized));

    let err = service
        .edit_tracking_number(&admin, first.id, "9400100000000000000000")
        .unwrap_err();
    assert!(matches!(err, DropoffError::TrackingNumberInUse(_)));

    // Re-writing a record with its own number is not a conflict.
    service
        .edit_tracking_number(&admin, second.id, "9400100000000000000000")
        .unwrap();

    let edited = service
        .edit_tracking_number(&admin, first.id, "NEWNUMBER1")
        .unwrap();
    assert_eq!(edited.tracking_number, "NEWNUMBER1");
}

#[test]
fn editing_unknown_record_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let admin = seed_admin(&conn, "7145550000");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    let missing = Uuid::new_v4();
    let err = service
        .edit_tracking_number(&admin, missing, "NEWNUMBER1")
        .unwrap_err();
    assert!(matches!(err, DropoffError::RecordNotFound(id) if id == missing));
}

#[test]
fn window_filter_is_inclusive_at_both_edges() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let zone = la();
    let repo = SqliteDropoffRepository::new(&conn);
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), zone);

    let window = DateRange::parse("2024-06-05", "2024-06-05")
        .unwrap()
        .resolve(&zone);

    service
        .add_dropoff_at(owner, "EDGE-START", window.start)
        .unwrap();
    service.add_dropoff_at(owner, "EDGE-END", window.end).unwrap();
    service
        .add_dropoff_at(owner, "TOO-EARLY", window.start - Duration::microseconds(1))
        .unwrap();
    service
        .add_dropoff_at(owner, "TOO-LATE", window.end + Duration::microseconds(1))
        .unwrap();

    let hits = repo.list_for_user_in_window(owner, window).unwrap();
    let numbers: Vec<_> = hits
        .iter()
        .map(|record| record.tracking_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["EDGE-START", "EDGE-END"]);
}

#[test]
fn window_filter_is_scoped_to_the_owner() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let other = seed_user(&conn, "7145550199");
    let zone = la();
    let repo = SqliteDropoffRepository::new(&conn);
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), zone);

    let window = DateRange::parse("2024-06-05", "2024-06-05")
        .unwrap()
        .resolve(&zone);
    service
        .add_dropoff_at(owner, "MINE-00001", window.start + Duration::hours(3))
        .unwrap();
    service
        .add_dropoff_at(other, "THEIRS-0001", window.start + Duration::hours(4))
        .unwrap();

    let hits = repo.list_for_user_in_window(owner, window).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tracking_number, "MINE-00001");
}

#[test]
fn dashboard_groups_days_newest_first_with_ascending_members() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    // Two records on 2024-06-01 local (inserted out of order), one on 06-02,
    // and one late-UTC record that still belongs to 06-02 local.
    service
        .add_dropoff_at(owner, "JUNE1-LATE", at(2024, 6, 1, 22, 0, 0))
        .unwrap();
    service
        .add_dropoff_at(owner, "JUNE1-EARLY", at(2024, 6, 1, 18, 0, 0))
        .unwrap();
    service
        .add_dropoff_at(owner, "JUNE2-ONLY", at(2024, 6, 2, 20, 0, 0))
        .unwrap();
    service
        .add_dropoff_at(owner, "JUNE2-NIGHT", at(2024, 6, 3, 1, 0, 0))
        .unwrap();

    let dashboard = service.dashboard(owner).unwrap();

    assert_eq!(dashboard.total_packages, 4);
    assert_eq!(dashboard.days.len(), 2);

    let newest = &dashboard.days[0];
    assert_eq!(newest.date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    assert_eq!(newest.package_count, 2);
    assert_eq!(newest.reference, newest.records[0].record.id);
    let numbers: Vec<_> = newest
        .records
        .iter()
        .map(|entry| entry.record.tracking_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["JUNE2-ONLY", "JUNE2-NIGHT"]);

    let older = &dashboard.days[1];
    assert_eq!(older.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let numbers: Vec<_> = older
        .records
        .iter()
        .map(|entry| entry.record.tracking_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["JUNE1-EARLY", "JUNE1-LATE"]);
}

#[test]
fn dashboard_projects_wall_clock_times() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "7145550134");
    let service = DropoffService::new(SqliteDropoffRepository::new(&conn), la());

    service
        .add_dropoff_at(owner, "JUNE1-EVENING", at(2024, 6, 2, 2, 15, 0))
        .unwrap();

    let dashboard = service.dashboard(owner).unwrap();
    let entry = &dashboard.days[0].records[0];
    // 2024-06-02T02:15Z is 2024-06-01 19:15 local (UTC-7).
    assert_eq!(
        entry.local_time,
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(19, 15, 0)
            .unwrap()
    );
}

#[test]
fn creating_a_record_for_an_unknown_user_fails_on_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDropoffRepository::new(&conn);

    let orphan = Dropoff::with_id_at(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "1Z999AA10123456784",
        Utc::now(),
    )
    .unwrap();

    let err = repo.create_dropoff(&orphan).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}
