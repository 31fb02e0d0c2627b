use constructor_core::db::migrations::latest_version;
use constructor_core::db::{open_db, open_db_in_memory, DbError};
use constructor_core::{GatewayErrorKind, SqliteConstructorGateway};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "areas");
    assert_table_exists(&conn, "constructor_groups");
    assert_table_exists(&conn, "constructor_holders");
}

#[test]
fn holder_table_carries_ordering_and_sub_object_columns() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("PRAGMA table_info(constructor_holders);")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    for expected in [
        "parent_group_id",
        "sub_group_id",
        "sub_reference_id",
        "link_target_id",
        "sort_order",
        "inheritance",
    ] {
        assert!(
            columns.contains(&expected.to_string()),
            "missing column {expected}"
        );
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO constructor_holders (parent_group_id, name, sort_order) VALUES (404, 'x', 0);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().to_lowercase().contains("foreign key"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("constructor.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO areas (name) VALUES ('Home');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let areas: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM areas;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(areas, 1);
}

#[test]
fn open_db_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data").join("constructor.db");

    let conn = open_db(&path).unwrap();

    assert!(path.exists());
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn gateway_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteConstructorGateway::try_new(&conn)
        .err()
        .expect("unmigrated connection should be rejected");
    assert_eq!(err.kind(), GatewayErrorKind::ConnectionFailure);
    assert!(err.to_string().contains("schema version"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
