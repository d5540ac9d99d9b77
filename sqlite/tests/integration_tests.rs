//! Integration tests for the sqlite-mcp-sqlite crate.

use rusqlite::Connection;
use serde_json::{Map, Value, json};
use sqlite_mcp_core::{CreateTableParams, ErrorCategory, Execution, ToResponse};
use sqlite_mcp_db::ServerConfig;
use sqlite_mcp_sqlite::Gateway;

/// Creates a gateway over a fresh temporary data directory.
fn setup_gateway() -> (tempfile::TempDir, Gateway) {
    setup_gateway_with(|_| {})
}

fn setup_gateway_with(adjust: impl FnOnce(&mut ServerConfig)) -> (tempfile::TempDir, Gateway) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig {
        data_dir: dir.path().join("data"),
        ..ServerConfig::default()
    };
    adjust(&mut config);
    let gateway = Gateway::new(config).unwrap();
    (dir, gateway)
}

fn rows_of(result: Execution) -> (Vec<Map<String, Value>>, u64, bool) {
    match result {
        Execution::Rows(rows) => (rows.data, rows.row_count, rows.truncated),
        other => panic!("expected rows, got {other:?}"),
    }
}

fn rows_affected(result: Execution) -> u64 {
    match result {
        Execution::Written(summary) => summary.rows_affected,
        other => panic!("expected write summary, got {other:?}"),
    }
}

// =============================================================================
// Statement gateway
// =============================================================================

#[test]
fn test_create_insert_select_scenario() {
    let (_dir, gateway) = setup_gateway();

    gateway
        .execute("main.db", "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
        .unwrap();

    let inserted = gateway
        .execute("main.db", "INSERT INTO t (v) VALUES (?)", &[json!("x")])
        .unwrap();
    assert_eq!(rows_affected(inserted), 1);

    let selected = gateway.execute("main.db", "SELECT * FROM t", &[]);
    assert_eq!(
        selected.to_response(),
        json!({"success": true, "data": [{"id": 1, "v": "x"}], "row_count": 1, "truncated": false})
    );
}

#[test]
fn test_disallowed_keywords_are_rejected_without_opening() {
    let (_dir, gateway) = setup_gateway();

    for sql in [
        "PRAGMA journal_mode = WAL",
        "ATTACH DATABASE 'other.db' AS other",
        "VACUUM",
        "WITH x AS (SELECT 1) SELECT * FROM x",
        "   ",
        "",
    ] {
        let failure = gateway.execute("fresh.db", sql, &[]).unwrap_err();
        assert_eq!(failure.category, ErrorCategory::OperationNotAllowed, "{sql:?}");
    }
    assert!(!gateway.sandbox().root().join("fresh.db").exists());
}

#[test]
fn test_keyword_check_is_case_insensitive() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "create table t (v)", &[])
        .unwrap();
    let (data, count, _) = rows_of(gateway.execute("main.db", "  select * from t", &[]).unwrap());
    assert!(data.is_empty());
    assert_eq!(count, 0);
}

#[test]
fn test_select_is_capped_but_counts_every_row() {
    let (_dir, gateway) = setup_gateway_with(|config| config.max_results = 10);
    gateway
        .execute("main.db", "CREATE TABLE n (v INTEGER)", &[])
        .unwrap();
    for i in 0..25 {
        gateway
            .execute("main.db", "INSERT INTO n (v) VALUES (?)", &[json!(i)])
            .unwrap();
    }

    let (data, count, truncated) =
        rows_of(gateway.execute("main.db", "SELECT v FROM n ORDER BY v", &[]).unwrap());
    assert_eq!(count, 25);
    assert_eq!(data.len(), 10);
    assert!(truncated);
    assert_eq!(data[9]["v"], json!(9));

    let (data, count, truncated) = rows_of(
        gateway
            .execute("main.db", "SELECT v FROM n WHERE v < ?", &[json!(10)])
            .unwrap(),
    );
    assert_eq!(count, 10);
    assert_eq!(data.len(), 10);
    assert!(!truncated);
}

#[test]
fn test_select_on_missing_database_is_not_found() {
    let (_dir, gateway) = setup_gateway();
    let failure = gateway.execute("absent.db", "SELECT 1", &[]).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::NotFound);
    assert!(!gateway.sandbox().root().join("absent.db").exists());
}

#[test]
fn test_write_creates_database_file() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("new.db", "CREATE TABLE t (v TEXT)", &[])
        .unwrap();
    assert!(gateway.sandbox().root().join("new.db").is_file());
}

#[test]
fn test_update_and_delete_report_affected_rows() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "CREATE TABLE t (k TEXT, n INTEGER)", &[])
        .unwrap();
    for (k, n) in [("a", 1), ("b", 2), ("c", 3)] {
        gateway
            .execute("main.db", "INSERT INTO t VALUES (?, ?)", &[json!(k), json!(n)])
            .unwrap();
    }

    let updated = gateway
        .execute("main.db", "UPDATE t SET n = n * 10 WHERE n >= ?", &[json!(2)])
        .unwrap();
    assert_eq!(rows_affected(updated), 2);

    let deleted = gateway
        .execute("main.db", "DELETE FROM t WHERE k = ?", &[json!("a")])
        .unwrap();
    assert_eq!(rows_affected(deleted), 1);

    let (data, _, _) =
        rows_of(gateway.execute("main.db", "SELECT n FROM t ORDER BY k", &[]).unwrap());
    assert_eq!(data[0]["n"], json!(20));
    assert_eq!(data[1]["n"], json!(30));
}

#[test]
fn test_value_types_round_trip_through_binds() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "CREATE TABLE v (i INTEGER, r REAL, t TEXT, n TEXT, b INTEGER)", &[])
        .unwrap();
    gateway
        .execute(
            "main.db",
            "INSERT INTO v VALUES (?, ?, ?, ?, ?)",
            &[json!(42), json!(2.5), json!("hi"), Value::Null, json!(true)],
        )
        .unwrap();

    let (data, _, _) = rows_of(gateway.execute("main.db", "SELECT * FROM v", &[]).unwrap());
    assert_eq!(
        Value::Object(data[0].clone()),
        json!({"i": 42, "r": 2.5, "t": "hi", "n": null, "b": 1})
    );
}

#[test]
fn test_engine_errors_are_structured() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "CREATE TABLE u (email TEXT UNIQUE)", &[])
        .unwrap();
    gateway
        .execute("main.db", "INSERT INTO u VALUES (?)", &[json!("a@b.c")])
        .unwrap();

    let duplicate = gateway
        .execute("main.db", "INSERT INTO u VALUES (?)", &[json!("a@b.c")])
        .unwrap_err();
    assert_eq!(duplicate.category, ErrorCategory::EngineError);
    assert_eq!(duplicate.engine_code.as_deref(), Some("ConstraintViolation"));

    let missing = gateway
        .execute("main.db", "SELECT * FROM nowhere", &[])
        .unwrap_err();
    assert_eq!(missing.category, ErrorCategory::EngineError);
    assert!(missing.message.contains("no such table"));

    let syntax = gateway
        .execute("main.db", "DELETE FROM WHERE", &[])
        .unwrap_err();
    assert_eq!(syntax.category, ErrorCategory::EngineError);
}

#[test]
fn test_lock_contention_is_reported_not_retried() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "CREATE TABLE t (v INTEGER)", &[])
        .unwrap();

    let holder = Connection::open(gateway.sandbox().root().join("main.db")).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let started = std::time::Instant::now();
    let failure = gateway
        .execute("main.db", "INSERT INTO t VALUES (1)", &[])
        .unwrap_err();
    assert_eq!(failure.category, ErrorCategory::EngineError);
    assert_eq!(failure.engine_code.as_deref(), Some("DatabaseBusy"));
    assert!(started.elapsed() < std::time::Duration::from_secs(2));

    holder.execute_batch("ROLLBACK;").unwrap();
    gateway
        .execute("main.db", "INSERT INTO t VALUES (1)", &[])
        .unwrap();
}

#[test]
fn test_path_escape_is_rejected() {
    let (_dir, gateway) = setup_gateway();
    let failure = gateway
        .execute("../outside.db", "CREATE TABLE t (v)", &[])
        .unwrap_err();
    assert_eq!(failure.category, ErrorCategory::PathEscape);

    let failure = gateway.get_schema("/etc/passwd", None).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::PathEscape);
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_does_not_write_outside_root() {
    let (dir, gateway) = setup_gateway();
    let outside = dir.path().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    std::os::unix::fs::symlink(outside.join("evil.db"), gateway.sandbox().root().join("evil.db"))
        .unwrap();

    let failure = gateway
        .execute("evil.db", "CREATE TABLE t (v)", &[])
        .unwrap_err();
    assert_eq!(failure.category, ErrorCategory::PathEscape);

    seed(&gateway, "main.db");
    let failure = gateway.backup("main.db", Some("evil.db")).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::PathEscape);
    assert!(!outside.join("evil.db").exists());
}

#[cfg(unix)]
#[test]
fn test_reads_work_on_read_only_file() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");
    let path = gateway.sandbox().root().join("main.db");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();

    let (data, count, _) = rows_of(
        gateway
            .execute("main.db", "SELECT v FROM t ORDER BY v", &[])
            .unwrap(),
    );
    assert_eq!(count, 3);
    assert_eq!(data[0]["v"], json!("a"));

    let schema = gateway.get_schema("main.db", Some("t")).unwrap();
    assert_eq!(schema.tables["t"].row_count, 3);

    let report = gateway.backup("main.db", Some("copy.db")).unwrap();
    assert!(report.backup_path.ends_with("copy.db"));
}

#[test]
fn test_custom_allow_list_is_enforced() {
    let (_dir, gateway) =
        setup_gateway_with(|config| config.allowed_operations = vec!["SELECT".to_string()]);
    let failure = gateway
        .execute("main.db", "CREATE TABLE t (v)", &[])
        .unwrap_err();
    assert_eq!(failure.category, ErrorCategory::OperationNotAllowed);
    assert_eq!(failure.message, "Operation CREATE not allowed");
}

// =============================================================================
// Table creation
// =============================================================================

fn create_params(table: &str, columns: Value, primary_key: Option<&str>) -> CreateTableParams {
    serde_json::from_value(json!({
        "database": "main.db",
        "table_name": table,
        "columns": columns,
        "primary_key": primary_key,
    }))
    .unwrap()
}

#[test]
fn test_create_table_then_describe() {
    let (_dir, gateway) = setup_gateway();
    let params = create_params(
        "users",
        json!({"id": "INTEGER", "name": "TEXT NOT NULL", "email": "TEXT"}),
        Some("id"),
    );
    gateway.create_table(&params).unwrap();
    // IF NOT EXISTS makes a second call harmless.
    gateway.create_table(&params).unwrap();

    let schema = gateway.get_schema("main.db", Some("users")).unwrap();
    let columns = &schema.tables["users"].columns;
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "email"]);
    assert!(columns[0].primary_key);
    assert!(columns[1].not_null);
}

#[test]
fn test_create_table_with_bad_type_is_engine_error() {
    let (_dir, gateway) = setup_gateway();
    let params = create_params("broken", json!({"a": "TEXT,,"}), None);
    let failure = gateway.create_table(&params).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::EngineError);

    let params = create_params("empty", json!({}), None);
    let failure = gateway.create_table(&params).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::EngineError);
}

// =============================================================================
// Schema inspector
// =============================================================================

#[test]
fn test_schema_of_fresh_table() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[])
        .unwrap();

    let schema = gateway.get_schema("main.db", None).unwrap();
    assert_eq!(schema.tables.len(), 1);
    let table = &schema.tables["t"];
    assert_eq!(table.columns.len(), 2);
    assert!(table.columns[0].primary_key);
    assert!(table.indexes.is_empty());
    assert_eq!(table.row_count, 0);
}

#[test]
fn test_schema_of_missing_database_is_not_found() {
    let (_dir, gateway) = setup_gateway();
    let failure = gateway.get_schema("nope.db", None).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::NotFound);
    assert_eq!(failure.message, "Database nope.db does not exist");
}

#[test]
fn test_schema_response_shape() {
    let (_dir, gateway) = setup_gateway();
    gateway
        .execute("main.db", "CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])
        .unwrap();
    let response = gateway.get_schema("main.db", Some("t")).to_response();
    assert_eq!(response["success"], true);
    assert_eq!(response["database"], "main.db");
    assert_eq!(response["tables"]["t"]["columns"][0]["type"], "INTEGER");
    assert_eq!(response["tables"]["t"]["row_count"], 0);
}

// =============================================================================
// Backup, listing, maintenance
// =============================================================================

fn seed(gateway: &Gateway, database: &str) {
    gateway
        .execute(database, "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
        .unwrap();
    gateway
        .execute(database, "CREATE INDEX idx_t_v ON t (v)", &[])
        .unwrap();
    for v in ["a", "b", "c"] {
        gateway
            .execute(database, "INSERT INTO t (v) VALUES (?)", &[json!(v)])
            .unwrap();
    }
}

#[test]
fn test_backup_default_destination_matches_source_schema() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");

    let report = gateway.backup("main.db", None).unwrap();
    let path = std::path::PathBuf::from(&report.backup_path);
    assert!(path.is_file());
    assert!(path.starts_with(gateway.sandbox().root()));
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("main_backup_"), "{file_name}");
    assert!(file_name.ends_with(".db"));

    let source = gateway.get_schema("main.db", None).unwrap();
    let copy = gateway.get_schema(&file_name, None).unwrap();
    assert_eq!(source.tables, copy.tables);
}

#[test]
fn test_backup_named_destination() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");

    let report = gateway.backup("main.db", Some("copy.db")).unwrap();
    assert_eq!(
        report.backup_path,
        gateway.sandbox().root().join("copy.db").display().to_string()
    );
    let (data, count, _) = rows_of(gateway.execute("copy.db", "SELECT v FROM t", &[]).unwrap());
    assert_eq!(count, 3);
    assert_eq!(data.len(), 3);
}

#[test]
fn test_backup_failures() {
    let (_dir, gateway) = setup_gateway();
    let failure = gateway.backup("absent.db", None).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::NotFound);

    seed(&gateway, "main.db");
    let failure = gateway.backup("main.db", Some("missing_dir/copy.db")).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::IoError);

    let failure = gateway.backup("main.db", Some("../copy.db")).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::PathEscape);
}

#[test]
fn test_backup_onto_source_is_rejected() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");

    let started = std::time::Instant::now();
    for destination in ["main.db", "./main.db", "sub/../main.db"] {
        let failure = gateway.backup("main.db", Some(destination)).unwrap_err();
        assert_eq!(failure.category, ErrorCategory::IoError, "{destination}");
        assert!(failure.message.contains("is the source database"));
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(2));

    let (_, count, _) = rows_of(gateway.execute("main.db", "SELECT v FROM t", &[]).unwrap());
    assert_eq!(count, 3);
}

#[test]
fn test_backup_to_locked_destination_gives_up() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");
    gateway
        .execute("held.db", "CREATE TABLE other (x)", &[])
        .unwrap();

    let holder = Connection::open(gateway.sandbox().root().join("held.db")).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let started = std::time::Instant::now();
    let failure = gateway.backup("main.db", Some("held.db")).unwrap_err();
    assert_eq!(failure.category, ErrorCategory::EngineError);
    assert_eq!(failure.engine_code.as_deref(), Some("DatabaseBusy"));
    assert!(started.elapsed() < std::time::Duration::from_secs(5));

    holder.execute_batch("ROLLBACK;").unwrap();
    gateway.backup("main.db", Some("held.db")).unwrap();
}

#[test]
fn test_backup_while_reader_holds_snapshot() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");

    let reader = Connection::open(gateway.sandbox().root().join("main.db")).unwrap();
    reader.execute_batch("BEGIN;").unwrap();
    let seen: i64 = reader
        .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seen, 3);

    let report = gateway.backup("main.db", Some("snapshot.db")).unwrap();
    reader.execute_batch("COMMIT;").unwrap();

    assert!(report.backup_path.ends_with("snapshot.db"));
    let copy = gateway.get_schema("snapshot.db", Some("t")).unwrap();
    assert_eq!(copy.tables["t"].row_count, 3);
}

#[test]
fn test_list_databases() {
    let (_dir, gateway) = setup_gateway();
    let empty = gateway.list_databases().unwrap();
    assert_eq!(empty.count, 0);
    assert!(empty.databases.is_empty());

    gateway
        .execute("main.db", "CREATE TABLE t (v)", &[])
        .unwrap();
    let listed = gateway.list_databases().unwrap();
    assert_eq!(listed.count, 1);
    assert_eq!(listed.databases[0].name, "main.db");
    assert!(listed.databases[0].size_bytes > 0);
}

#[test]
fn test_optimize() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");

    let report = gateway.optimize("main.db").unwrap();
    assert!(report.all_succeeded());
    let operations: Vec<&str> = report.operations.iter().map(|s| s.operation.as_str()).collect();
    assert_eq!(operations, vec!["VACUUM", "ANALYZE"]);

    let response = gateway.optimize("main.db").to_response();
    assert_eq!(response["success"], true);
    assert_eq!(response["operations"][1]["result"]["success"], true);
}

#[test]
fn test_optimize_reports_failed_step() {
    let (_dir, gateway) = setup_gateway();
    seed(&gateway, "main.db");

    let holder = Connection::open(gateway.sandbox().root().join("main.db")).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let response = gateway.optimize("main.db").to_response();
    holder.execute_batch("ROLLBACK;").unwrap();

    assert_eq!(response["success"], false);
    assert_eq!(response["operations"][0]["result"]["success"], false);
    assert_eq!(response["operations"][0]["result"]["error_type"], "EngineError");
}

#[test]
fn test_optimize_missing_database() {
    let (_dir, gateway) = setup_gateway();
    let failure = gateway.optimize("absent.db").unwrap_err();
    assert_eq!(failure.category, ErrorCategory::NotFound);
}
