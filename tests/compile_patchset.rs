//! Integration tests compiling real session-extension patchsets.
//!
//! Patchsets drop old values: DELETE records carry only the key and UPDATE
//! records carry the key plus the new values of modified columns. The
//! compiled SQL must still replay correctly against a seeded copy.

use rusqlite::Connection;
use rusqlite::session::Session;
use sqlite_changeset_sql::{ColumnSource, SchemaError, changeset_to_sql};

struct PragmaColumns<'a>(&'a Connection);

fn lookup(table: &str, e: &rusqlite::Error) -> SchemaError {
    SchemaError::Lookup {
        table: table.to_string(),
        reason: e.to_string(),
    }
}

impl ColumnSource for PragmaColumns<'_> {
    fn column_names(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        let mut stmt = self
            .0
            .prepare(&format!("PRAGMA table_info(\"{table}\")"))
            .map_err(|e| lookup(table, &e))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| lookup(table, &e))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| lookup(table, &e))?;
        if names.is_empty() {
            return Err(SchemaError::TableNotFound(table.to_string()));
        }
        Ok(names)
    }
}

fn open_with(setup: &[&str]) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    for sql in setup {
        conn.execute(sql, []).unwrap();
    }
    conn
}

fn capture_patchset(conn: &Connection, dml: &[&str]) -> Vec<u8> {
    let mut session = Session::new(conn).unwrap();
    session.attach::<&str>(None).unwrap();
    for sql in dml {
        conn.execute(sql, []).unwrap();
    }
    let mut buf = Vec::new();
    session.patchset_strm(&mut buf).unwrap();
    buf
}

fn table_rows(conn: &Connection, table: &str) -> Vec<Vec<rusqlite::types::Value>> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{table}\" ORDER BY 1, 2"))
        .unwrap();
    let ncols = stmt.column_count();
    stmt.query_map([], |row| {
        (0..ncols)
            .map(|i| row.get::<_, rusqlite::types::Value>(i))
            .collect::<Result<Vec<_>, _>>()
    })
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap()
}

fn assert_roundtrip(changed: &Connection, setup: &[&str], sql: &str, table: &str) {
    let copy = open_with(setup);
    copy.execute_batch(sql).unwrap();
    assert_eq!(
        table_rows(changed, table),
        table_rows(&copy, table),
        "table {table} diverged after replaying:\n{sql}"
    );
}

#[test]
fn test_patchset_insert_roundtrip() {
    let setup = &["CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"];
    let conn = open_with(setup);
    let patchset = capture_patchset(&conn, &["INSERT INTO users VALUES (1, 'Alice')"]);

    let sql = changeset_to_sql(PragmaColumns(&conn), &patchset).unwrap();
    assert_eq!(
        sql,
        "INSERT INTO \"users\" (\"id\", \"name\") VALUES (1, 'Alice');\n"
    );
    assert_roundtrip(&conn, setup, &sql, "users");
}

#[test]
fn test_patchset_delete_targets_key_only() {
    let setup = &[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
        "INSERT INTO users VALUES (1, 'Alice')",
        "INSERT INTO users VALUES (2, 'Bob')",
    ];
    let conn = open_with(setup);
    let patchset = capture_patchset(&conn, &["DELETE FROM users WHERE id = 2"]);

    let sql = changeset_to_sql(PragmaColumns(&conn), &patchset).unwrap();
    // No old values are recorded, so no diagnostic comment either
    assert_eq!(sql, "DELETE FROM \"users\" WHERE (\"id\") = (2);\n");
    assert_roundtrip(&conn, setup, &sql, "users");
}

#[test]
fn test_patchset_update_roundtrip() {
    let setup = &[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)",
        "INSERT INTO users VALUES (1, 'Alice', 30)",
        "INSERT INTO users VALUES (2, 'Bob', 25)",
    ];
    let conn = open_with(setup);
    let patchset = capture_patchset(&conn, &["UPDATE users SET age = 31 WHERE id = 1"]);

    let sql = changeset_to_sql(PragmaColumns(&conn), &patchset).unwrap();
    assert!(
        sql.contains("SET (\"age\") = (31) WHERE (\"id\") = (1)"),
        "unexpected update shape:\n{sql}"
    );
    assert_roundtrip(&conn, setup, &sql, "users");
}

#[test]
fn test_patchset_composite_key_roundtrip() {
    let setup = &[
        "CREATE TABLE grid (a INTEGER, b INTEGER, c TEXT, PRIMARY KEY (a, b))",
        "INSERT INTO grid VALUES (1, 1, 'hello')",
        "INSERT INTO grid VALUES (5, 5, 'bye')",
    ];
    let conn = open_with(setup);
    let patchset = capture_patchset(
        &conn,
        &[
            "UPDATE grid SET c = 'hello world' WHERE a = 1 AND b = 1",
            "DELETE FROM grid WHERE a = 5 AND b = 5",
        ],
    );

    let sql = changeset_to_sql(PragmaColumns(&conn), &patchset).unwrap();
    assert!(
        sql.contains("WHERE (\"a\", \"b\") = (5, 5)"),
        "key tuple missing in:\n{sql}"
    );
    assert_roundtrip(&conn, setup, &sql, "grid");
}
