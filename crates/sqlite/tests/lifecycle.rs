#[cfg(test)]
mod tests {
    use sqlite::{Connection, Error, FieldValue, OpenOptions, Result, StatementState, params};
    use std::path::Path;
    use tempfile::TempDir;

    const PLAYERS: [(&str, i64, i64); 5] = [
        ("Tom Brady", 28, 7),
        ("Ben Roethlisberger", 26, 14),
        ("Matthew Stafford", 25, 9),
        ("Drew Brees", 21, 7),
        ("Philip Rivers", 24, 10),
    ];

    fn expected_rows() -> Vec<Vec<String>> {
        PLAYERS
            .iter()
            .map(|(name, td, int)| vec![name.to_string(), td.to_string(), int.to_string()])
            .collect()
    }

    fn read_all(conn: &Connection, sql: &str) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::new();
        let mut rs = conn.query(sql)?;
        while rs.next()? {
            rows.push(rs.row()?);
        }

        Ok(rows)
    }

    fn remove_database(path: &Path) {
        // removal only succeeds when the engine released the file
        std::fs::remove_file(path).expect("database file should be removable after close");
    }

    #[test_log::test]
    fn basic_insert() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("database.sqlite");

        let db = Connection::open(&db_path)?;
        db.exec("CREATE TABLE dillydilly (Player TEXT, Touchdown int, Interception int)")?;
        for (name, td, int) in PLAYERS {
            db.exec(&format!("INSERT INTO dillydilly VALUES ('{name}', {td}, {int})"))?;
        }

        assert_eq!(read_all(&db, "SELECT * FROM dillydilly")?, expected_rows());

        db.close();
        remove_database(&db_path);
        Ok(())
    }

    #[test_log::test]
    fn prepared_statement_insert() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("database.sqlite");

        let db = Connection::open(&db_path)?;
        db.exec("CREATE TABLE T (a TEXT, b INT, c INT)")?;

        let stmt = db.prepare("INSERT INTO T VALUES (?,?,?)")?;
        for (name, td, int) in PLAYERS {
            stmt.bind(params![name, td, int])?;
        }
        stmt.commit()?;

        let results = db.query("SELECT * FROM T")?;
        assert_eq!(results.column_names()?, vec!["a", "b", "c"]);
        assert_eq!(read_all(&db, "SELECT * FROM T")?, expected_rows());

        // neither the statement nor the result set are closed explicitly
        db.close();
        assert!(results.is_closed());
        remove_database(&db_path);
        Ok(())
    }

    #[test_log::test]
    fn empty_query() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("database.sqlite");

        let db = Connection::open(&db_path)?;
        db.exec("CREATE TABLE dillydilly (Player TEXT, Touchdown int, Interception int)")?;

        let mut results = db.query("SELECT * FROM dillydilly")?;
        assert!(!results.next()?);
        assert!(read_all(&db, "SELECT * FROM dillydilly")?.is_empty());

        db.close();
        remove_database(&db_path);
        Ok(())
    }

    #[test_log::test]
    fn null_round_trip() -> Result<()> {
        let db = Connection::open_in_memory()?;
        db.exec("CREATE TABLE t (a TEXT, b TEXT)")?;

        let stmt = db.prepare("INSERT INTO t VALUES (?, ?)")?;
        stmt.bind(params![None::<String>, ""])?;
        stmt.commit()?;

        let mut rs = db.query("SELECT a, b FROM t")?;
        assert!(rs.next()?);
        assert_eq!(rs.row()?, vec!["", ""]);
        assert_eq!(rs.typed_row()?, vec![FieldValue::Null, FieldValue::Text(String::new())]);
        Ok(())
    }

    #[test_log::test]
    fn typed_values_round_trip() -> Result<()> {
        let db = Connection::open_in_memory()?;
        db.exec("CREATE TABLE t (i INTEGER, r REAL, s TEXT)")?;

        let stmt = db.prepare("INSERT INTO t VALUES (?, ?, ?)")?;
        stmt.bind(params![i64::MIN, -0.125, "naïve ☃"])?;
        stmt.bind(params![i32::MAX, 1e300, "line\nbreak"])?;
        stmt.commit()?;

        let mut rs = db.query("SELECT * FROM t")?;
        let rows = rs.typed_rows().collect::<Result<Vec<_>>>()?;
        assert_eq!(
            rows,
            vec![
                vec![FieldValue::Integer(i64::MIN), FieldValue::Real(-0.125), FieldValue::from("naïve ☃")],
                vec![
                    FieldValue::Integer(i64::from(i32::MAX)),
                    FieldValue::Real(1e300),
                    FieldValue::from("line\nbreak")
                ],
            ]
        );
        Ok(())
    }

    #[test_log::test]
    fn operation_on_closed_database() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("db2.sqlite");

        let db = Connection::open(&db_path)?;
        db.close();
        assert!(matches!(db.exec("SELECT * FROM sqlite_master"), Err(Error::DatabaseClosed)));
        assert!(matches!(db.handle(), Err(Error::DatabaseClosed)));
        Ok(())
    }

    #[test_log::test]
    fn double_close() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("db3.sqlite");

        let db = Connection::open(&db_path)?;
        db.exec("CREATE TABLE dillydilly (Player TEXT, Touchdown int, Interception int)")?;
        db.exec("INSERT INTO dillydilly VALUES ('Tom Brady', 28, 7)")?;
        db.close();
        assert!(db.is_closed());
        db.close();
        drop(db);

        remove_database(&db_path);
        Ok(())
    }

    #[test_log::test]
    fn too_many_values() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("database.sqlite");

        let db = Connection::open(&db_path)?;
        db.exec("CREATE TABLE dillydilly (Player TEXT, Touchdown int, Interception int)")?;

        let stmt = db.prepare("INSERT INTO dillydilly VALUES (?,?,?)")?;
        assert!(matches!(stmt.bind(params!["Tom Brady", 28, 3, 7]), Err(Error::ValueError(_))));
        stmt.commit()?;
        assert!(read_all(&db, "SELECT * FROM dillydilly")?.is_empty());

        db.close();
        remove_database(&db_path);
        Ok(())
    }

    #[test_log::test]
    fn primary_key_violation() -> Result<()> {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("database.sqlite");

        let db = Connection::open(&db_path)?;
        db.exec("CREATE TABLE dillydilly (Player TEXT PRIMARY KEY, Touchdown int, Interception int)")?;

        let stmt = db.prepare("INSERT INTO dillydilly VALUES (?,?,?)")?;
        let res = stmt
            .bind(params!["Tom Brady", 28, 3])
            .and_then(|_| stmt.bind(params!["Tom Brady", 28, 3]));

        let err = res.expect_err("duplicate primary key must fail");
        assert!(matches!(err, Error::Sqlite { .. }));
        assert!(err.to_string().contains("Primary key constraint failed"));

        assert!(matches!(stmt.handle(), Err(Error::StatementClosed)));
        assert_eq!(stmt.state(), StatementState::RolledBack);
        assert!(!db.in_transaction());
        assert!(read_all(&db, "SELECT * FROM dillydilly")?.is_empty());

        db.close();
        remove_database(&db_path);
        Ok(())
    }

    #[test_log::test]
    fn foreign_key_violation() -> Result<()> {
        let db = OpenOptions::new().foreign_keys(true).open(":memory:")?;
        db.exec(
            "CREATE TABLE team (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE player (name TEXT, team INTEGER REFERENCES team(id));
             INSERT INTO team VALUES (1, 'Patriots');",
        )?;

        let stmt = db.prepare("INSERT INTO player VALUES (?, ?)")?;
        stmt.bind(params!["Tom Brady", 1])?;
        let err = stmt.bind(params!["Drew Brees", 2]).expect_err("missing team must fail");
        assert!(err.to_string().contains("Foreign key constraint failed"));
        assert_eq!(err.sqlite_extended_code(), Some(787));
        assert!(stmt.is_closed());

        // the valid row of the same transaction was rolled back as well
        assert!(read_all(&db, "SELECT * FROM player")?.is_empty());
        Ok(())
    }

    #[test_log::test]
    fn close_with_open_statements() -> Result<()> {
        let db = Connection::open_in_memory()?;
        db.exec("CREATE TABLE t (a INT)")?;

        let stmt = db.prepare("INSERT INTO t VALUES (?)")?;
        let copy = stmt.clone();
        let mut rs = db.query("SELECT * FROM t")?;

        db.close();
        assert!(matches!(stmt.bind(params![1]), Err(Error::StatementClosed)));
        assert!(matches!(copy.commit(), Err(Error::StatementClosed)));
        assert!(matches!(rs.next(), Err(Error::StatementClosed)));
        assert_eq!(stmt.state(), StatementState::Closed);

        db.close();
        Ok(())
    }

    #[test_log::test]
    fn syntax_error() -> Result<()> {
        let db = Connection::open_in_memory()?;
        let err = db.exec("SELCT * FROM sqlite_master").expect_err("typo must fail");
        assert!(matches!(err, Error::Sqlite { .. }));

        db.exec("CREATE TABLE t (a INT)")?;
        db.exec("INSERT INTO t VALUES (42)")?;
        assert_eq!(read_all(&db, "SELECT a FROM t")?, vec![vec!["42".to_string()]]);
        Ok(())
    }
}
