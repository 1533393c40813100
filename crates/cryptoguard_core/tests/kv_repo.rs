use cryptoguard_core::db::{open_db, open_db_in_memory};
use cryptoguard_core::{KvRepository, KvWrite, RepoError, SqliteKvRepository};

#[test]
fn set_get_and_overwrite() {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());

    assert_eq!(repo.get("token").unwrap(), None);
    repo.set("token", "abc").unwrap();
    repo.set("token", "def").unwrap();

    assert_eq!(repo.get("token").unwrap().as_deref(), Some("def"));
    assert!(repo.contains("token").unwrap());
}

#[test]
fn remove_deletes_row_and_tolerates_missing_key() {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());
    repo.set("address", "Main street").unwrap();

    repo.remove("address").unwrap();
    repo.remove("address").unwrap();

    let rows: i64 = repo
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn batch_with_invalid_key_is_rejected_before_any_write() {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());
    repo.set("token", "abc").unwrap();

    let err = repo
        .apply(&[KvWrite::remove("token"), KvWrite::set(" ", "x")])
        .unwrap_err();

    assert!(matches!(err, RepoError::InvalidKey(_)));
    assert_eq!(repo.get("token").unwrap().as_deref(), Some("abc"));
}

#[test]
fn batch_rolls_back_when_sql_fails_midway() {
    let repo = SqliteKvRepository::new(open_db_in_memory().unwrap());
    repo.set("token", "abc").unwrap();
    repo.connection()
        .execute_batch(
            "CREATE TRIGGER reject_address BEFORE INSERT ON kv_entries
             WHEN NEW.key = 'address'
             BEGIN SELECT RAISE(ABORT, 'address rejected'); END;",
        )
        .unwrap();

    let err = repo
        .apply(&[KvWrite::remove("token"), KvWrite::set("address", "x")])
        .unwrap_err();

    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.get("token").unwrap().as_deref(), Some("abc"));
}

#[test]
fn values_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let first = SqliteKvRepository::new(open_db(&path).unwrap());
    first.set("favourites", "[]").unwrap();
    drop(first);

    let second = SqliteKvRepository::new(open_db(&path).unwrap());
    assert_eq!(second.get("favourites").unwrap().as_deref(), Some("[]"));
}
