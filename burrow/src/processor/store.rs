use std::path::{Path, PathBuf};

use burrow_link::{
    data::{Data, Record},
    result::{CallResult, STATUS_BAD_REQUEST, STATUS_ERROR, STATUS_NOT_FOUND},
    Condition,
};
use thiserror::Error;
use tokio::fs::{create_dir_all, read_to_string, write};

#[derive(Debug, Error)]
enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt table file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The table store: one JSON file per table, each holding an array of
/// records in insertion order. Tables spring into being on first insert.
pub(crate) struct TableStore {
    root: PathBuf,
}

impl TableStore {
    pub fn new<P: AsRef<Path>>(data_path: P, project: &str) -> Self {
        Self {
            root: data_path.as_ref().join(project),
        }
    }

    /// Append one record to a table. There is no uniqueness constraint of
    /// any kind; every accepted insert is stored.
    pub async fn insert(&self, table: &str, record: Record) -> CallResult {
        let path = match self.table_path(table) {
            Some(path) => path,
            None => return CallResult::failure(STATUS_BAD_REQUEST, "invalid table name"),
        };
        let mut records = match read_table(&path).await {
            Ok(records) => records,
            Err(e) => return CallResult::failure(STATUS_ERROR, e.to_string()),
        };
        records.push(record);
        match write_table(&path, &records).await {
            Ok(_) => CallResult::ok(None),
            Err(e) => CallResult::failure(STATUS_ERROR, e.to_string()),
        }
    }

    /// Fetch the first record matching the condition, in insertion order.
    /// Zero matches is a 404 failure, never an empty success.
    pub async fn get_one(&self, table: &str, find: &Condition) -> CallResult {
        let path = match self.table_path(table) {
            Some(path) => path,
            None => return CallResult::failure(STATUS_BAD_REQUEST, "invalid table name"),
        };
        let records = match read_table(&path).await {
            Ok(records) => records,
            Err(e) => return CallResult::failure(STATUS_ERROR, e.to_string()),
        };
        match records.into_iter().find(|record| find.matches(record)) {
            Some(record) => CallResult::ok(Some(Data::Map(record))),
            None => CallResult::failure(STATUS_NOT_FOUND, "no matching record"),
        }
    }

    /// Table names come off the wire; only plain names map to files.
    fn table_path(&self, table: &str) -> Option<PathBuf> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return None;
        }
        Some(self.root.join(format!("{}.json", table)))
    }
}

async fn read_table(path: &Path) -> Result<Vec<Record>, StoreError> {
    let data = match read_to_string(path).await {
        Ok(data) => data,
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&data)?)
}

async fn write_table(path: &Path, records: &Vec<Record>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }
    let data = serde_json::to_string(records)?;
    write(path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_link::result::STATUS_OK;

    fn user(name: &str, pass: &str) -> Record {
        let mut record = Record::new();
        record.insert("username".to_string(), Data::from(name));
        record.insert("pass".to_string(), Data::from(pass));
        record
    }

    #[tokio::test]
    async fn insert_then_get_one() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TableStore::new(dir.path(), "testing");

        let result = store.insert("users", user("a", "p")).await;
        assert_eq!(result.status(), STATUS_OK);

        let result = store.get_one("users", &Condition::eq("username", "a")).await;
        assert!(result.is_success());
        let payload = result.payload().expect("success carried no payload");
        assert_eq!(payload.get_property("pass").as_str(), Some("p"));
    }

    #[tokio::test]
    async fn zero_matches_is_not_found() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TableStore::new(dir.path(), "testing");

        store.insert("users", user("a", "p")).await;
        let result = store.get_one("users", &Condition::eq("username", "b")).await;
        assert!(!result.is_success());
        assert_eq!(result.status(), STATUS_NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TableStore::new(dir.path(), "testing");

        let result = store.get_one("users", &Condition::eq("username", "a")).await;
        assert_eq!(result.status(), STATUS_NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_inserts_are_independent() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TableStore::new(dir.path(), "testing");

        assert!(store.insert("users", user("a", "p")).await.is_success());
        assert!(store.insert("users", user("a", "q")).await.is_success());

        // first match in insertion order wins
        let result = store.get_one("users", &Condition::eq("username", "a")).await;
        let payload = result.payload().expect("success carried no payload");
        assert_eq!(payload.get_property("pass").as_str(), Some("p"));
    }

    #[tokio::test]
    async fn tables_persist_across_instances() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        {
            let store = TableStore::new(dir.path(), "testing");
            store.insert("users", user("a", "p")).await;
        }
        let store = TableStore::new(dir.path(), "testing");
        let result = store.get_one("users", &Condition::eq("username", "a")).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn hostile_table_name_rejected() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = TableStore::new(dir.path(), "testing");

        let result = store.insert("../escape", user("a", "p")).await;
        assert_eq!(result.status(), STATUS_BAD_REQUEST);
    }
}
