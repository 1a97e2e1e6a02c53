//! Test fixtures and helpers.

use chrono::{DateTime, TimeZone, Utc};
use jadb_core::{Client, Collection, Config, Database, DocumentId, IdGenerator, ManualClock};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// A client whose storage is cleaned up on drop.
///
/// File-backed fixtures own a temporary directory; memory fixtures own
/// nothing. Both dereference to [`Client`].
pub struct TestClient {
    client: Client,
    config: Config,
    _temp_dir: Option<TempDir>,
}

impl TestClient {
    /// Creates a client over a fresh temporary directory.
    ///
    /// Writes skip fsync to keep tests fast.
    #[must_use]
    pub fn file() -> Self {
        Self::file_with(|config| config)
    }

    /// Creates a file-backed client, letting `configure` adjust the
    /// default configuration. The root is always the temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn file_with(configure: impl FnOnce(Config) -> Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = configure(Config::new(temp_dir.path()).sync_on_write(false));
        let config = Config {
            root: temp_dir.path().to_path_buf(),
            ..config
        };
        Self {
            client: Client::with_config(config.clone()),
            config,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates an in-memory client.
    #[must_use]
    pub fn memory() -> Self {
        Self::memory_with(|config| config)
    }

    /// Creates an in-memory client with an adjusted configuration.
    #[must_use]
    pub fn memory_with(configure: impl FnOnce(Config) -> Config) -> Self {
        let config = configure(Config::default());
        Self {
            client: Client::in_memory_with_config(config.clone()),
            config,
            _temp_dir: None,
        }
    }

    /// Returns the wrapped client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the storage directory for file-backed fixtures.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Returns a second, independent client over the same directory.
    ///
    /// It shares no in-process gate with this fixture, which is how a
    /// restart or another process sees the files.
    ///
    /// # Panics
    ///
    /// Panics for memory fixtures.
    #[must_use]
    pub fn reopen(&self) -> Client {
        assert!(self.dir().is_some(), "memory fixtures cannot be reopened");
        Client::with_config(self.config.clone())
    }

    /// Opens database `name`.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be opened.
    pub async fn db(&self, name: &str) -> Database {
        self.client
            .database(name)
            .await
            .expect("Failed to open database")
    }

    /// Opens collection `collection` of database `db`.
    ///
    /// # Panics
    ///
    /// Panics if the database or collection cannot be opened.
    pub async fn collection(&self, db: &str, collection: &str) -> Collection {
        self.db(db)
            .await
            .collection(collection)
            .await
            .expect("Failed to open collection")
    }

    /// Reads the raw text of database `name` from disk.
    ///
    /// # Panics
    ///
    /// Panics for memory fixtures or if the file cannot be read.
    #[must_use]
    pub fn read_file(&self, name: &str) -> String {
        let path = self.file_path(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("Failed to read {}: {err}", path.display()))
    }

    /// Returns the path of database `name`.
    ///
    /// # Panics
    ///
    /// Panics for memory fixtures.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        let dir = self.dir().expect("memory fixtures have no files");
        dir.join(self.config.file_name(name))
    }
}

impl Deref for TestClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.client
    }
}

/// Generates `doc-1`, `doc-2`, ... in order.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator starting at `doc-1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many ids have been handed out.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> DocumentId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        DocumentId::from(format!("doc-{n}"))
    }
}

/// Fixed starting point for deterministic clocks: 2024-01-01T00:00:00Z.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Deterministic clock and id sources wired into a configuration.
#[derive(Debug, Clone)]
pub struct Deterministic {
    /// The shared clock, frozen at [`epoch`] until moved.
    pub clock: Arc<ManualClock>,
    /// The shared id generator.
    pub ids: Arc<SequentialIds>,
}

impl Deterministic {
    /// Creates a fresh clock and id generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(ManualClock::new(epoch())),
            ids: Arc::new(SequentialIds::new()),
        }
    }

    /// Installs the clock and generator into `config`.
    #[must_use]
    pub fn apply(&self, config: Config) -> Config {
        config
            .clock(self.clock.clone())
            .id_generator(self.ids.clone())
    }
}

impl Default for Deterministic {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a `tracing` subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Common test scenarios.
pub mod scenarios {
    use jadb_core::{json, Collection, Document, Value};

    /// Builds `count` user objects named `user-0`.. with alternating roles.
    #[must_use]
    pub fn users(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| {
                json!({
                    "name": format!("user-{i}"),
                    "age": 20 + i,
                    "role": if i % 2 == 0 { "admin" } else { "member" },
                })
            })
            .collect()
    }

    /// Fills `collection` with [`users`] in one write.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn populate_users(collection: &Collection, count: usize) -> Vec<Document> {
        collection
            .insert_many(users(count))
            .await
            .expect("Failed to insert users")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jadb_core::{json, Query};

    #[tokio::test]
    async fn file_fixture_writes_into_temp_dir() {
        let store = TestClient::file();
        let users = store.collection("app", "users").await;
        users.insert_one(json!({"name": "a"})).await.unwrap();

        assert!(store.file_path("app").exists());
        assert!(store.read_file("app").contains("\"users\""));
    }

    #[tokio::test]
    async fn memory_fixture_has_no_dir() {
        let store = TestClient::memory();
        assert!(store.dir().is_none());
        let users = store.collection("app", "users").await;
        assert_eq!(users.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn temp_dir_is_removed_on_drop() {
        let dir = {
            let store = TestClient::file();
            store.db("app").await;
            store.dir().unwrap().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn deterministic_sources() {
        let det = Deterministic::new();
        let store = TestClient::memory_with(|config| det.apply(config));
        let users = store.collection("app", "users").await;

        let docs = scenarios::populate_users(&users, 3).await;
        let ids: Vec<_> = docs.iter().map(|doc| doc.id().as_str().to_owned()).collect();
        assert_eq!(ids, vec!["doc-1", "doc-2", "doc-3"]);
        assert_eq!(det.ids.issued(), 3);
        assert!(docs.iter().all(|doc| doc.created_at() == epoch()));
    }

    #[tokio::test]
    async fn reopen_sees_written_data() {
        let store = TestClient::file();
        let users = store.collection("app", "users").await;
        scenarios::populate_users(&users, 4).await;

        let other = store.reopen();
        let admins = other
            .database("app")
            .await
            .unwrap()
            .collection("users")
            .await
            .unwrap()
            .find(Some(&Query::new().eq("role", "admin")))
            .await
            .unwrap();
        assert_eq!(admins.len(), 2);
    }

    #[test]
    fn scenario_users_shape() {
        let users = scenarios::users(2);
        assert_eq!(users[0]["role"], "admin");
        assert_eq!(users[1]["name"], "user-1");
    }
}
