//! Client configuration.

use crate::clock::{Clock, SystemClock};
use crate::id::{IdGenerator, UuidGenerator};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a [`crate::Client`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database files. Relative paths resolve
    /// against the current working directory.
    pub root: PathBuf,

    /// Whether to create the directory and database files if they don't exist.
    pub create_if_missing: bool,

    /// Extension of database files: `<root>/<name>.<file_extension>`.
    pub file_extension: String,

    /// Spaces per indentation level in the written JSON.
    pub indent: usize,

    /// Whether to fsync every write before it replaces the file (safer but slower).
    pub sync_on_write: bool,

    /// Time source for document timestamps.
    pub clock: Arc<dyn Clock>,

    /// Identifier source for new documents.
    pub ids: Arc<dyn IdGenerator>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            create_if_missing: true,
            file_extension: "db.json".to_owned(),
            indent: 4,
            sync_on_write: true,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }
}

impl Config {
    /// Creates a configuration storing databases under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets whether to create missing directories and files.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the database file extension (without the leading dot).
    #[must_use]
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Sets the JSON indentation width.
    #[must_use]
    pub fn indent(mut self, spaces: usize) -> Self {
        self.indent = spaces;
        self
    }

    /// Sets whether to fsync on every write.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the identifier source.
    #[must_use]
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Returns the file name used for database `name`.
    #[must_use]
    pub fn file_name(&self, name: &str) -> String {
        if self.file_extension.is_empty() {
            name.to_owned()
        } else {
            format!("{name}.{}", self.file_extension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.sync_on_write);
        assert_eq!(config.indent, 4);
        assert_eq!(config.file_name("app"), "app.db.json");
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new("data")
            .create_if_missing(false)
            .sync_on_write(false)
            .indent(2)
            .file_extension("json");

        assert_eq!(config.root, PathBuf::from("data"));
        assert!(!config.create_if_missing);
        assert!(!config.sync_on_write);
        assert_eq!(config.indent, 2);
        assert_eq!(config.file_name("app"), "app.json");
    }

    #[test]
    fn empty_extension_uses_bare_name() {
        let config = Config::default().file_extension("");
        assert_eq!(config.file_name("app"), "app");
    }
}
