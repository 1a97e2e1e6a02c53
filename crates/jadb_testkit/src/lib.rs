//! # JADB Testkit
//!
//! Test utilities for JADB.
//!
//! This crate provides:
//! - Test fixtures: clients over temporary directories or memory
//! - Deterministic clocks and identifiers
//! - Property-based test generators using proptest
//! - Cross-crate scenario tests
//!
//! ## Usage
//!
//! ```rust
//! use jadb_testkit::prelude::*;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = TestClient::file();
//! let users = store.collection("app", "users").await;
//! users.insert_one(serde_json::json!({"name": "a"})).await.unwrap();
//! assert!(store.database_path("app").unwrap().exists());
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
