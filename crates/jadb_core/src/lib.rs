//! # JADB Core
//!
//! Embedded JSON document store.
//!
//! A [`Client`] maps database names to files in a storage directory. A
//! [`Database`] exposes named collections, and a [`Collection`] holds an
//! ordered array of JSON documents queried by exact field matches.
//!
//! This crate provides:
//! - The document model (`id`, `createdAt`, `updatedAt` plus open fields)
//! - Exact-match [`Query`] filtering
//! - The collection engine: every call loads the database file, changes
//!   one collection and writes the whole file back atomically
//! - Typed collections over serde types
//!
//! ## Concurrency
//!
//! Handles obtained from one [`Client`] share a per-file gate, so their
//! operations are serialized. Nothing coordinates separate clients or
//! processes: concurrent writers to the same file lose updates.
//!
//! ## Example
//!
//! ```rust
//! use jadb_core::{Client, Query};
//! use serde_json::json;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let client = Client::in_memory();
//! let users = client.database("app").await?.collection("users").await?;
//!
//! users.insert_one(json!({"name": "a"})).await?;
//! users.insert_one(json!({"name": "b"})).await?;
//!
//! users.update_one(&Query::new().eq("name", "a"), json!({"name": "c"})).await?;
//! users.delete_one(&Query::new().eq("name", "b")).await?;
//!
//! let all = users.find(None).await?;
//! assert_eq!(all.len(), 1);
//! assert_eq!(all[0].field("name"), Some(&json!("c")));
//! # Ok::<(), jadb_core::CoreError>(())
//! # }).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod clock;
mod collection;
mod config;
mod database;
mod document;
mod error;
mod file;
mod id;
mod query;
mod store;

pub use client::Client;
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{Collection, TypedCollection};
pub use config::Config;
pub use database::Database;
pub use document::{
    is_reserved, timestamp, Document, Fields, Record, CREATED_AT_FIELD, ID_FIELD,
    RESERVED_FIELDS, UPDATED_AT_FIELD,
};
pub use error::{CoreError, CoreResult};
pub use file::DatabaseFile;
pub use id::{DocumentId, IdGenerator, UuidGenerator};
pub use query::{strict_eq, Query};

/// Re-exported so callers can build values and patches without a direct
/// `serde_json` dependency.
pub use serde_json::{json, Value};
