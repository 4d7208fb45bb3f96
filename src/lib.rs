//! # dissemination
//!
//! Resolves article identifiers to the stored object that best represents the
//! requested artifact, or to the condition explaining why there is none.
//!
//! ## Storage model
//!
//! Every article lives across three tiers of an object store:
//! - **current** (`ftp/`) - the latest version's descriptor, rendition and source
//! - **archive** (`orig/`) - all earlier versions, each suffixed `vN`
//! - **cache** (`ps_cache/`) - renditions produced on demand
//!
//! Resolution only reads: it never writes, renders, or caches anything itself.
//! The object store sits behind the [`ObjectStore`] trait, so the same resolver
//! runs over a local directory, memory, or an application-supplied remote backend.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dissemination::{ArticleStore, Config, Format, Identifier, Resolution};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         storage_prefix: "/data/arxiv".to_string(),
//!         ..Default::default()
//!     };
//!     let store = dissemination::object_store::from_config(&config)?;
//!     let articles = ArticleStore::with_config(Arc::new(store), &config);
//!
//!     let id: Identifier = "0704.0001v2".parse()?;
//!     match articles.dissemination_for_id(Format::Pdf, &id).await? {
//!         Resolution::Found(obj) => println!("serve {obj}"),
//!         Resolution::Condition(condition) => println!("cannot serve: {condition}"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Tier resolution of descriptors and renditions
pub mod article_store;
/// Configuration types
pub mod config;
/// Descriptor (`.abs`) parsing
pub mod descriptor;
/// Error types
pub mod error;
/// Dissemination formats, source flags and ancillary files
pub mod formats;
/// Article identifier parsing
pub mod identifier;
/// Storage key layout
pub mod key_patterns;
/// Object store abstraction and backends
pub mod object_store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use article_store::{ArticleStore, DescriptorLookup};
pub use config::{Config, TierConfig};
pub use descriptor::{Descriptor, VersionEntry};
pub use error::{DescriptorError, Error, Result, ToHttpStatus};
pub use formats::{AncillaryFile, SourceFlag};
pub use identifier::Identifier;
pub use key_patterns::KeyPatterns;
pub use object_store::{FileObj, LocalObjectStore, MemoryObjectStore, ObjectStore};
pub use types::{Condition, Format, Resolution};
