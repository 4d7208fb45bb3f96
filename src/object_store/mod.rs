//! Object store access
//!
//! This module provides a trait-based seam between the resolution logic and the
//! byte-blob store that holds descriptors, renditions and sources. Keys are
//! `/`-separated strings; objects are addressed, listed by prefix, and read in
//! full or by byte range.
//!
//! ## Architecture
//!
//! The core abstraction is the [`ObjectStore`] trait. Two implementations are provided:
//!
//! - [`LocalObjectStore`]: keys are paths under a root directory
//! - [`MemoryObjectStore`]: keys live in an in-memory map, for tests and embedding
//!
//! Remote stores (GCS, S3) are supplied by the embedding application by
//! implementing [`ObjectStore`].
//!
//! ## Usage
//!
//! ```no_run
//! use dissemination::object_store::{LocalObjectStore, ObjectStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LocalObjectStore::new("./testing/data");
//! for obj in store.list("ftp/arxiv/papers/0704/0704.0001").await? {
//!     println!("{} ({:?} bytes)", obj.name(), obj.size());
//! }
//! # Ok(())
//! # }
//! ```

mod local;
mod memory;
mod traits;

pub use local::{LocalObjectStore, from_config};
pub use memory::MemoryObjectStore;
pub use traits::{FileObj, ObjectReader, ObjectStore};
