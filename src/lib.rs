//! # Docmap
//!
//! Object-to-document mapping and typed queries for document search engines.
//!
//! ## Features
//!
//! - Serde-driven projection of object graphs into flat, dotted fields
//! - Type envelope recording actual and static types plus a source payload
//! - Typed property paths translated into term, range and conjunction queries
//! - Multi-key sorting and lazy, batched paging with cheap counting
//! - An in-memory reference engine
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use docmap::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Article {
//!     title: String,
//!     views: i64,
//! }
//!
//! let index = ObjectIndex::new(Arc::new(MemoryEngine::new()), IndexConfig::default());
//! index.add(&Article { title: "Hello search".into(), views: 10 }).unwrap();
//! index.add(&Article { title: "Hello world".into(), views: 3 }).unwrap();
//!
//! let views = property::<i64>("views");
//! let popular = index.query::<Article>().filter(views.at_least(5)).unwrap();
//! assert_eq!(popular.count().unwrap(), 1);
//!
//! // Titles are analyzed: terms are matched in their lowercased form.
//! let title = property::<String>("title");
//! let hello = index.query::<Article>().filter(title.term("hello")).unwrap();
//! assert_eq!(hello.count().unwrap(), 2);
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod mapping;
pub mod query;

pub mod prelude {
    pub use crate::config::IndexConfig;
    pub use crate::engine::{MemoryEngine, SearchEngine};
    pub use crate::error::{DocmapError, Result};
    pub use crate::index::ObjectIndex;
    pub use crate::mapping::{DocumentMapper, FieldMapper};
    pub use crate::query::{Expr, TypedQuery, and, object, property};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
