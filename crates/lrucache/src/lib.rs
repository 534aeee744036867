//! # lrucache
//!
//! Bounded in-process cache with least-recently-promoted eviction.
//!
//! ## Architecture
//! - **Hash index**: `IndexMap` with AHash for O(1) keyed access and a stable
//!   positional order
//! - **Recency sequence**: arena-backed doubly-linked list for O(1) promotion
//!   and eviction
//! - **Last-accessed slot**: short-circuits repeated access to the same key
//! - **Statistics**: optional hit/miss sink shared through `Arc`
//!
//! Two views walk the same entries: hash-index order ([`LruCache::iter`],
//! [`UnorderedPosition`]) and recency order, oldest first
//! ([`LruCache::ordered_iter`], [`OrderedPosition`]).
//!
//! Insertion promotes; lookups do not.
//!
//! ```rust
//! use lrucache::LruCache;
//!
//! let mut cache = LruCache::new(2);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.insert("c", 3);
//!
//! assert!(!cache.contains("a"));
//! assert_eq!(cache.lookup("c"), Ok(&3));
//! ```

#![warn(missing_docs)]

mod arena;
mod builder;
mod cache;
mod cursor;
mod error;
mod iter;
mod recency;
mod stats;
mod traits;

pub use builder::LruCacheBuilder;
pub use cache::{InsertionResult, LruCache};
pub use cursor::{
    Cursor, OrderedCursor, OrderedCursorMut, OrderedPosition, Position, UnorderedCursor,
    UnorderedCursorMut, UnorderedPosition,
};
pub use error::{Error, InvariantError, Result};
pub use iter::{IntoIter, Iter, IterMut, OrderedIter, OrderedIterMut};
pub use stats::{KeyStatistics, Statistics, StatisticsSnapshot};
pub use traits::Cache;
