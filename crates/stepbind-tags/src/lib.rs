//! stepbind Tag Filters
//!
//! Compiles boolean tag-selection expressions such as
//! `@smoke and not (@slow or @flaky)` into reusable predicates over a
//! scenario's tag set.
//!
//! # Core Concepts
//!
//! - [`TagFilter`]: A compiled expression, evaluated with [`TagFilter::matches`]
//! - [`TagExpr`]: The parsed boolean tree (`not` binds tighter than `and`,
//!   which binds tighter than `or`)
//! - [`TagSet`]: Lowercased set of tags a filter is evaluated against
//! - [`TagFilterCache`]: Write-once cache of compiled filters keyed by the
//!   literal expression
//!
//! # Example
//!
//! ```rust
//! use stepbind_tags::{TagFilter, TagSet};
//!
//! let filter = TagFilter::compile("@included and not @excluded").unwrap();
//!
//! assert!(filter.matches(&TagSet::from_tags(["@Included"])));
//! assert!(!filter.matches(&TagSet::from_tags(["@included", "@excluded"])));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod cache;
mod error;
mod expr;
mod lexer;
mod parser;

// Re-exports
pub use cache::TagFilterCache;
pub use error::TagFilterError;
pub use expr::{TagExpr, TagFilter, TagSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
