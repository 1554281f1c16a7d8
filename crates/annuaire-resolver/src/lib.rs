//! Annuaire Duplicate Resolver
//!
//! Decides, for one candidate record, which stored records of the same kind
//! are close enough to be flagged as possible duplicates.
//!
//! A stored record is a close match when the trigram similarity of the
//! primary fields is above the threshold (0.3 by default), **or** when the
//! secondary fields start with the same character. The second arm is loose:
//! a match is only flagged for review, never merged.
//!
//! # Examples
//!
//! ```
//! use annuaire_resolver::{DuplicateResolver, ResolverConfig};
//!
//! let resolver = DuplicateResolver::new(ResolverConfig::default());
//! assert_eq!(resolver.config().similarity_threshold, 0.3);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod resolver;

pub use config::ResolverConfig;
pub use error::ResolverError;
pub use resolver::{DuplicateResolver, MatchCandidate};
