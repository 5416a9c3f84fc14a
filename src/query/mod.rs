//! Query cache, key builders, and deleted-entity tracking.
//!
//! All screen reads go through [`QueryCache`], keyed by structural
//! [`QueryKey`]s built in [`keys`]. [`DeletedTracker`] disables reads
//! for inscriptions deleted optimistically on the client.

pub mod cache;
pub mod deleted;
pub mod key;
pub mod keys;

pub use cache::{FetchFn, QueryCache, QueryError, QueryOptions, QueryStatus};
pub use deleted::{DeletedChange, DeletedTracker};
pub use key::QueryKey;
