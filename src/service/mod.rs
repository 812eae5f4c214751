//! Service layer
//!
//! Business rules on top of the data layer. The quote store is the only
//! writer of the collection.

mod quotes;

pub use quotes::{QuoteStore, Snapshot, SnapshotStream};
