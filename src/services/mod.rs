//! Service layer for Waymark.
//!
//! Contains the business logic on top of the record store:
//! - TagResolver (find-or-create of user tags)
//! - Import (bulk-import pipeline for saved-places exports)
//! - Search (filtered place search with a parameterized query builder)
//!
//! Services hold an injected `DbPool`; their lifecycle is owned by the
//! surrounding application, not by this crate.

mod import;
mod search;
mod tags;

pub use import::{
    BufferedRowSource, ImportReport, ImportService, RawRow, RowError, RowOutcome, RowSource,
};
pub use search::{CollectionScope, PlaceFilterQueryBuilder, SearchFilters, SearchService};
pub use tags::TagResolver;
