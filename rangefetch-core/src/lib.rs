//! Batched range reads on top of a single-step sorted cursor.
//!
//! [`bounded_fetch`] turns a [`Cursor`] into page-at-a-time retrieval with
//! prefix, exclusive end and count filters, and leaves the cursor on the
//! first key it did not take so the next call resumes there.
//! [`multi_range_search`] runs many independent [`RangeSpec`]s against one
//! shared cursor and returns one [`ResultPage`] per spec.

#[macro_use]
mod errors;
mod batch;
mod config;
mod cursor;
mod fetch;
mod page;
mod search;
mod store;

pub use batch::WriteBatch;
pub use config::{ErrorPolicy, FetchConfig, MAX_PAGE_SIZE};
pub use cursor::Cursor;
pub use errors::{Error, Result};
pub use fetch::{bounded_fetch, CursorExt, Direction, KeyFilter};
pub use page::{Iter, ResultPage, DEFAULT_PAGE_SIZE};
pub use search::{multi_range_search, PageSet, RangeSpec};
pub use store::{MemCursor, MemStore};
