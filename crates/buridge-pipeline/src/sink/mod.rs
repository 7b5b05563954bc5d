//! Destination store sinks
//!
//! One module per backend. The object store takes the raw downloaded file
//! whole; the table and document sinks implement [`BatchSink`](crate::batch::BatchSink)
//! and receive decoded records in bounded batches.

pub mod document;
pub mod object;
pub mod table;

pub use document::DocumentSink;
pub use object::ObjectStore;
pub use table::TableSink;
