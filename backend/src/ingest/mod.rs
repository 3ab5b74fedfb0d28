//! Bulk coupon ingestion.
//!
//! An uploaded CSV flows through four stages, each in its own module:
//!
//! 1. [`pipeline`] pulls rows from the file one at a time, checks the header,
//!    enforces the row limit and the parse deadline.
//! 2. [`validator`] accepts or rejects the code cell of each row.
//! 3. [`dedup`] rejects a code seen earlier in the same file.
//! 4. [`gate`] partitions the accepted codes against storage and bulk-inserts
//!    the new ones.
//!
//! The first failure aborts the whole batch; nothing is persisted unless the
//! file is clean end to end.

pub mod dedup;
pub mod gate;
pub mod pipeline;
pub mod validator;

pub use gate::PersistenceGate;
pub use pipeline::{IngestPipeline, ParsedBatch};
