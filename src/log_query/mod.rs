//! log_query: filtering core for exploring JSON objective logs.
//!
//! Purpose
//! -------
//! Read the one-record-per-line logs produced by
//! [`JsonLogOutput`](crate::learning::JsonLogOutput) and select entries with
//! a small query grammar, the way a log-exploration service would.
//!
//! Key behaviors
//! -------------
//! - [`parse_query`] turns query `(key, value)` pairs into per-field
//!   [`DataFilter`]s.
//! - [`read_log_entries`] decodes lines, counts lines per partition
//!   (`partition_iterations`) and keeps entries that pass every filter.
//!
//! Conventions
//! -----------
//! - `partition_index`, `objective` and `partition_iterations` are always
//!   filterable; any other field must be a float or int parameter of the
//!   entry.
pub mod errors;
pub mod filter;
pub mod reader;

pub use self::errors::{QueryError, QueryResult};
pub use self::filter::{DataFilter, ValueLimit, parse_query};
pub use self::reader::{JsonLogEntry, QueryLogEntry, read_log_entries, read_log_file};
