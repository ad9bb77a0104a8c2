//! Core library for rowpool: delimited table read/write and bulk parallel
//! maps over a fixed-size worker pool. Used by the CLI binary; can be
//! reused by other tools.

pub mod error;
pub mod pool;
pub mod table;
pub mod table_write;

// Re-export main API for the CLI and library callers
pub use error::{Error, Result};
pub use pool::{
    parallel_map, parallel_map_failsoft, parallel_map_outcomes, try_parallel_map, PoolConfig,
    WorkerPool,
};
pub use table::{normalize_header, read_table, ReadOptions, Row};
pub use table_write::{write_table, WriteOptions};
