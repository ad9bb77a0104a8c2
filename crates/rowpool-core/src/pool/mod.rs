//! Fixed-size worker pool and bulk parallel map helpers.
//!
//! The pool owns its worker threads, work queue, and shutdown/join
//! routine; the map helpers drive one pool per call and restore input
//! order before returning.

mod map;
mod worker;

pub use map::{
    parallel_map, parallel_map_failsoft, parallel_map_outcomes, try_parallel_map, PoolConfig,
};
pub use worker::WorkerPool;
