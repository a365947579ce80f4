#![forbid(unsafe_code)]
//! clusterjoin-operators: operators evaluated on one chunk pair at a time.
//!
//! Design intent:
//! - Pure and synchronous; inputs are fully materialized `RowBatch`es.
//! - Each operator exposes a `Footprint` model so the executor can account
//!   its working memory.

pub mod join;
pub mod plan;
pub mod traits;

pub use join::hash::{HashJoin, JoinOutput, PairIndex};
pub use plan::Footprint;
pub use traits::{OpError, Operator};
