#![forbid(unsafe_code)]
//! clusterjoin-mem: hard memory budgeting for chunk tables.
//!
//! This crate provides the concrete implementation of the *interfaces* defined
//! in `clusterjoin-core::budget`. Every chunk table and merged batch the
//! executor materializes is accounted here with an RAII guard, so the bytes
//! are returned as soon as the table is dropped.

pub mod error;
pub mod guard;
pub mod tracking;

pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};
pub use tracking::PeakTracker;
