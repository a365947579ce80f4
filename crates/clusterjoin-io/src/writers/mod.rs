//! Streaming writers.

pub mod csv;
