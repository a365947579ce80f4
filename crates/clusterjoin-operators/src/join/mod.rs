//! Equal-join primitives.

pub mod hash;
pub mod layout;
