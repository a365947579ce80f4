//! clusterjoin: out-of-core single-key join of two delimited-text files.
//!
//! The work happens in the member crates; this facade re-exports the pieces
//! a caller needs to prepare and run a join.

pub use clusterjoin_core::config::JoinConfig;
pub use clusterjoin_core::join::{JoinSpec, JoinType};
pub use clusterjoin_core::manifest::{RunManifest, RunStats};
pub use clusterjoin_exec::{DatasetProfile, Engine, ExecError, PreparedJoin};
pub use clusterjoin_io::CsvWriter;
