//! Systematic-search progress reported by a scheduler that enumerates its
//! search space (e.g. a CHESS-style controller).

use serde::{Deserialize, Serialize};

/// Persisted search state. Only the fields the campaign engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    /// The scheduler has explored every schedule it intends to.
    #[serde(default)]
    pub done: bool,

    /// Number of runs the scheduler has performed so far.
    #[serde(default)]
    pub num_runs: u64,
}
