use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Time and pace recorded at one checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitEntry {
    /// Elapsed time since start, in seconds
    pub time: Option<u64>,

    /// Pace over the preceding section, in minutes per kilometre
    pub pace: Option<f64>,
}

/// One participant's result as extracted from a detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub bib_number: Option<String>,
    pub age_class: Option<String>,
    pub start_group: Option<String>,

    /// Checkpoint label to split; never empty on an emitted record
    pub splits: BTreeMap<String, SplitEntry>,
}

impl ParticipantRecord {
    /// Number of checkpoints recorded
    pub fn split_count(&self) -> usize {
        self.splits.len()
    }
}
