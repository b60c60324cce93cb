//! Extraction of participant results from detail pages
//!
//! - `units`: pace and elapsed-time text to numbers
//! - `record`: the emitted record types
//! - `detail`: selector-driven detail page extraction

mod detail;
mod record;
mod units;

pub use detail::DetailExtractor;
pub use record::{ParticipantRecord, SplitEntry};
pub use units::{parse_elapsed, parse_pace};
