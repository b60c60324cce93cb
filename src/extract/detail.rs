//! Participant detail page extraction
//!
//! Scalar fields and split rows follow different completeness rules: a
//! missing scalar becomes `None`, while a split row missing any of its three
//! cells is dropped entirely. A cell is present when its first direct text
//! node is non-empty, so a whitespace-only cell keeps the row with a null
//! value.

use crate::config::{compile_selector, SelectorConfig};
use crate::extract::record::{ParticipantRecord, SplitEntry};
use crate::extract::units::{parse_elapsed, parse_pace};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Extracts a [`ParticipantRecord`] from a detail page
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    bib_number: Selector,
    age_class: Selector,
    start_group: Selector,
    split_rows: Selector,
    split_location: Selector,
    split_time: Selector,
    split_pace: Selector,
}

impl DetailExtractor {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(DetailExtractor)` - All selectors compiled
    /// * `Err(ConfigError)` - A selector is not valid CSS
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            bib_number: compile_selector("bib-number", &config.bib_number)?,
            age_class: compile_selector("age-class", &config.age_class)?,
            start_group: compile_selector("start-group", &config.start_group)?,
            split_rows: compile_selector("split-rows", &config.split_rows)?,
            split_location: compile_selector("split-location", &config.split_location)?,
            split_time: compile_selector("split-time", &config.split_time)?,
            split_pace: compile_selector("split-pace", &config.split_pace)?,
        })
    }

    /// Parses raw HTML and extracts the participant
    ///
    /// See [`DetailExtractor::extract`].
    pub fn extract_html(&self, html: &str) -> Option<ParticipantRecord> {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    /// Extracts the participant from a parsed detail page
    ///
    /// # Algorithm
    ///
    /// 1. Read bib number, age class and start group; each may be absent
    /// 2. For every split row, read location, time and pace text
    /// 3. Skip rows where any of the three cells has no text
    /// 4. Normalize time and pace; a duplicate location overwrites the earlier row
    /// 5. Return `None` when no row qualified
    ///
    /// The same document always yields the same result.
    pub fn extract(&self, document: &Html) -> Option<ParticipantRecord> {
        let mut record = ParticipantRecord {
            bib_number: scalar_text(document.select(&self.bib_number)),
            age_class: scalar_text(document.select(&self.age_class)),
            start_group: scalar_text(document.select(&self.start_group)),
            ..ParticipantRecord::default()
        };

        for row in document.select(&self.split_rows) {
            let location = first_text(row.select(&self.split_location));
            let time = first_text(row.select(&self.split_time));
            let pace = first_text(row.select(&self.split_pace));

            let (Some(location), Some(time), Some(pace)) = (location, time, pace) else {
                tracing::trace!("Skipping incomplete split row");
                continue;
            };

            let entry = SplitEntry {
                time: parse_elapsed(time.trim()),
                pace: parse_pace(pace.trim()),
            };

            let location = location.trim().to_string();
            if record.splits.insert(location.clone(), entry).is_some() {
                tracing::debug!("Split location '{}' repeated, keeping the later row", location);
            }
        }

        if record.splits.is_empty() {
            tracing::debug!(
                "Detail page for bib {:?} has no complete split rows",
                record.bib_number
            );
            return None;
        }

        Some(record)
    }
}

/// Returns the first non-empty text node directly inside the given elements
///
/// The text is returned untrimmed. Text of nested child elements is not
/// considered, so `<td class="time"><span>*</span></td>` has no text and
/// `<td class="time">\n<span>*</span>01:00:00</td>` yields only the newline.
fn first_text<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    elements
        .flat_map(|element| element.children())
        .filter_map(|child| child.value().as_text().map(|text| text.to_string()))
        .find(|text| !text.is_empty())
}

/// [`first_text`] trimmed; blank text counts as missing
fn scalar_text<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    first_text(elements)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
