use crate::formats::{CompositeCourse, DetailRecord, SectionRow};

/// Joins a section with the detail record fetched for its class number.
///
/// Pairing is the caller's job; nothing here checks that the two belong together.
pub fn merge(section: SectionRow, detail: DetailRecord) -> CompositeCourse {
    CompositeCourse { section, detail }
}
