use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::envelope::{Envelope, NO_CLASSES_FOUND};
use crate::error::ExtractError;
use crate::formats::{CourseGroup, SectionRow};
use crate::normalize::field_key;

const TOPIC_MARKER: &str = "Topic: ";
const FILLER_ROW_LEN: usize = 3;

static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector: tr"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector: td"));

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Session value given to every section whose table has no `Sess` column.
    pub session_default: Option<String>,
}

pub fn extract_search(raw: &str) -> Result<CourseGroup, ExtractError> {
    extract_search_with(raw, &SearchOptions::default())
}

pub fn extract_search_with(
    raw: &str,
    options: &SearchOptions,
) -> Result<CourseGroup, ExtractError> {
    let envelope = Envelope::parse(raw)?;

    if let Some(code) = envelope.error_code() {
        if code == NO_CLASSES_FOUND {
            tracing::warn!("no classes found");
            return Ok(CourseGroup::default());
        }
        return Err(envelope.upstream_error(code));
    }

    let rows = table_rows(envelope.fragment("ClassList")?)?;
    extract_rows(&rows, options)
}

/// Cell texts of every row of the fragment's outer `<table>`.
pub fn table_rows(html: &str) -> Result<Vec<Vec<String>>, ExtractError> {
    let fragment = Html::parse_fragment(html);
    let table = outer_element(&fragment)
        .ok_or_else(|| ExtractError::drift("search fragment has no element"))?;

    let tag = table.value().name();
    if tag != "table" {
        return Err(ExtractError::drift(format!("expected table tag, got: {tag}")));
    }

    Ok(table
        .select(&ROW)
        .map(|tr| tr.select(&CELL).map(cell_text).collect())
        .collect())
}

pub(crate) fn outer_element(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment.root_element().children().find_map(ElementRef::wrap)
}

pub(crate) fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_owned()
}

/// Runs the row classifier over a header row followed by body rows.
pub fn extract_rows(
    rows: &[Vec<String>],
    options: &SearchOptions,
) -> Result<CourseGroup, ExtractError> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| ExtractError::drift("search table has no header row"))?;

    let mut builder = GroupBuilder {
        keys: header.iter().map(|label| field_key(label)).collect(),
        options,
        current: None,
        group: CourseGroup::default(),
    };
    for row in body {
        builder.push(row)?;
    }
    Ok(builder.group)
}

enum RowShape<'a> {
    Title(&'a str),
    Section(&'a [String]),
    Topic(&'a str),
    Filler,
}

fn classify<'a>(row: &'a [String], header_len: usize) -> Result<RowShape<'a>, ExtractError> {
    if let [title] = row {
        return Ok(RowShape::Title(title));
    }
    if row.len() == header_len {
        return Ok(RowShape::Section(row));
    }
    if let [first, second] = row
        && first.is_empty()
        && let Some(topic) = second.strip_prefix(TOPIC_MARKER)
    {
        return Ok(RowShape::Topic(topic));
    }
    if row.len() == FILLER_ROW_LEN && row.iter().all(String::is_empty) {
        return Ok(RowShape::Filler);
    }
    Err(ExtractError::drift(format!("unexpected row: {row:?}")))
}

struct GroupBuilder<'o> {
    keys: Vec<String>,
    options: &'o SearchOptions,
    current: Option<String>,
    group: CourseGroup,
}

impl GroupBuilder<'_> {
    fn push(&mut self, row: &[String]) -> Result<(), ExtractError> {
        match classify(row, self.keys.len())? {
            RowShape::Title(title) => {
                self.current = Some(title.to_owned());
            }
            RowShape::Section(cells) => {
                let name = self
                    .current
                    .as_deref()
                    .ok_or_else(|| ExtractError::drift("found section before course name"))?;

                let mut section = SectionRow::new(name);
                section.sess = self.options.session_default.clone();
                for (key, value) in self.keys.iter().zip(cells) {
                    if key.is_empty() {
                        continue;
                    }
                    let value = (!value.is_empty()).then(|| value.clone());
                    section.set_field(key, value);
                }
                self.group.push_section(section);
            }
            RowShape::Topic(topic) => {
                let name = self
                    .current
                    .as_deref()
                    .ok_or_else(|| ExtractError::drift("found topic before course name"))?;
                let section = self.group.last_section_mut(name).ok_or_else(|| {
                    ExtractError::drift(format!("found topic before any section of {name}"))
                })?;
                section.set_topic(topic);
            }
            RowShape::Filler => {}
        }
        Ok(())
    }
}
