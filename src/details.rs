use std::sync::LazyLock;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};

use crate::envelope::Envelope;
use crate::error::ExtractError;
use crate::formats::DetailRecord;
use crate::normalize::field_key;
use crate::search::{cell_text, outer_element};

const DESCRIPTION_LABEL: &str = "Course Description:";

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector: table"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector: td"));

pub fn extract_details(raw: &str) -> Result<DetailRecord, ExtractError> {
    let envelope = Envelope::parse(raw)?;
    if let Some(code) = envelope.error_code() {
        return Err(envelope.upstream_error(code));
    }

    extract_fragment(envelope.fragment("ClassDetails")?)
}

/// Scans a class detail `<div>` for `Label:` / value cell pairs and the course description.
pub fn extract_fragment(html: &str) -> Result<DetailRecord, ExtractError> {
    let fragment = Html::parse_fragment(html);
    let div = outer_element(&fragment)
        .ok_or_else(|| ExtractError::malformed("detail fragment has no element"))?;

    let tag = div.value().name();
    if tag != "div" {
        return Err(ExtractError::malformed(format!("expected div tag, got: {tag}")));
    }

    let content = div
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .and_then(|table| table.select(&CELL).next())
        .ok_or_else(|| ExtractError::drift("detail fragment has no content cell"))?;
    let summary = content
        .select(&TABLE)
        .next()
        .ok_or_else(|| ExtractError::drift("detail fragment has no summary table"))?;

    let mut props: IndexMap<String, String> = IndexMap::new();

    let cells: Vec<String> = summary.select(&CELL).map(cell_text).collect();
    for pair in cells.windows(2) {
        if let Some(label) = pair[0].strip_suffix(':') {
            props.insert(label.to_owned(), pair[1].clone());
        }
    }

    for table in content.select(&TABLE) {
        for cell in table.select(&CELL) {
            let mut runs = cell.text().map(str::trim).filter(|run| !run.is_empty());
            if runs.next() == Some(DESCRIPTION_LABEL)
                && let Some(description) = runs.next()
            {
                props.insert("Description".to_owned(), description.to_owned());
            }
        }
    }

    Ok(DetailRecord::from_fields(
        props
            .into_iter()
            .map(|(label, value)| (field_key(&label), value)),
    ))
}
