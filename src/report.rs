use std::io::{self, Write};

use anyhow::Context as _;
use serde::Serialize;

use crate::formats::{CompositeCourse, CourseGroup, SectionRow};

type Column = (&'static str, fn(&SectionRow) -> String);

const SECTION_COLUMNS: [Column; 6] = [
    ("Days", |s| s.days.clone().unwrap_or_default()),
    ("Name", |s| s.display_name()),
    ("Time", |s| s.time.clone().unwrap_or_default()),
    ("Enrolled", |s| s.enrltot.clone().unwrap_or_default()),
    ("ClassNr", |s| s.classnr.clone().unwrap_or_default()),
    ("Section", |s| s.sect.clone().unwrap_or_default()),
];

pub fn write_heading(out: &mut impl Write, heading: &str) -> io::Result<()> {
    writeln!(out, "\n# {heading}\n")
}

/// One padded row per section; prints nothing for an empty group.
pub fn write_sections(out: &mut impl Write, group: &CourseGroup) -> io::Result<()> {
    let rows: Vec<Vec<String>> = group
        .sections()
        .map(|section| SECTION_COLUMNS.iter().map(|(_, cell)| cell(section)).collect())
        .collect();
    if rows.is_empty() {
        return Ok(());
    }

    let widths: Vec<usize> = SECTION_COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, (title, _))| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .chain([title.len()])
                .max()
                .unwrap_or_default()
        })
        .collect();

    let titles: Vec<String> = SECTION_COLUMNS.iter().map(|(t, _)| (*t).to_owned()).collect();
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    for row in [&titles, &rules].into_iter().chain(&rows) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

pub fn write_course(out: &mut impl Write, course: &CompositeCourse) -> io::Result<()> {
    writeln!(out, "{}", course.section().display_name())?;
    for (key, value) in course.fields() {
        if let Some(value) = value {
            writeln!(out, "  {key}: {value}")?;
        }
    }
    writeln!(out)
}

pub fn write_json_lines<'a, T, I>(out: &mut impl Write, records: I) -> anyhow::Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for record in records {
        serde_json::to_writer(&mut *out, record).context("serialize record json")?;
        out.write_all(b"\n").context("write record newline")?;
    }
    out.flush().context("flush output")?;
    Ok(())
}
