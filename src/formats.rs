use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

/// One catalog row for a single offered section.
///
/// Every field but `name` is optional. A cell that was blank on the page is
/// `None`, never `Some("")`. Labels with no dedicated field land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionRow {
    pub name: String,
    pub topic: Option<String>,
    pub enrl: Option<String>,
    pub det: Option<String>,
    pub classnr: Option<String>,
    pub sect: Option<String>,
    pub begindateenddate: Option<String>,
    pub days: Option<String>,
    pub time: Option<String>,
    pub room: Option<String>,
    pub instructor: Option<String>,
    pub comp: Option<String>,
    pub stat: Option<String>,
    pub enrltot: Option<String>,
    pub sess: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Option<String>>,
}

impl SectionRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Assigns a normalized column key. A repeated key overwrites the earlier value.
    pub fn set_field(&mut self, key: &str, value: Option<String>) {
        let slot = match key {
            "enrl" => &mut self.enrl,
            "det" => &mut self.det,
            "classnr" => &mut self.classnr,
            "sect" => &mut self.sect,
            "begindateenddate" => &mut self.begindateenddate,
            "days" => &mut self.days,
            "time" => &mut self.time,
            "room" => &mut self.room,
            "instructor" => &mut self.instructor,
            "comp" => &mut self.comp,
            "stat" => &mut self.stat,
            "enrltot" => &mut self.enrltot,
            "sess" => &mut self.sess,
            _ => {
                self.extra.insert(key.to_owned(), value);
                return;
            }
        };
        *slot = value;
    }

    /// The only mutation allowed after a row is appended to a [`CourseGroup`]:
    /// a topic row below a section rewrites that section's topic.
    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = Some(topic.into());
    }

    pub fn fields(&self) -> Vec<(String, Option<String>)> {
        let mut fields = vec![
            ("name".to_owned(), Some(self.name.clone())),
            ("topic".to_owned(), self.topic.clone()),
            ("enrl".to_owned(), self.enrl.clone()),
            ("det".to_owned(), self.det.clone()),
            ("classnr".to_owned(), self.classnr.clone()),
            ("sect".to_owned(), self.sect.clone()),
            ("begindateenddate".to_owned(), self.begindateenddate.clone()),
            ("days".to_owned(), self.days.clone()),
            ("time".to_owned(), self.time.clone()),
            ("room".to_owned(), self.room.clone()),
            ("instructor".to_owned(), self.instructor.clone()),
            ("comp".to_owned(), self.comp.clone()),
            ("stat".to_owned(), self.stat.clone()),
            ("enrltot".to_owned(), self.enrltot.clone()),
            ("sess".to_owned(), self.sess.clone()),
        ];
        fields.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }

    pub fn display_name(&self) -> String {
        match self.topic.as_deref() {
            Some(topic) => format!("{} - {topic}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Course name to its sections, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CourseGroup(IndexMap<String, Vec<SectionRow>>);

impl CourseGroup {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, course: &str) -> Option<&[SectionRow]> {
        self.0.get(course).map(Vec::as_slice)
    }

    pub fn courses(&self) -> impl Iterator<Item = (&str, &[SectionRow])> {
        self.0
            .iter()
            .map(|(name, sections)| (name.as_str(), sections.as_slice()))
    }

    pub fn sections(&self) -> impl Iterator<Item = &SectionRow> {
        self.0.values().flatten()
    }

    pub(crate) fn push_section(&mut self, section: SectionRow) {
        self.0
            .entry(section.name.clone())
            .or_default()
            .push(section);
    }

    pub(crate) fn last_section_mut(&mut self, course: &str) -> Option<&mut SectionRow> {
        self.0.get_mut(course).and_then(|sections| sections.last_mut())
    }
}

/// Per-class facts from the class detail page. Absent labels stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailRecord {
    pub session: Option<String>,
    pub consent: Option<String>,
    pub component: Option<String>,
    pub status: Option<String>,
    pub credits: Option<String>,
    pub enrollment: Option<String>,
    pub lastdaytoadd: Option<String>,
    pub lastdaytodrop: Option<String>,
    pub lastdaytowithdraw: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Option<String>>,
}

impl DetailRecord {
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut record = Self::default();
        for (key, value) in fields {
            let slot = match key.as_str() {
                "session" => &mut record.session,
                "consent" => &mut record.consent,
                "component" => &mut record.component,
                "status" => &mut record.status,
                "credits" => &mut record.credits,
                "enrollment" => &mut record.enrollment,
                "lastdaytoadd" => &mut record.lastdaytoadd,
                "lastdaytodrop" => &mut record.lastdaytodrop,
                "lastdaytowithdraw" => &mut record.lastdaytowithdraw,
                "description" => &mut record.description,
                _ => {
                    record.extra.insert(key, Some(value));
                    continue;
                }
            };
            *slot = Some(value);
        }
        record
    }

    pub fn fields(&self) -> Vec<(String, Option<String>)> {
        let mut fields = vec![
            ("session".to_owned(), self.session.clone()),
            ("consent".to_owned(), self.consent.clone()),
            ("component".to_owned(), self.component.clone()),
            ("status".to_owned(), self.status.clone()),
            ("credits".to_owned(), self.credits.clone()),
            ("enrollment".to_owned(), self.enrollment.clone()),
            ("lastdaytoadd".to_owned(), self.lastdaytoadd.clone()),
            ("lastdaytodrop".to_owned(), self.lastdaytodrop.clone()),
            ("lastdaytowithdraw".to_owned(), self.lastdaytowithdraw.clone()),
            ("description".to_owned(), self.description.clone()),
        ];
        fields.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }
}

/// A section joined with its detail record. Built by [`crate::assemble::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeCourse {
    pub(crate) section: SectionRow,
    pub(crate) detail: DetailRecord,
}

impl CompositeCourse {
    pub fn section(&self) -> &SectionRow {
        &self.section
    }

    pub fn detail(&self) -> &DetailRecord {
        &self.detail
    }

    /// Union of both field sets; a detail field wins over a section field of the same key.
    pub fn fields(&self) -> IndexMap<String, Option<String>> {
        let mut fields: IndexMap<String, Option<String>> =
            self.section.fields().into_iter().collect();
        fields.extend(self.detail.fields());
        fields
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.fields().get(key).cloned().flatten()
    }
}

impl Serialize for CompositeCourse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields().serialize(serializer)
    }
}
