use std::fmt;

/// One upstream request, described by what it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// The search registration page, which carries the term list.
    Terms,
    Subjects {
        term: String,
        acad: String,
    },
    Search {
        term: String,
        subject: String,
        acad: String,
    },
    /// `term` is the term number (`114`), not the full term label.
    Details {
        term: String,
        class_nr: String,
        acad: String,
    },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terms => write!(f, "terms"),
            Self::Subjects { term, acad } => write!(f, "subjects {term} {acad}"),
            Self::Search {
                term,
                subject,
                acad,
            } => write!(f, "search {term} {subject} {acad}"),
            Self::Details {
                term,
                class_nr,
                acad,
            } => write!(f, "details {term} {class_nr} {acad}"),
        }
    }
}

/// Performs the network round trip for a [`Query`].
pub trait Fetcher {
    fn fetch(&mut self, query: &Query) -> anyhow::Result<String>;
}
