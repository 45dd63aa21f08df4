use std::io::Write as _;

use anyhow::Context as _;
use serde::Serialize;

use crate::assemble::merge;
use crate::campusnet::{CampusNet, Credentials};
use crate::cli::{ConnectionArgs, SearchArgs, SubjectsArgs};
use crate::details::extract_details;
use crate::envelope::parse_subjects;
use crate::formats::{CompositeCourse, CourseGroup, SectionRow};
use crate::query::{Fetcher, Query};
use crate::report;
use crate::response_cache::{CacheStore, LocalFsCacheStore, ResponseCache, cache_key_for};
use crate::search::{SearchOptions, extract_search_with};
use crate::terms::{parse_terms, select_terms, term_number};

/// Sequential driver: every upstream response goes through the cache, then an extractor.
pub struct Catalog<F, S = LocalFsCacheStore> {
    fetcher: F,
    cache: ResponseCache<S>,
    acad: String,
    options: SearchOptions,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub term: String,
    pub subject: String,
    pub group: CourseGroup,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionRecord<'a> {
    pub term: &'a str,
    pub subject: &'a str,
    #[serde(flatten)]
    pub section: &'a SectionRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedCourse {
    pub term: String,
    pub subject: String,
    #[serde(flatten)]
    pub course: CompositeCourse,
}

/// A section skipped during enrichment because it has no class number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingClassNumber {
    pub term: String,
    pub subject: String,
    pub course: String,
}

#[derive(Debug, Default)]
pub struct Enrichment {
    pub courses: Vec<EnrichedCourse>,
    pub warnings: Vec<MissingClassNumber>,
}

impl<F: Fetcher, S: CacheStore> Catalog<F, S> {
    pub fn new(fetcher: F, cache: ResponseCache<S>, acad: impl Into<String>) -> Self {
        Self {
            fetcher,
            cache,
            acad: acad.into(),
            options: SearchOptions::default(),
        }
    }

    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    fn cached(&mut self, query: Query) -> anyhow::Result<String> {
        let key = cache_key_for(&query);
        let fetcher = &mut self.fetcher;
        self.cache.get_or_fetch(&key, || fetcher.fetch(&query))
    }

    /// Cached lookup that stores a fetched response only once `parse` accepts it.
    fn cached_parsed<T>(
        &mut self,
        query: Query,
        parse: impl FnOnce(&str) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let key = cache_key_for(&query);
        let fetcher = &mut self.fetcher;
        self.cache.get_or_fetch_with(&key, || fetcher.fetch(&query), parse)
    }

    pub fn terms(&mut self) -> anyhow::Result<Vec<String>> {
        let page = self.cached(Query::Terms)?;
        parse_terms(&page)
    }

    pub fn subjects(&mut self, term: &str) -> anyhow::Result<Vec<String>> {
        let query = Query::Subjects {
            term: term.to_owned(),
            acad: self.acad.clone(),
        };
        let raw = self.cached(query)?;
        parse_subjects(&raw).with_context(|| format!("parse subjects for {term}"))
    }

    pub fn search(&mut self, term: &str, subject: &str) -> anyhow::Result<CourseGroup> {
        let query = Query::Search {
            term: term.to_owned(),
            subject: subject.to_owned(),
            acad: self.acad.clone(),
        };
        let raw = self.cached(query)?;
        extract_search_with(&raw, &self.options)
            .with_context(|| format!("parse search results for {term} {subject}"))
    }

    /// Every term crossed with every subject, in argument order.
    pub fn search_all(
        &mut self,
        terms: &[String],
        subjects: &[String],
    ) -> anyhow::Result<Vec<SearchResult>> {
        let mut results = Vec::with_capacity(terms.len() * subjects.len());
        for term in terms {
            for subject in subjects {
                let group = self.search(term, subject)?;
                tracing::debug!(%term, %subject, courses = group.len(), "search extracted");
                results.push(SearchResult {
                    term: term.clone(),
                    subject: subject.clone(),
                    group,
                });
            }
        }
        Ok(results)
    }

    /// Fetches details for each section, one at a time, and merges them in.
    ///
    /// Sections without a class number are reported and skipped.
    pub fn enrich(&mut self, results: &[SearchResult]) -> anyhow::Result<Enrichment> {
        let mut enrichment = Enrichment::default();

        for result in results {
            for section in result.group.sections() {
                let Some(class_nr) = section.classnr.as_deref() else {
                    tracing::warn!(
                        term = %result.term,
                        course = %section.name,
                        "course is missing a class number"
                    );
                    enrichment.warnings.push(MissingClassNumber {
                        term: result.term.clone(),
                        subject: result.subject.clone(),
                        course: section.name.clone(),
                    });
                    continue;
                };

                let query = Query::Details {
                    term: term_number(&result.term).to_owned(),
                    class_nr: class_nr.to_owned(),
                    acad: self.acad.clone(),
                };
                let detail = self
                    .cached_parsed(query, |raw| Ok(extract_details(raw)?))
                    .with_context(|| {
                        format!(
                            "parse course details for: {} {} {class_nr}",
                            result.term, result.subject
                        )
                    })?;

                enrichment.courses.push(EnrichedCourse {
                    term: result.term.clone(),
                    subject: result.subject.clone(),
                    course: merge(section.clone(), detail),
                });
            }
        }

        Ok(enrichment)
    }
}

fn open_catalog(args: &ConnectionArgs) -> anyhow::Result<Catalog<CampusNet>> {
    let credentials = match (&args.username, &args.password) {
        (Some(username), Some(password)) => Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };
    let net = CampusNet::new(&args.base_url, credentials).context("create campusnet client")?;
    let cache = ResponseCache::local(&args.cache_dir, !args.no_cache);
    Ok(Catalog::new(net, cache, &args.acad))
}

pub fn run_terms(args: &ConnectionArgs) -> anyhow::Result<()> {
    let mut catalog = open_catalog(args)?;
    let terms = catalog.terms().context("list terms")?;

    let mut out = std::io::stdout().lock();
    for term in terms {
        writeln!(out, "{term}").context("write term")?;
    }
    Ok(())
}

pub fn run_subjects(args: &ConnectionArgs, subjects_args: &SubjectsArgs) -> anyhow::Result<()> {
    let mut catalog = open_catalog(args)?;
    let all_terms = catalog.terms().context("list terms")?;
    let term = select_terms(&all_terms, std::slice::from_ref(&subjects_args.term))?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no term matches: {}", subjects_args.term))?;

    let subjects = catalog.subjects(&term)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", subjects.join(", ")).context("write subjects")?;
    Ok(())
}

pub fn run_search(args: &ConnectionArgs, search_args: &SearchArgs) -> anyhow::Result<()> {
    let options = SearchOptions {
        session_default: search_args.session_default.clone(),
    };
    let mut catalog = open_catalog(args)?.with_search_options(options);

    let all_terms = catalog.terms().context("list terms")?;
    let terms = select_terms(&all_terms, &search_args.terms)?;
    if terms.is_empty() {
        anyhow::bail!("no term matches: {}", search_args.terms.join(", "));
    }

    let results = catalog.search_all(&terms, &search_args.subjects)?;
    let mut out = std::io::stdout().lock();

    if !search_args.details {
        if search_args.json {
            let records: Vec<SectionRecord<'_>> = results
                .iter()
                .flat_map(|result| {
                    result.group.sections().map(|section| SectionRecord {
                        term: &result.term,
                        subject: &result.subject,
                        section,
                    })
                })
                .collect();
            return report::write_json_lines(&mut out, &records);
        }
        for result in &results {
            report::write_heading(&mut out, &format!("{}: {}", result.term, result.subject))?;
            report::write_sections(&mut out, &result.group)?;
        }
        return Ok(());
    }

    let enrichment = catalog.enrich(&results)?;
    if search_args.json {
        report::write_json_lines(&mut out, &enrichment.courses)?;
    } else {
        for course in &enrichment.courses {
            report::write_course(&mut out, &course.course)?;
        }
    }
    if !enrichment.warnings.is_empty() {
        tracing::warn!(
            skipped = enrichment.warnings.len(),
            "sections skipped for missing class numbers"
        );
    }
    Ok(())
}
