use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::query::Query;

/// Identity of a cached upstream response.
///
/// Search results are keyed without the academic career; the other kinds
/// keep every parameter the upstream request depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Terms,
    Subjects {
        term: String,
        acad: String,
    },
    Search {
        term: String,
        subject: String,
    },
    Details {
        term: String,
        class_nr: String,
        acad: String,
    },
}

pub fn cache_key_for(query: &Query) -> CacheKey {
    match query {
        Query::Terms => CacheKey::Terms,
        Query::Subjects { term, acad } => CacheKey::Subjects {
            term: term.clone(),
            acad: acad.clone(),
        },
        Query::Search { term, subject, .. } => CacheKey::Search {
            term: term.clone(),
            subject: subject.clone(),
        },
        Query::Details {
            term,
            class_nr,
            acad,
        } => CacheKey::Details {
            term: term.clone(),
            class_nr: class_nr.clone(),
            acad: acad.clone(),
        },
    }
}

impl CacheKey {
    /// Location of the entry below a cache root.
    ///
    /// Every parameter is its own escaped path segment, so distinct
    /// parameter tuples never share a path.
    pub fn relative_path(&self) -> PathBuf {
        let (dir, params, ext): (&str, Vec<&str>, &str) = match self {
            Self::Terms => return PathBuf::from("terms.html"),
            Self::Subjects { term, acad } => {
                ("subjects", vec![term.as_str(), acad.as_str()], "xml")
            }
            Self::Search { term, subject } => {
                ("search", vec![term.as_str(), subject.as_str()], "xml")
            }
            Self::Details {
                term,
                class_nr,
                acad,
            } => (
                "details",
                vec![term.as_str(), class_nr.as_str(), acad.as_str()],
                "xml",
            ),
        };

        let mut path = PathBuf::from(dir);
        let last = params.len() - 1;
        for (idx, param) in params.into_iter().enumerate() {
            let segment = escape_segment(param);
            if idx == last {
                path.push(format!("{segment}.{ext}"));
            } else {
                path.push(segment);
            }
        }
        path
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

fn escape_segment(input: &str) -> String {
    if input.is_empty() {
        return "_".to_owned();
    }

    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let is_plain = matches!(b, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'~');
        if is_plain {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{b:02X}"));
        }
    }
    out
}

/// Backing storage for cached responses: the exact text a prior fetch returned.
pub trait CacheStore {
    fn read(&self, key: &CacheKey) -> anyhow::Result<Option<String>>;
    fn write(&self, key: &CacheKey, text: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct LocalFsCacheStore {
    base_dir: PathBuf,
}

impl LocalFsCacheStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.base_dir.join(key.relative_path())
    }
}

impl CacheStore for LocalFsCacheStore {
    fn read(&self, key: &CacheKey) -> anyhow::Result<Option<String>> {
        let path = self.entry_path(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read cache entry: {}", path.display())),
        }
    }

    fn write(&self, key: &CacheKey, text: &str) -> anyhow::Result<()> {
        write_atomic(&self.entry_path(key), text)
    }
}

fn write_atomic(path: &Path, text: &str) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("cache path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create cache dir: {}", parent.display()))?;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, text)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

/// Memoizes upstream responses by [`CacheKey`].
///
/// When disabled the store is never touched: every call fetches.
#[derive(Debug, Clone)]
pub struct ResponseCache<S = LocalFsCacheStore> {
    store: S,
    enabled: bool,
}

impl ResponseCache<LocalFsCacheStore> {
    pub fn local(base_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self::new(LocalFsCacheStore::new(base_dir), enabled)
    }
}

impl<S: CacheStore> ResponseCache<S> {
    pub fn new(store: S, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Returns the stored text for `key`, or calls `fetch` and stores its result.
    ///
    /// An error from `fetch` is returned as-is and nothing is written.
    pub fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> anyhow::Result<String>
    where
        F: FnOnce() -> anyhow::Result<String>,
    {
        self.get_or_fetch_with(key, fetch, |text| Ok(text.to_owned()))
    }

    /// Like [`Self::get_or_fetch`], but runs `parse` on the text before returning it.
    ///
    /// A fetched response is written only after `parse` accepts it, so a
    /// rejected response is fetched again on the next call.
    pub fn get_or_fetch_with<T, F, P>(
        &self,
        key: &CacheKey,
        fetch: F,
        parse: P,
    ) -> anyhow::Result<T>
    where
        F: FnOnce() -> anyhow::Result<String>,
        P: FnOnce(&str) -> anyhow::Result<T>,
    {
        if !self.enabled {
            return parse(&fetch()?);
        }

        if let Some(text) = self.store.read(key)? {
            tracing::debug!(%key, "cache hit");
            return parse(&text);
        }

        tracing::debug!(%key, "cache miss");
        let text = fetch()?;
        let parsed = parse(&text)?;
        self.store
            .write(key, &text)
            .with_context(|| format!("store cache entry: {key}"))?;
        tracing::info!(%key, "cached response");
        Ok(parsed)
    }
}
