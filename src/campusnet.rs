use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use url::Url;

use crate::query::{Fetcher, Query};

pub const DEFAULT_BASE_URL: &str = "https://campusnet.csuohio.edu";

const LOGIN_PATH: &str = "/ps8verify.jsp";
const SEARCH_PAGE_PATH: &str = "/sec/classsearch/search_reg.jsp";
const AJAX_PATH: &str = "/AJAX/AJAXMasterServlet";
const AJAX_CLASS: &str = "AJAX.Ajax_ClassSearch";
const LOGIN_OK_MARKER: &str = "Login in progress";
const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:136.0) Gecko/20100101 Firefox/136.0";

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session-holding client for the registration system.
///
/// Logs in lazily, right before the first request that reaches the network.
#[derive(Debug)]
pub struct CampusNet {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    logged_in: bool,
}

impl CampusNet {
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("parse --base-url")?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            anyhow::bail!("--base-url must be http/https: {base_url}");
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        let referer = base_url
            .join(SEARCH_PAGE_PATH)
            .context("build referer url")?;
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer.as_str()).context("build referer header")?,
        );

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build campusnet http client")?;

        Ok(Self {
            client,
            base_url,
            credentials,
            logged_in: false,
        })
    }

    pub fn login(&mut self) -> anyhow::Result<()> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("missing login credentials"))?;

        let url = self.url(LOGIN_PATH)?;
        let form = [
            ("Submit", "Login"),
            ("pwd", credentials.password.as_str()),
            ("user", credentials.username.as_str()),
            ("version", "136.0"),
            ("backdoor", "N"),
            ("browser", "Firefox"),
        ];
        tracing::info!(user = %credentials.username, "logging in");
        let body = self
            .client
            .post(url.clone())
            .form(&form)
            .send()
            .with_context(|| format!("POST {url}"))?
            .text()
            .context("read login response body")?;

        if !body.contains(LOGIN_OK_MARKER) {
            anyhow::bail!("login failed: {body}");
        }
        self.logged_in = true;
        Ok(())
    }

    fn ensure_login(&mut self) -> anyhow::Result<()> {
        if self.logged_in {
            return Ok(());
        }
        self.login()
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("build url for {path}"))
    }

    fn get(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<String> {
        let url = self.url(path)?;
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        let body = response.text().context("read response body")?;
        if !status.is_success() {
            anyhow::bail!("HTTP error: {status} {body}");
        }
        Ok(body)
    }

    pub fn fetch_terms_page(&mut self) -> anyhow::Result<String> {
        self.ensure_login()?;
        self.get(SEARCH_PAGE_PATH, &[])
    }

    pub fn fetch_subjects(&mut self, term: &str, acad: &str) -> anyhow::Result<String> {
        self.ensure_login()?;
        self.get(
            AJAX_PATH,
            &[
                ("college", ""),
                ("subject", ""),
                ("function", "getSubjectsRegular"),
                ("acad", acad),
                ("AJAXClassName", AJAX_CLASS),
                ("location", ""),
                ("term", term),
            ],
        )
    }

    pub fn fetch_search(
        &mut self,
        term: &str,
        subject: &str,
        acad: &str,
    ) -> anyhow::Result<String> {
        self.ensure_login()?;
        self.get(
            AJAX_PATH,
            &[
                ("function", "getClasessResults"),
                ("AJAXClassName", AJAX_CLASS),
                ("termVal", term),
                ("subject", subject),
                ("acadVal", acad),
                ("starttime", "ALL"),
                ("location", "ALL"),
                ("locations", "undefined"),
                ("incl", "I"),
                ("mon", "N"),
                ("tue", "N"),
                ("wed", "N"),
                ("thu", "N"),
                ("fri", "N"),
                ("sat", "N"),
                ("sun", "N"),
            ],
        )
    }

    pub fn fetch_details(
        &mut self,
        term: &str,
        class_nr: &str,
        acad: &str,
    ) -> anyhow::Result<String> {
        self.ensure_login()?;
        self.get(
            AJAX_PATH,
            &[
                ("classNbr", class_nr),
                ("acad", acad),
                ("AJAXClassName", AJAX_CLASS),
                ("function", "getClassDetails"),
                ("term", term),
            ],
        )
    }
}

impl Fetcher for CampusNet {
    fn fetch(&mut self, query: &Query) -> anyhow::Result<String> {
        tracing::info!(%query, "fetching from campusnet");
        match query {
            Query::Terms => self.fetch_terms_page(),
            Query::Subjects { term, acad } => self.fetch_subjects(term, acad),
            Query::Search {
                term,
                subject,
                acad,
            } => self.fetch_search(term, subject, acad),
            Query::Details {
                term,
                class_nr,
                acad,
            } => self.fetch_details(term, class_nr, acad),
        }
    }
}
