use std::sync::LazyLock;

use anyhow::Context as _;
use regex::{Regex, RegexBuilder};

const TERMS_START: &str = "<!--  Display Term Choices";
const TERMS_END: &str = "<!--  Display Career Choices";

static OPTION_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"value="(.*?)""#).expect("invalid regex: option value"));

/// Term labels (`114-Fall 2025`) offered on the search registration page.
pub fn parse_terms(page: &str) -> anyhow::Result<Vec<String>> {
    let block = page
        .split_once(TERMS_START)
        .and_then(|(_, rest)| rest.split_once(TERMS_END))
        .map(|(block, _)| block)
        .ok_or_else(|| anyhow::anyhow!("failed to find terms on search registration page"))?;

    Ok(OPTION_VALUE
        .captures_iter(block)
        .map(|caps| caps[1].to_owned())
        .collect())
}

/// Keeps terms, in listing order, that equal a pattern ignoring case or whose
/// name after the term number matches a pattern as a case-insensitive regex.
pub fn select_terms(all: &[String], patterns: &[String]) -> anyhow::Result<Vec<String>> {
    let lowered: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
    let regexes = patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("parse term pattern: {p}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(all
        .iter()
        .filter(|term| {
            let name = term.split_once('-').map_or(term.as_str(), |(_, name)| name);
            lowered.contains(&term.to_lowercase()) || regexes.iter().any(|re| re.is_match(name))
        })
        .cloned()
        .collect())
}

/// The number before the first `-`; detail queries take this instead of the label.
pub fn term_number(term: &str) -> &str {
    term.split_once('-').map_or(term, |(number, _)| number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> Vec<String> {
        ["113-Sum 2025", "114-Fall 2025", "115-Spr 2026"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn parse_terms_reads_option_values_between_markers() -> anyhow::Result<()> {
        let page = r#"<select>
<option value="ignored">
<!--  Display Term Choices -->
<option value="114-Fall 2025">Fall 2025</option>
<option value="115-Spr 2026">Spring 2026</option>
<!--  Display Career Choices -->
<option value="GRAD">Graduate</option>
</select>"#;

        assert_eq!(parse_terms(page)?, ["114-Fall 2025", "115-Spr 2026"]);
        Ok(())
    }

    #[test]
    fn parse_terms_without_markers_fails() {
        let err = parse_terms("<html></html>").unwrap_err();
        assert!(err.to_string().contains("failed to find terms"));
    }

    #[test]
    fn select_terms_matches_exact_label_or_name_pattern() -> anyhow::Result<()> {
        let all = terms();
        assert_eq!(
            select_terms(&all, &["114-FALL 2025".to_owned()])?,
            ["114-Fall 2025"]
        );
        assert_eq!(
            select_terms(&all, &["2025".to_owned()])?,
            ["113-Sum 2025", "114-Fall 2025"]
        );
        assert_eq!(select_terms(&all, &["^spr".to_owned()])?, ["115-Spr 2026"]);
        assert!(select_terms(&all, &["winter".to_owned()])?.is_empty());
        Ok(())
    }

    #[test]
    fn select_terms_rejects_invalid_pattern() {
        assert!(select_terms(&terms(), &["(".to_owned()]).is_err());
    }

    #[test]
    fn term_number_is_prefix_before_dash() {
        assert_eq!(term_number("114-Fall 2025"), "114");
        assert_eq!(term_number("114"), "114");
    }
}
