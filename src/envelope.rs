use crate::error::ExtractError;

/// Search error code that means "no classes found" rather than a failure.
pub const NO_CLASSES_FOUND: &str = "CSTCLS_NOCL2";

/// The XML wrapper the registration system puts around every AJAX response.
pub struct Envelope<'input> {
    doc: roxmltree::Document<'input>,
    raw: &'input str,
}

impl<'input> Envelope<'input> {
    pub fn parse(raw: &'input str) -> Result<Self, ExtractError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(raw, options)
            .map_err(|err| ExtractError::malformed(format!("xml parse error: {err}: {raw}")))?;
        Ok(Self { doc, raw })
    }

    fn child(&self, tag: &str) -> Option<roxmltree::Node<'_, 'input>> {
        self.doc
            .root_element()
            .children()
            .find(|node| node.is_element() && node.has_tag_name(tag))
    }

    /// `Some` when the envelope has an `ErrorCode` element, even an empty one.
    pub fn error_code(&self) -> Option<String> {
        self.child("ErrorCode")
            .map(|node| node.text().unwrap_or_default().trim().to_owned())
    }

    pub fn upstream_error(&self, code: String) -> ExtractError {
        ExtractError::UpstreamApi {
            code,
            envelope: self.raw.to_owned(),
        }
    }

    /// Text of the element holding the embedded HTML fragment.
    pub fn fragment(&self, tag: &str) -> Result<&str, ExtractError> {
        self.child(tag)
            .and_then(|node| node.text())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                ExtractError::malformed(format!("expected {tag} tag in response: {}", self.raw))
            })
    }
}

/// Subject codes from a `getSubjectsRegular` response.
pub fn parse_subjects(raw: &str) -> Result<Vec<String>, ExtractError> {
    let envelope = Envelope::parse(raw)?;
    let Some(list) = envelope.child("SubjectList") else {
        return Ok(Vec::new());
    };

    Ok(list
        .children()
        .filter(|node| node.is_element() && node.has_tag_name("Subject"))
        .filter_map(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .collect())
}
