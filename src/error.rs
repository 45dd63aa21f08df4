/// Fatal conditions raised while turning an upstream response into records.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A row or fragment shape matched no known pattern; the page layout changed.
    #[error("schema drift: {0}")]
    SchemaDrift(String),

    /// The envelope carried a non-benign error code.
    #[error("upstream API error {code}: {envelope}")]
    UpstreamApi { code: String, envelope: String },

    /// The envelope did not parse, or an expected element is missing.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

impl ExtractError {
    pub(crate) fn drift(message: impl Into<String>) -> Self {
        Self::SchemaDrift(message.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope(message.into())
    }
}
