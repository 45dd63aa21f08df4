/// Maps a human-readable column or label string to a field key.
///
/// Trims, lowercases, then drops every character that is not a letter, digit,
/// or underscore: `"Begin Date - End Date"` becomes `begindateenddate`.
/// Keys that start with a digit are left as-is.
pub fn field_key(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect()
}
