use crate::SplitError;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A statement terminator.
///
/// A delimiter is either *standard* (matches anywhere outside of quotes and comments, like `;`)
/// or *single-line* (must be the only non-whitespace content on its physical line, like the
/// PL/SQL `/` or the T-SQL `GO`).
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter {
    text: String,
    single_line: bool,
}

impl Delimiter {
    /// Creates a new delimiter.
    ///
    /// The text is trimmed, an empty text is a configuration error.
    pub fn new(text: &str, single_line: bool) -> Result<Self, SplitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SplitError::Config("delimiter text must not be empty".to_string()));
        }
        Ok(Delimiter { text: text.to_string(), single_line })
    }

    /// The canonical standard delimiter: `;`, matching anywhere.
    pub fn standard() -> Self {
        Delimiter { text: ";".to_string(), single_line: false }
    }

    /// Parses the compact textual form used by configuration surfaces.
    ///
    /// - `"<delim>;nl"` or `"<delim>:nl"` (suffix is case-insensitive) marks a single-line
    ///   delimiter, e.g. `"GO;nl"` or `"/:nl"`.
    /// - A bare string with trailing whitespace also implies single-line, e.g. `"GO "`.
    /// - A blank input parses to `None` (no delimiter configured).
    pub fn parse(input: &str) -> Result<Option<Self>, SplitError> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let lower = input.to_ascii_lowercase();
        for suffix in [";nl", ":nl"] {
            if let Some(stripped) = lower.strip_suffix(suffix) {
                // The suffix was matched on the lowercased input, strip the same length from the
                // original so the delimiter text keeps its case.
                let text = &input[..stripped.len()];
                return Delimiter::new(text, true).map(Some);
            }
        }
        let single_line = input != input.trim_end();
        Delimiter::new(input, single_line).map(Some)
    }

    /// The delimiter text, never empty.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the delimiter must be the only non-whitespace content on its line.
    pub fn is_single_line(&self) -> bool {
        self.single_line
    }

    /// The number of characters in the delimiter text.
    pub(crate) fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the delimiter is a word (like `GO`) rather than punctuation (like `;`).
    /// Word delimiters are matched case-insensitively against whole identifier tokens.
    pub(crate) fn is_word(&self) -> bool {
        self.text.chars().all(|c| c.is_alphanumeric() || c == '_')
    }

    /// Case-insensitive comparison used for word delimiters.
    pub(crate) fn matches_word(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::standard()
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.single_line {
            true => write!(f, "{};nl", self.text),
            false => write!(f, "{}", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard() {
        let standard = Delimiter::standard();
        assert_eq!(standard.text(), ";");
        assert!(!standard.is_single_line());
        assert_eq!(standard, Delimiter::default());
    }

    #[test]
    fn test_new_trims_and_rejects_empty() {
        let delimiter = Delimiter::new("  GO  ", true).unwrap();
        assert_eq!(delimiter.text(), "GO");
        assert!(delimiter.is_single_line());

        assert!(Delimiter::new("", false).is_err());
        assert!(Delimiter::new("   ", true).is_err());
    }

    #[test]
    fn test_parse_compact_form() {
        let delimiter = Delimiter::parse("GO;nl").unwrap().unwrap();
        assert_eq!(delimiter.text(), "GO");
        assert!(delimiter.is_single_line());

        let delimiter = Delimiter::parse("/:NL").unwrap().unwrap();
        assert_eq!(delimiter.text(), "/");
        assert!(delimiter.is_single_line());

        // Trailing whitespace on a bare string implies single-line.
        let delimiter = Delimiter::parse("GO ").unwrap().unwrap();
        assert_eq!(delimiter.text(), "GO");
        assert!(delimiter.is_single_line());

        let delimiter = Delimiter::parse("//").unwrap().unwrap();
        assert_eq!(delimiter.text(), "//");
        assert!(!delimiter.is_single_line());

        assert!(Delimiter::parse("  ").unwrap().is_none());
    }

    #[test]
    fn test_equality_is_on_text_and_single_line() {
        assert_eq!(Delimiter::new(";", false).unwrap(), Delimiter::standard());
        assert_ne!(Delimiter::new(";", true).unwrap(), Delimiter::standard());
    }

    #[test]
    fn test_word_matching() {
        let go = Delimiter::new("GO", true).unwrap();
        assert!(go.is_word());
        assert!(go.matches_word("go"));
        assert!(!go.matches_word("GOTO"));
        assert!(!Delimiter::standard().is_word());
    }

    #[test]
    fn test_display_round_trips() {
        for input in ["GO;nl", ";"] {
            let delimiter = Delimiter::parse(input).unwrap().unwrap();
            assert_eq!(delimiter.to_string(), input);
        }
    }
}
