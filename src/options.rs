use crate::{Delimiter, Dialect, SplitError};

#[cfg(feature = "serialize")]
use serde::Deserialize;

/// Splitter options.
///
/// All fields have dialect-neutral defaults; `Options::for_dialect` fills in the conventional
/// settings of a dialect (alternate delimiter, quoting modes). Validation happens when a
/// splitter is constructed, so an invalid combination fails before any parsing begins.
#[cfg_attr(feature = "serialize", derive(Deserialize), serde(default))]
#[derive(Debug, Clone)]
pub struct Options {
    /// The primary statement delimiter. The default is `;`.
    pub delimiter: Delimiter,

    /// An alternate, usually dialect-specific delimiter (PL/SQL `/`, T-SQL `GO`).
    pub alternate_delimiter: Option<Delimiter>,

    /// The dialect governing when the alternate delimiter applies.
    pub dialect: Dialect,

    /// Whether a blank line terminates the current statement.
    pub empty_line_is_delimiter: bool,

    /// Whether a backslash escapes a quote inside string literals (MySQL non-strict mode).
    pub support_escaped_quotes: bool,

    /// Whether `[Name]` is honored as a quoted identifier even though brackets are not standard
    /// SQL quoting.
    pub support_bracket_quoting: bool,

    /// Whether PostgreSQL `$tag$ ... $tag$` bodies are recognized and kept opaque.
    pub support_dollar_quoting: bool,

    /// Whether a line such as `@seed.sql` right after a statement boundary is emitted as its own
    /// single-token command (SQL*Plus include directive).
    pub support_include_directive: bool,

    /// An additional line-comment marker besides the standard `--` (e.g. `#` for MySQL).
    pub alternate_line_comment: Option<String>,

    /// Whether commands carry their materialized text. Disabling saves memory on huge scripts;
    /// the caller then re-slices the source using the command offsets.
    pub store_statement_text: bool,

    /// Whether the whitespace between the previous boundary and the first non-whitespace
    /// character is included in the next command.
    pub return_leading_whitespace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            delimiter: Delimiter::standard(),
            alternate_delimiter: None,
            dialect: Dialect::Standard,
            empty_line_is_delimiter: false,
            support_escaped_quotes: false,
            support_bracket_quoting: false,
            support_dollar_quoting: false,
            support_include_directive: false,
            alternate_line_comment: None,
            store_statement_text: true,
            return_leading_whitespace: false,
        }
    }
}

impl Options {
    /// Options pre-configured for a dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Options {
            dialect,
            alternate_delimiter: dialect.conventional_alternate(),
            support_dollar_quoting: dialect == Dialect::Postgres,
            support_bracket_quoting: dialect == Dialect::MsSql,
            support_include_directive: dialect == Dialect::Oracle,
            ..Options::default()
        }
    }

    /// Fails fast on ambiguous configurations, before any parsing begins.
    pub(crate) fn validate(&self) -> Result<(), SplitError> {
        if let Some(alternate) = &self.alternate_delimiter {
            if alternate.is_single_line()
                && self.delimiter.is_single_line()
                && alternate.text().eq_ignore_ascii_case(self.delimiter.text())
            {
                return Err(SplitError::Config(format!(
                    "primary and alternate single-line delimiters must differ (both are '{}')",
                    alternate.text()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.delimiter, Delimiter::standard());
        assert!(options.alternate_delimiter.is_none());
        assert!(options.store_statement_text);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_for_dialect() {
        let options = Options::for_dialect(Dialect::Oracle);
        assert_eq!(options.alternate_delimiter.as_ref().map(|d| d.text()), Some("/"));
        assert!(options.support_include_directive);
        assert!(!options.support_dollar_quoting);

        let options = Options::for_dialect(Dialect::Postgres);
        assert!(options.support_dollar_quoting);
        assert!(options.alternate_delimiter.is_none());

        let options = Options::for_dialect(Dialect::MsSql);
        assert_eq!(options.alternate_delimiter.as_ref().map(|d| d.text()), Some("GO"));
        assert!(options.support_bracket_quoting);
    }

    #[test]
    fn test_duplicate_single_line_delimiters_are_rejected() {
        let mut options = Options::default();
        options.delimiter = Delimiter::new("GO", true).unwrap();
        options.alternate_delimiter = Some(Delimiter::new("go", true).unwrap());
        assert!(matches!(options.validate(), Err(SplitError::Config(_))));

        // Distinct single-line delimiters are fine, and so is the same text when only one of the
        // two is single-line.
        options.alternate_delimiter = Some(Delimiter::new("/", true).unwrap());
        assert!(options.validate().is_ok());
        options.delimiter = Delimiter::new("/", false).unwrap();
        assert!(options.validate().is_ok());
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_options_deserialize_from_json() {
        // Unspecified fields fall back to their defaults.
        let options: Options = serde_json::from_str(
            r#"{"dialect": "Postgres", "support_dollar_quoting": true}"#,
        )
        .unwrap();
        assert_eq!(options.dialect, Dialect::Postgres);
        assert!(options.support_dollar_quoting);
        assert_eq!(options.delimiter, Delimiter::standard());
        assert!(options.store_statement_text);
    }
}
