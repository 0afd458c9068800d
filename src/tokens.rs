/// The lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An unquoted identifier or keyword not in the reserved-word table.
    Identifier,
    /// A double-quoted, backtick-quoted or (when enabled) bracket-quoted identifier.
    QuotedIdentifier,
    /// An unquoted word found in the reserved-word table.
    ReservedWord,
    /// A single-quoted string literal.
    StringLiteral,
    /// A comment running from a line-comment marker to the end of the line (marker included,
    /// terminating newline excluded).
    LineComment,
    /// A `/* ... */` comment, delimiters included. Not nested.
    BlockComment,
    /// A run of consecutive whitespace characters, newlines included.
    Whitespace,
    /// A single punctuation character.
    Operator,
    /// A PostgreSQL dollar-quoted body, `$tag$ ... $tag$`, both tags included.
    DollarQuoteBody,
    /// Anything else (numeric constants and other non-word content).
    Other,
}

/// A token produced by the lexer.
///
/// Offsets are character offsets into the source, end-exclusive. `text` is materialized only for
/// the short kinds the splitter needs to inspect (identifiers, reserved words, operators and
/// whitespace); bulk kinds (comments, literals, dollar-quoted bodies) stay offset-only so a
/// multi-megabyte comment is never copied.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub text: Option<String>,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, start: usize, end: usize, text: Option<String>) -> Self {
        Token { kind, start, end, text }
    }

    /// The word content of an identifier or reserved-word token.
    pub fn word(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Identifier | TokenKind::ReservedWord => self.text.as_deref(),
            _ => None,
        }
    }

    /// Whether the token is a line or block comment.
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Whether the token is an opaque literal: a delimiter occurring inside it never constitutes
    /// a statement boundary.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::StringLiteral | TokenKind::QuotedIdentifier | TokenKind::DollarQuoteBody
        )
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

// Words the lexer classifies as `ReservedWord`. The dialect testers key off a handful of these
// (CREATE, OR, REPLACE, block kinds); the rest are the usual suspects so callers can tell
// keywords from object names. Must stay sorted: lookup is a binary search.
const RESERVED_WORDS: [&str; 44] = [
    "ALTER", "AND", "AS", "BEGIN", "BODY", "BY", "CASE", "CREATE", "DECLARE", "DELETE", "DROP",
    "ELSE", "END", "EXCEPTION", "FROM", "FUNCTION", "GO", "GRANT", "GROUP", "HAVING", "IF",
    "INSERT", "INTO", "IS", "JOIN", "LOOP", "MERGE", "NOT", "ON", "OR", "ORDER", "PACKAGE",
    "PROCEDURE", "REPLACE", "RETURNING", "REVOKE", "SELECT", "SET", "TABLE", "TRIGGER", "TYPE",
    "UPDATE", "VALUES", "WHERE",
];

/// Whether `word` is in the reserved-word table (case-insensitive).
pub(crate) fn is_reserved_word(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    RESERVED_WORDS.binary_search(&upper.as_str()).is_ok()
}
