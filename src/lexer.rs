use crate::options::Options;
use crate::tokens::{is_reserved_word, Token, TokenKind};
use crate::{ScriptSource, SplitError};

/// A lazy scanner turning a character source into a sequence of typed tokens.
///
/// The lexer is not validating: an unterminated string, comment or dollar-quoted body yields a
/// token spanning to the end of the input rather than an error. The splitter then treats the
/// remaining text as one final (possibly invalid) command, which is the right behavior for a
/// partially-typed editor buffer.
pub(crate) struct Lexer<S: ScriptSource> {
    source: S,

    /// The offset of the next character to be read from the source.
    pos: usize,

    // Lexing modes, fixed at construction from the splitter options.
    escaped_quotes: bool,
    bracket_quoting: bool,
    dollar_quoting: bool,
    comment_markers: Vec<String>,
}

impl<S: ScriptSource> Lexer<S> {
    pub(crate) fn new(source: S, options: &Options) -> Self {
        let mut comment_markers = vec!["--".to_string()];
        if let Some(marker) = &options.alternate_line_comment {
            if !marker.is_empty() && !comment_markers.contains(marker) {
                comment_markers.push(marker.clone());
            }
        }
        Lexer {
            source,
            pos: 0,
            escaped_quotes: options.support_escaped_quotes,
            bracket_quoting: options.support_bracket_quoting,
            dollar_quoting: options.support_dollar_quoting,
            comment_markers,
        }
    }

    /// Repositions the lexer. Used by the splitter to step over a matched delimiter, whose text
    /// may span several tokens.
    pub(crate) fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn char_at(&mut self, pos: usize) -> Result<Option<char>, SplitError> {
        self.source.char_at(pos)
    }

    pub(crate) fn slice(&mut self, start: usize, end: usize) -> Result<String, SplitError> {
        self.source.slice(start, end)
    }

    // Compares the source at `pos` against comment marker `index`, one character at a time so
    // the marker is never borrowed across a source read. Returns the marker length in
    // characters on a match.
    fn marker_len_at(&mut self, pos: usize, index: usize) -> Result<Option<usize>, SplitError> {
        let mut i = 0;
        loop {
            let expected = match self.comment_markers[index].chars().nth(i) {
                Some(c) => c,
                None => return Ok(Some(i)),
            };
            if self.source.char_at(pos + i)? != Some(expected) {
                return Ok(None);
            }
            i += 1;
        }
    }

    /// Whether the source at `pos` starts with `text` (case-sensitive).
    pub(crate) fn starts_with(&mut self, pos: usize, text: &str) -> Result<bool, SplitError> {
        let mut p = pos;
        for expected in text.chars() {
            if self.source.char_at(p)? != Some(expected) {
                return Ok(false);
            }
            p += 1;
        }
        Ok(true)
    }

    /// Whether the physical line is blank from `from` to its end (or the end of the input).
    pub(crate) fn rest_of_line_is_blank(&mut self, from: usize) -> Result<bool, SplitError> {
        let mut p = from;
        while let Some(c) = self.source.char_at(p)? {
            if c == '\n' {
                return Ok(true);
            }
            if !c.is_whitespace() {
                return Ok(false);
            }
            p += 1;
        }
        Ok(true)
    }

    /// The next token, or `None` at the end of the input.
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>, SplitError> {
        let start = self.pos;
        let Some(c) = self.char_at(start)? else {
            return Ok(None);
        };

        if c.is_whitespace() {
            return self.scan_whitespace(start).map(Some);
        }
        for i in 0..self.comment_markers.len() {
            if let Some(marker_len) = self.marker_len_at(start, i)? {
                return self.scan_line_comment(start, marker_len).map(Some);
            }
        }
        if c == '/' && self.starts_with(start, "/*")? {
            return self.scan_block_comment(start).map(Some);
        }
        if c == '\'' {
            return self.scan_quoted(start, '\'', TokenKind::StringLiteral).map(Some);
        }
        if c == '"' || c == '`' {
            return self.scan_quoted(start, c, TokenKind::QuotedIdentifier).map(Some);
        }
        if c == '[' && self.bracket_quoting {
            return self.scan_bracketed(start).map(Some);
        }
        if c == '$' && self.dollar_quoting {
            if let Some(token) = self.scan_dollar_quote(start)? {
                return Ok(Some(token));
            }
        }
        if c.is_alphabetic() || c == '_' {
            return self.scan_word(start).map(Some);
        }
        if c.is_ascii_digit() {
            return self.scan_number(start).map(Some);
        }

        // Any other character is a single-character operator/punctuation token.
        self.pos = start + 1;
        Ok(Some(Token::new(TokenKind::Operator, start, start + 1, Some(c.to_string()))))
    }

    fn scan_whitespace(&mut self, start: usize) -> Result<Token, SplitError> {
        let mut text = String::new();
        let mut p = start;
        while let Some(c) = self.char_at(p)? {
            if !c.is_whitespace() {
                break;
            }
            text.push(c);
            p += 1;
        }
        self.pos = p;
        Ok(Token::new(TokenKind::Whitespace, start, p, Some(text)))
    }

    // The token runs from the marker to the end of the line, the terminating newline excluded so
    // line tracking stays with the whitespace tokens.
    fn scan_line_comment(&mut self, start: usize, marker_len: usize) -> Result<Token, SplitError> {
        let mut p = start + marker_len;
        while let Some(c) = self.char_at(p)? {
            if c == '\n' {
                break;
            }
            p += 1;
        }
        self.pos = p;
        Ok(Token::new(TokenKind::LineComment, start, p, None))
    }

    // Block comments do not nest: the comment ends at the first `*/`, or at the end of the input
    // when unterminated.
    fn scan_block_comment(&mut self, start: usize) -> Result<Token, SplitError> {
        let mut p = start + 2;
        loop {
            match self.char_at(p)? {
                None => break,
                Some('*') if self.char_at(p + 1)? == Some('/') => {
                    p += 2;
                    break;
                }
                Some(_) => p += 1,
            }
        }
        self.pos = p;
        Ok(Token::new(TokenKind::BlockComment, start, p, None))
    }

    // A quoted token: a string literal (single quotes) or a quoted identifier (double quotes or
    // backticks). The quote is escaped by repeating it; a backslash escape is honored only when
    // enabled.
    fn scan_quoted(&mut self, start: usize, quote: char, kind: TokenKind) -> Result<Token, SplitError> {
        let mut p = start + 1;
        loop {
            match self.char_at(p)? {
                None => break,
                Some('\\') if self.escaped_quotes => {
                    // The escaped character (whatever it is) cannot close the quote.
                    p += if self.char_at(p + 1)?.is_some() { 2 } else { 1 };
                }
                Some(c) if c == quote => {
                    if self.char_at(p + 1)? == Some(quote) {
                        p += 2;
                    } else {
                        p += 1;
                        break;
                    }
                }
                Some(_) => p += 1,
            }
        }
        self.pos = p;
        Ok(Token::new(kind, start, p, None))
    }

    // Bracket-quoted identifier, `[Name]`. No nesting: `]` always closes.
    fn scan_bracketed(&mut self, start: usize) -> Result<Token, SplitError> {
        let mut p = start + 1;
        while let Some(c) = self.char_at(p)? {
            p += 1;
            if c == ']' {
                break;
            }
        }
        self.pos = p;
        Ok(Token::new(TokenKind::QuotedIdentifier, start, p, None))
    }

    // A dollar-quoted body, `$tag$ ... $tag$` (the tag may be empty). The contents between the
    // matching tags are opaque. Returns `None` when the `$` does not open a valid tag, in which
    // case the caller emits it as an ordinary operator token.
    fn scan_dollar_quote(&mut self, start: usize) -> Result<Option<Token>, SplitError> {
        let mut p = start + 1;
        while let Some(c) = self.char_at(p)? {
            if c.is_alphanumeric() || c == '_' {
                p += 1;
            } else {
                break;
            }
        }
        if self.char_at(p)? != Some('$') {
            return Ok(None);
        }
        let tag = self.slice(start, p + 1)?;
        let tag_len = tag.chars().count();

        let mut q = p + 1;
        let end = loop {
            match self.char_at(q)? {
                None => break q,
                Some('$') if self.starts_with(q, &tag)? => break q + tag_len,
                Some(_) => q += 1,
            }
        };
        self.pos = end;
        Ok(Some(Token::new(TokenKind::DollarQuoteBody, start, end, None)))
    }

    fn scan_word(&mut self, start: usize) -> Result<Token, SplitError> {
        let mut text = String::new();
        let mut p = start;
        while let Some(c) = self.char_at(p)? {
            // `$` stays a word character unless dollar quoting is active (Oracle names like
            // v$session versus PostgreSQL `$tag$` bodies).
            let is_word_char =
                c.is_alphanumeric() || c == '_' || c == '#' || (c == '$' && !self.dollar_quoting);
            if !is_word_char {
                break;
            }
            text.push(c);
            p += 1;
        }
        self.pos = p;
        let kind = match is_reserved_word(&text) {
            true => TokenKind::ReservedWord,
            false => TokenKind::Identifier,
        };
        Ok(Token::new(kind, start, p, Some(text)))
    }

    // Numeric constants are opaque to the splitter, they only need to not be confused with
    // words or delimiters.
    fn scan_number(&mut self, start: usize) -> Result<Token, SplitError> {
        let mut text = String::new();
        let mut p = start;
        while let Some(c) = self.char_at(p)? {
            if !c.is_alphanumeric() && c != '.' && c != '_' {
                break;
            }
            text.push(c);
            p += 1;
        }
        self.pos = p;
        Ok(Token::new(TokenKind::Other, start, p, Some(text)))
    }
}
